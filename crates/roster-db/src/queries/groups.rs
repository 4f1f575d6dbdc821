use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use roster_types::api::GroupsFilter;

use crate::is_constraint_violation;
use crate::listing::{Conditions, SortKey};
use crate::models::{GroupRow, account_at, opt_uuid_at, uuid_at};

const GROUP_SELECT: &str = "SELECT g.id, g.parent_group_id, g.name, g.description, g.invitation, \
     g.owner_type, g.owner_id, a.id, a.name, a.active, a.admin, a.expiry \
     FROM `groups` AS g INNER JOIN accounts AS a ON a.id = g.account_id";

pub const SORT_KEYS: &[(&str, &'static str)] = &[
    ("id", "g.id"),
    ("name", "g.name"),
    ("account", "a.name"),
];

fn group_at(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: uuid_at(row, 0)?,
        parent_group_id: opt_uuid_at(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        invitation: row.get(4)?,
        owner_type: row.get(5)?,
        owner_id: row.get(6)?,
        account: account_at(row, 7)?,
    })
}

pub fn insert(conn: &Connection, group: &GroupRow) -> Result<()> {
    conn.execute(
        "INSERT INTO `groups` (id, account_id, parent_group_id, name, description, invitation, owner_type, owner_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            group.id.to_string(),
            group.account.id.to_string(),
            group.parent_group_id.map(|id| id.to_string()),
            group.name,
            group.description,
            group.invitation,
            group.owner_type,
            group.owner_id,
        ],
    )
    .with_context(|| format!("failed to insert group \"{}\"", group.name))?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<GroupRow>> {
    conn.query_row(
        &format!("{GROUP_SELECT} WHERE g.id = ?1"),
        [id.to_string()],
        group_at,
    )
    .optional()
    .with_context(|| format!("failed to get group({id})"))
}

pub fn get_in_account(conn: &Connection, account_id: Uuid, id: Uuid) -> Result<Option<GroupRow>> {
    conn.query_row(
        &format!("{GROUP_SELECT} WHERE g.id = ?1 AND g.account_id = ?2"),
        [id.to_string(), account_id.to_string()],
        group_at,
    )
    .optional()
    .with_context(|| format!("failed to get group({id})"))
}

/// `None` when the group does not exist, `Some(None)` for a root group.
pub fn parent_of(conn: &Connection, id: Uuid) -> Result<Option<Option<Uuid>>> {
    conn.query_row(
        "SELECT parent_group_id FROM `groups` WHERE id = ?1",
        [id.to_string()],
        |row| opt_uuid_at(row, 0),
    )
    .optional()
    .with_context(|| format!("failed to get parent of group({id})"))
}

pub fn list(
    conn: &Connection,
    filter: &GroupsFilter,
    sort: &[SortKey],
    limit: u32,
) -> Result<Vec<GroupRow>> {
    let mut cond = Conditions::default();
    if let Some(id) = filter.id {
        cond.eq("g.id", id.to_string());
    }
    if let Some(account_id) = filter.account_id {
        cond.eq("g.account_id", account_id.to_string());
    }
    if let Some(parent_id) = filter.parent_group_id {
        cond.eq("g.parent_group_id", parent_id.to_string());
    }
    if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
        cond.contains("g.name", name);
    }

    let sql = cond.to_sql(GROUP_SELECT, sort, "g.name", limit);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), group_at)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to select groups")?;
    Ok(rows)
}

pub fn update(
    conn: &Connection,
    account_id: Uuid,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<usize> {
    conn.execute(
        "UPDATE `groups` SET name = ?1, description = ?2 WHERE id = ?3 AND account_id = ?4",
        params![name, description, id.to_string(), account_id.to_string()],
    )
    .with_context(|| format!("failed to update group({id})"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDeletion {
    /// Number of rows removed; 0 when the group is absent or not in the account.
    Removed(usize),
    /// Sub-groups still reference this group.
    HasChildren,
}

pub fn delete(conn: &Connection, account_id: Uuid, id: Uuid) -> Result<GroupDeletion> {
    let result = conn
        .execute(
            "DELETE FROM `groups` WHERE id = ?1 AND account_id = ?2",
            [id.to_string(), account_id.to_string()],
        )
        .with_context(|| format!("failed to delete group({id})"));
    match result {
        Ok(n) => Ok(GroupDeletion::Removed(n)),
        Err(e) if is_constraint_violation(&e) => Ok(GroupDeletion::HasChildren),
        Err(e) => Err(e),
    }
}
