use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use uuid::Uuid;

use roster_types::api::AccountsFilter;
use roster_types::models::Account;

use crate::listing::{Conditions, SortKey};
use crate::models::account_at;

const ACCOUNT_SELECT: &str = "SELECT a.id, a.name, a.active, a.admin, a.expiry FROM accounts AS a";

/// Sort keys accepted by [`list`].
pub const SORT_KEYS: &[(&str, &'static str)] = &[
    ("id", "a.id"),
    ("name", "a.name"),
    ("active", "a.active"),
    ("admin", "a.admin"),
];

pub fn insert(conn: &Connection, account: &Account) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts (id, name, active, admin, expiry) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.id.to_string(),
            account.name,
            account.active,
            account.admin,
            account.expiry,
        ],
    )
    .with_context(|| format!("failed to insert account \"{}\"", account.name))?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<Account>> {
    conn.query_row(
        &format!("{ACCOUNT_SELECT} WHERE a.id = ?1"),
        [id.to_string()],
        |row| account_at(row, 0),
    )
    .optional()
    .context("failed to get account")
}

pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Account>> {
    conn.query_row(
        &format!("{ACCOUNT_SELECT} WHERE a.name = ?1"),
        [name],
        |row| account_at(row, 0),
    )
    .optional()
    .context("failed to get account by name")
}

pub fn list(
    conn: &Connection,
    filter: &AccountsFilter,
    sort: &[SortKey],
    limit: u32,
) -> Result<Vec<Account>> {
    let mut cond = Conditions::default();
    if let Some(id) = filter.id {
        cond.eq("a.id", id.to_string());
    }
    if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
        cond.contains("a.name", name);
    }
    if let Some(active) = filter.active {
        cond.eq("a.active", active);
    }
    if let Some(admin) = filter.admin {
        cond.eq("a.admin", admin);
    }

    let sql = cond.to_sql(ACCOUNT_SELECT, sort, "a.name", limit);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), |row| account_at(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read accounts")?;
    Ok(rows)
}

pub fn set_active(conn: &Connection, id: Uuid, active: bool) -> Result<usize> {
    conn.execute(
        "UPDATE accounts SET active = ?1 WHERE id = ?2",
        params![active, id.to_string()],
    )
    .context("failed to update account")
}
