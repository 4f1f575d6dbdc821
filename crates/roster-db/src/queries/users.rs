use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use roster_types::api::UsersFilter;

use crate::listing::{Conditions, SortKey};
use crate::models::{UserRow, account_at, opt_uuid_at, uuid_at};

/// User columns followed by the owning account's columns.
pub(crate) const USER_COLUMNS: &str = "u.id, u.username, u.passhash, u.active, u.admin, u.expiry, u.person_id, \
     a.id, a.name, a.active, a.admin, a.expiry";

const USER_SELECT: &str = "FROM users AS u INNER JOIN accounts AS a ON a.id = u.account_id";

pub const SORT_KEYS: &[(&str, &'static str)] = &[
    ("username", "u.username"),
    ("active", "u.active"),
    ("admin", "u.admin"),
];

/// Reads [`USER_COLUMNS`] starting at `offset`.
pub(crate) fn user_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: uuid_at(row, offset)?,
        username: row.get(offset + 1)?,
        passhash: row.get(offset + 2)?,
        active: row.get(offset + 3)?,
        admin: row.get(offset + 4)?,
        expiry: row.get(offset + 5)?,
        person_id: opt_uuid_at(row, offset + 6)?,
        account: account_at(row, offset + 7)?,
    })
}

fn select_one(conn: &Connection, condition: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} {USER_SELECT} WHERE {condition}"),
        args,
        |row| user_at(row, 0),
    )
    .optional()
    .context("failed to get user")
}

pub fn insert(conn: &Connection, user: &UserRow) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, account_id, username, passhash, admin, active, expiry, person_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id.to_string(),
            user.account.id.to_string(),
            user.username,
            user.passhash,
            user.admin,
            user.active,
            user.expiry,
            user.person_id.map(|id| id.to_string()),
        ],
    )
    .with_context(|| format!("failed to insert user \"{}\"", user.username))?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<UserRow>> {
    select_one(conn, "u.id = ?1", &[&id.to_string()])
}

/// Like [`get`] but only matches users of `account_id`.
pub fn get_in_account(conn: &Connection, account_id: Uuid, id: Uuid) -> Result<Option<UserRow>> {
    select_one(
        conn,
        "u.id = ?1 AND u.account_id = ?2",
        &[&id.to_string(), &account_id.to_string()],
    )
}

pub fn get_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    select_one(conn, "u.username = ?1", &[&username])
}

/// An inactive user whose current hash equals `passhash`. Used to redeem
/// activation tokens.
pub fn get_inactive_by_credentials(
    conn: &Connection,
    username: &str,
    passhash: &str,
) -> Result<Option<UserRow>> {
    select_one(
        conn,
        "u.username = ?1 AND u.passhash = ?2 AND u.active = 0",
        &[&username, &passhash],
    )
}

pub fn list(
    conn: &Connection,
    filter: &UsersFilter,
    sort: &[SortKey],
    limit: u32,
) -> Result<Vec<UserRow>> {
    let mut cond = Conditions::default();
    if let Some(username) = filter.username.as_deref().filter(|n| !n.is_empty()) {
        cond.contains("u.username", username);
    }
    if let Some(account_id) = filter.account_id {
        cond.eq("u.account_id", account_id.to_string());
    }
    if let Some(active) = filter.active {
        cond.eq("u.active", active);
    }
    if let Some(admin) = filter.admin {
        cond.eq("u.admin", admin);
    }

    let base = format!("SELECT {USER_COLUMNS} {USER_SELECT}");
    let sql = cond.to_sql(&base, sort, "u.username", limit);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), |row| user_at(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to select users")?;
    Ok(rows)
}

/// Account id of a user, if the user exists.
pub fn account_of(conn: &Connection, id: Uuid) -> Result<Option<Uuid>> {
    conn.query_row(
        "SELECT account_id FROM users WHERE id = ?1",
        [id.to_string()],
        |row| uuid_at(row, 0),
    )
    .optional()
    .context("cannot read user record")
}

pub fn set_passhash(conn: &Connection, id: Uuid, passhash: &str) -> Result<usize> {
    conn.execute(
        "UPDATE users SET passhash = ?1 WHERE id = ?2",
        params![passhash, id.to_string()],
    )
    .context("failed to update password")
}

pub fn activate(conn: &Connection, id: Uuid, passhash: &str) -> Result<usize> {
    conn.execute(
        "UPDATE users SET active = 1, passhash = ?1 WHERE id = ?2",
        params![passhash, id.to_string()],
    )
    .context("failed to activate user account")
}

pub fn system_admin_exists(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM users AS u INNER JOIN accounts AS a ON a.id = u.account_id
             WHERE u.admin = 1 AND a.admin = 1",
            [],
            |row| row.get(0),
        )
        .context("failed to count system administrators")?;
    Ok(count > 0)
}
