use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::models::SessionRow;
use crate::queries::users::{USER_COLUMNS, user_at};

pub fn delete_for_user(conn: &Connection, user_id: Uuid) -> Result<usize> {
    conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1",
        [user_id.to_string()],
    )
    .context("failed to delete old session")
}

pub fn insert(
    conn: &Connection,
    token: &str,
    user_id: Uuid,
    account_id: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, account_id, user_id, time_created, time_updated)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![token, account_id.to_string(), user_id.to_string(), now],
    )
    .context("failed to create session")?;
    Ok(())
}

pub fn get(conn: &Connection, token: &str) -> Result<Option<SessionRow>> {
    conn.query_row(
        &format!(
            "SELECT s.token, s.time_created, s.time_updated, {USER_COLUMNS}
             FROM sessions AS s
             INNER JOIN users AS u ON u.id = s.user_id
             INNER JOIN accounts AS a ON a.id = u.account_id
             WHERE s.token = ?1"
        ),
        [token],
        |row| {
            Ok(SessionRow {
                token: row.get(0)?,
                time_created: row.get(1)?,
                time_updated: row.get(2)?,
                user: user_at(row, 3)?,
            })
        },
    )
    .optional()
    .context("failed to get session")
}

pub fn touch(conn: &Connection, token: &str, now: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "UPDATE sessions SET time_updated = ?1 WHERE token = ?2",
        params![now, token],
    )
    .context("failed to update session")
}

pub fn delete(conn: &Connection, token: &str) -> Result<usize> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", [token])
        .context("failed to delete session")
}
