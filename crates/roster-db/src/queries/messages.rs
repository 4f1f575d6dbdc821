use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use roster_types::models::{InboxStatus, Message};

use crate::listing::clamp_limit;
use crate::models::uuid_at;

const MESSAGE_SELECT: &str = "SELECT m.id, m.from_user_id, f.username, m.to_user_id, t.username, \
     m.message, m.time_sent, m.time_read \
     FROM messages AS m \
     LEFT JOIN users AS f ON f.id = m.from_user_id \
     LEFT JOIN users AS t ON t.id = m.to_user_id";

fn message_at(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: uuid_at(row, 0)?,
        from_user_id: uuid_at(row, 1)?,
        from_username: row.get(2)?,
        to_user_id: uuid_at(row, 3)?,
        to_username: row.get(4)?,
        message: row.get(5)?,
        time_sent: row.get(6)?,
        time_read: row.get(7)?,
    })
}

pub fn insert(
    conn: &Connection,
    id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    text: &str,
    time_sent: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, from_user_id, to_user_id, message, time_sent)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id.to_string(),
            from_user_id.to_string(),
            to_user_id.to_string(),
            text,
            time_sent,
        ],
    )
    .context("failed to insert message")?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Option<Message>> {
    conn.query_row(
        &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
        [id.to_string()],
        message_at,
    )
    .optional()
    .with_context(|| format!("failed to get message({id})"))
}

/// Messages addressed to `user_id`, oldest first.
pub fn inbox(conn: &Connection, user_id: Uuid, status: InboxStatus, limit: u32) -> Result<Vec<Message>> {
    let status_clause = match status {
        InboxStatus::All => "",
        InboxStatus::Read => " AND m.time_read IS NOT NULL",
        InboxStatus::Unread => " AND m.time_read IS NULL",
    };
    let mut stmt = conn.prepare(&format!(
        "{MESSAGE_SELECT} WHERE m.to_user_id = ?1{status_clause}
         ORDER BY m.time_sent, m.rowid LIMIT {}",
        clamp_limit(limit)
    ))?;
    let rows = stmt
        .query_map([user_id.to_string()], message_at)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read inbox")?;
    Ok(rows)
}

pub fn set_read(conn: &Connection, id: Uuid, time_read: Option<DateTime<Utc>>) -> Result<usize> {
    conn.execute(
        "UPDATE messages SET time_read = ?1 WHERE id = ?2",
        params![time_read, id.to_string()],
    )
    .with_context(|| format!("failed to update message({id})"))
}

pub fn delete(conn: &Connection, id: Uuid) -> Result<usize> {
    conn.execute("DELETE FROM messages WHERE id = ?1", [id.to_string()])
        .with_context(|| format!("failed to delete message({id})"))
}
