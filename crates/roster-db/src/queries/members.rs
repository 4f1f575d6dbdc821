use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::listing::clamp_limit;
use crate::models::{MemberRow, uuid_at};

pub fn insert(conn: &Connection, member: &MemberRow) -> Result<()> {
    conn.execute(
        "INSERT INTO group_members (id, group_id, member_type, member_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            member.id.to_string(),
            member.group_id.to_string(),
            member.member_type,
            member.member_id.to_string(),
        ],
    )
    .with_context(|| {
        format!(
            "failed to add {}({}) to group({})",
            member.member_type, member.member_id, member.group_id
        )
    })?;
    Ok(())
}

pub fn exists(conn: &Connection, group_id: Uuid, member_type: &str, member_id: Uuid) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM group_members
             WHERE group_id = ?1 AND member_type = ?2 AND member_id = ?3",
            params![group_id.to_string(), member_type, member_id.to_string()],
            |row| row.get(0),
        )
        .context("failed to check group membership")?;
    Ok(count > 0)
}

pub fn list(conn: &Connection, group_id: Uuid, limit: u32) -> Result<Vec<MemberRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, group_id, member_type, member_id FROM group_members
         WHERE group_id = ?1 ORDER BY member_type, member_id LIMIT {}",
        clamp_limit(limit)
    ))?;
    let rows = stmt
        .query_map([group_id.to_string()], |row| {
            Ok(MemberRow {
                id: uuid_at(row, 0)?,
                group_id: uuid_at(row, 1)?,
                member_type: row.get(2)?,
                member_id: uuid_at(row, 3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("failed to list members of group({group_id})"))?;
    Ok(rows)
}

pub fn delete(conn: &Connection, group_id: Uuid, member_type: &str, member_id: Uuid) -> Result<usize> {
    conn.execute(
        "DELETE FROM group_members WHERE group_id = ?1 AND member_type = ?2 AND member_id = ?3",
        params![group_id.to_string(), member_type, member_id.to_string()],
    )
    .context("failed to remove group member")
}

/// Drops every membership of one member, in whichever group.
pub fn delete_member_everywhere(conn: &Connection, member_type: &str, member_id: Uuid) -> Result<usize> {
    conn.execute(
        "DELETE FROM group_members WHERE member_type = ?1 AND member_id = ?2",
        params![member_type, member_id.to_string()],
    )
    .context("failed to remove memberships")
}
