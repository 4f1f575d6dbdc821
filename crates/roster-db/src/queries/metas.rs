use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use roster_types::models::{EntityClass, Metas};

pub fn get(conn: &Connection, class: EntityClass, id: &str) -> Result<Metas> {
    let mut stmt = conn.prepare(
        "SELECT name, value FROM metas WHERE table_name = ?1 AND table_id = ?2 ORDER BY name",
    )?;
    let metas = stmt
        .query_map(params![class.as_str(), id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Metas, _>>()
        .with_context(|| format!("failed to get {class}({id}) metas"))?;
    Ok(metas)
}

/// Upserts every entry of `values`; names not in `values` are left alone.
pub fn set(conn: &Connection, class: EntityClass, id: &str, values: &Metas) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO metas (table_name, table_id, name, value) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (table_name, table_id, name) DO UPDATE SET value = excluded.value",
    )?;
    for (name, value) in values {
        stmt.execute(params![class.as_str(), id, name, value])
            .with_context(|| format!("failed to set {class}({id}).{name}"))?;
    }
    Ok(())
}

pub fn delete(conn: &Connection, class: EntityClass, id: &str, names: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "DELETE FROM metas WHERE table_name = ?1 AND table_id = ?2 AND name = ?3",
    )?;
    for name in names {
        stmt.execute(params![class.as_str(), id, name])
            .with_context(|| format!("failed to delete {class}({id}).{name}"))?;
    }
    Ok(())
}

pub fn delete_all(conn: &Connection, class: EntityClass, id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM metas WHERE table_name = ?1 AND table_id = ?2",
        params![class.as_str(), id],
    )
    .with_context(|| format!("failed to delete {class}({id}) metas"))
}
