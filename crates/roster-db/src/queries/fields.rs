use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use roster_types::models::{EntityClass, Field};

/// Field descriptors of one entity, by `order_nr` then name.
pub fn get(conn: &Connection, class: EntityClass, id: &str) -> Result<Vec<Field>> {
    let mut stmt = conn.prepare(
        "SELECT table_name, table_id, order_nr, name, type, description FROM fields
         WHERE table_name = ?1 AND table_id = ?2
         ORDER BY order_nr, name",
    )?;
    let fields = stmt
        .query_map(params![class.as_str(), id], |row| {
            Ok(Field {
                table_name: row.get(0)?,
                table_id: row.get(1)?,
                order_nr: row.get(2)?,
                name: row.get(3)?,
                field_type: row.get(4)?,
                description: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("failed to get {class}({id}) fields"))?;
    Ok(fields)
}

/// Upserts by name. The `table_name`/`table_id` carried by each field are
/// ignored in favour of `class` and `id`.
pub fn set(conn: &Connection, class: EntityClass, id: &str, fields: &[Field]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO fields (table_name, table_id, order_nr, name, type, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (table_name, table_id, name) DO UPDATE SET
             order_nr = excluded.order_nr,
             type = excluded.type,
             description = excluded.description",
    )?;
    for field in fields {
        stmt.execute(params![
            class.as_str(),
            id,
            field.order_nr,
            field.name,
            field.field_type,
            field.description,
        ])
        .with_context(|| format!("failed to set {class}({id}) field {}", field.name))?;
    }
    Ok(())
}

pub fn delete(conn: &Connection, class: EntityClass, id: &str, names: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "DELETE FROM fields WHERE table_name = ?1 AND table_id = ?2 AND name = ?3",
    )?;
    for name in names {
        stmt.execute(params![class.as_str(), id, name])
            .with_context(|| format!("failed to delete {class}({id}) field {name}"))?;
    }
    Ok(())
}

pub fn delete_all(conn: &Connection, class: EntityClass, id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM fields WHERE table_name = ?1 AND table_id = ?2",
        params![class.as_str(), id],
    )
    .with_context(|| format!("failed to delete {class}({id}) fields"))
}
