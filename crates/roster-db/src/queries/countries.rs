use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use roster_types::models::Country;

const COUNTRY_SELECT: &str = "SELECT id, name, national_id_pattern FROM countries";

fn country_at(row: &Row<'_>) -> rusqlite::Result<Country> {
    Ok(Country {
        id: row.get(0)?,
        name: row.get(1)?,
        national_id_pattern: row.get(2)?,
    })
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Country>> {
    conn.query_row(&format!("{COUNTRY_SELECT} WHERE id = ?1"), [id], country_at)
        .optional()
        .with_context(|| format!("failed to get country by id({id})"))
}

pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Country>> {
    conn.query_row(
        &format!("{COUNTRY_SELECT} WHERE name = ?1 COLLATE NOCASE"),
        [name],
        country_at,
    )
    .optional()
    .with_context(|| format!("failed to get country by name({name})"))
}

/// Countries whose name contains `name_filter`, alphabetically.
pub fn list(conn: &Connection, name_filter: &str) -> Result<Vec<Country>> {
    let mut stmt = conn.prepare(&format!(
        "{COUNTRY_SELECT} WHERE name LIKE '%' || ?1 || '%' ORDER BY name"
    ))?;
    let rows = stmt
        .query_map([name_filter], country_at)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to get list of countries")?;
    Ok(rows)
}
