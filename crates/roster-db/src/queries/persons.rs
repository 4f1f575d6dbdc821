use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use roster_types::api::PersonsFilter;
use roster_types::models::{Country, Gender, Nationality, Person};

use crate::listing::{Conditions, SortKey};
use crate::models::uuid_at;

const PERSON_SELECT: &str =
    "SELECT p.id, p.name, p.surname, p.dob, p.gender, p.email, p.phone FROM persons AS p";

pub const SORT_KEYS: &[(&str, &'static str)] = &[
    ("name", "p.name"),
    ("surname", "p.surname"),
    ("dob", "p.dob"),
];

fn person_at(row: &Row<'_>) -> rusqlite::Result<Person> {
    let gender = match row.get::<_, Option<String>>(4)? {
        Some(g) => Some(g.parse::<Gender>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into())
        })?),
        None => None,
    };
    Ok(Person {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        surname: row.get(2)?,
        dob: row.get(3)?,
        gender,
        email: row.get(5)?,
        phone: row.get(6)?,
        nationalities: Vec::new(),
    })
}

pub fn insert(conn: &Connection, person: &Person) -> Result<()> {
    conn.execute(
        "INSERT INTO persons (id, name, surname, dob, gender, email, phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            person.id.to_string(),
            person.name,
            person.surname,
            person.dob,
            person.gender.map(|g| g.as_str()),
            person.email,
            person.phone,
        ],
    )
    .with_context(|| format!("failed to insert person {} {}", person.name, person.surname))?;

    for nationality in &person.nationalities {
        add_nationality(conn, person.id, nationality)?;
    }
    Ok(())
}

/// Records or replaces the person's national id for one country.
pub fn add_nationality(conn: &Connection, person_id: Uuid, nationality: &Nationality) -> Result<()> {
    conn.execute(
        "INSERT INTO person_nationalities (person_id, country_id, national_id) VALUES (?1, ?2, ?3)
         ON CONFLICT (person_id, country_id) DO UPDATE SET national_id = excluded.national_id",
        params![
            person_id.to_string(),
            nationality.country.id,
            nationality.national_id,
        ],
    )
    .context("failed to store nationality")?;
    Ok(())
}

fn nationalities(conn: &Connection, person_id: Uuid) -> Result<Vec<Nationality>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.national_id_pattern, n.national_id
         FROM person_nationalities AS n INNER JOIN countries AS c ON c.id = n.country_id
         WHERE n.person_id = ?1 ORDER BY c.name",
    )?;
    let rows = stmt
        .query_map([person_id.to_string()], |row| {
            Ok(Nationality {
                country: Country {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    national_id_pattern: row.get(2)?,
                },
                national_id: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to get nationalities")?;
    Ok(rows)
}

/// A person with its nationalities.
pub fn get(conn: &Connection, id: Uuid) -> Result<Option<Person>> {
    let person = conn
        .query_row(
            &format!("{PERSON_SELECT} WHERE p.id = ?1"),
            [id.to_string()],
            person_at,
        )
        .optional()
        .with_context(|| format!("failed to get person({id})"))?;

    match person {
        Some(mut person) => {
            person.nationalities = nationalities(conn, person.id)?;
            Ok(Some(person))
        }
        None => Ok(None),
    }
}

/// Person registered with exactly this identity. Missing dob or gender only
/// match rows where they are missing too.
pub fn find_by_identity(
    conn: &Connection,
    name: &str,
    surname: &str,
    dob: Option<NaiveDate>,
    gender: Option<Gender>,
) -> Result<Option<Uuid>> {
    conn.query_row(
        "SELECT id FROM persons
         WHERE name = ?1 AND surname = ?2 AND dob IS ?3 AND gender IS ?4
         ORDER BY created_at LIMIT 1",
        params![name, surname, dob, gender.map(|g| g.as_str())],
        |row| uuid_at(row, 0),
    )
    .optional()
    .context("failed to search for person")
}

/// Persons without their nationalities.
pub fn list(
    conn: &Connection,
    filter: &PersonsFilter,
    sort: &[SortKey],
    limit: u32,
) -> Result<Vec<Person>> {
    let mut cond = Conditions::default();
    if let Some(name) = filter.name.as_deref().filter(|n| !n.is_empty()) {
        cond.contains("p.name", name);
    }
    if let Some(surname) = filter.surname.as_deref().filter(|n| !n.is_empty()) {
        cond.contains("p.surname", surname);
    }

    let sql = cond.to_sql(PERSON_SELECT, sort, "p.surname, p.name", limit);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(cond.params()), person_at)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to select persons")?;
    Ok(rows)
}
