//! Database row types. Where a table maps one-to-one onto an API model the
//! queries return the model itself; these rows carry the extra columns
//! (password hashes, raw foreign keys) that never leave the core.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use roster_types::models::{Account, Group, GroupOwner, Metas, Person, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub account: Account,
    pub username: String,
    pub passhash: String,
    pub admin: bool,
    pub active: bool,
    pub expiry: Option<DateTime<Utc>>,
    pub person_id: Option<Uuid>,
}

impl UserRow {
    pub fn into_user(self, person: Option<Person>) -> User {
        User {
            id: self.id,
            account: self.account,
            username: self.username,
            admin: self.admin,
            active: self.active,
            expiry: self.expiry,
            person,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub token: String,
    pub time_created: DateTime<Utc>,
    pub time_updated: DateTime<Utc>,
    pub user: UserRow,
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: Uuid,
    pub account: Account,
    pub parent_group_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub invitation: bool,
    pub owner_type: String,
    pub owner_id: String,
}

impl GroupRow {
    pub fn into_group(self, parent: Option<Group>, data: Metas) -> Group {
        Group {
            owner: GroupOwner::from_parts(&self.owner_type, &self.owner_id),
            id: self.id,
            account: self.account,
            parent_group_id: self.parent_group_id,
            parent: parent.map(Box::new),
            name: self.name,
            description: self.description,
            invitation: self.invitation,
            data,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemberRow {
    pub id: Uuid,
    pub group_id: Uuid,
    pub member_type: String,
    pub member_id: Uuid,
}

// -- Column helpers --

/// Ids are stored as hyphenated text.
pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(s) if !s.is_empty() => s.parse().map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        }),
        _ => Ok(None),
    }
}

/// Reads `id, name, active, admin, expiry` starting at `offset`.
pub(crate) fn account_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Account> {
    Ok(Account {
        id: uuid_at(row, offset)?,
        name: row.get(offset + 1)?,
        active: row.get(offset + 2)?,
        admin: row.get(offset + 3)?,
        expiry: row.get(offset + 4)?,
    })
}
