//! Metas and fields: free-form attributes of any entity class, keyed by
//! `(class, id)`. Nothing cascades; owners purge their attributes on delete.

use roster_db::queries::{fields, metas};
use roster_types::models::{EntityClass, Field, Metas};

use crate::Roster;
use crate::error::{Result, RosterError};

/// Attribute names must be non-empty and free of whitespace.
pub(crate) fn validate_names<'a>(names: impl IntoIterator<Item = &'a String>) -> Result<()> {
    for name in names {
        if name.is_empty() {
            return Err(RosterError::validation("empty attribute name"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(RosterError::validation(format!("spaces in name \"{name}\"")));
        }
    }
    Ok(())
}

/// Trims and rejects names left empty.
fn trimmed_names(names: &[String]) -> Result<Vec<String>> {
    names
        .iter()
        .map(|n| {
            let n = n.trim();
            if n.is_empty() {
                Err(RosterError::validation("cannot delete empty name"))
            } else {
                Ok(n.to_string())
            }
        })
        .collect()
}

impl Roster {
    pub fn get_metas(&self, class: EntityClass, id: &str) -> Result<Metas> {
        Ok(self.db.with_conn(|conn| metas::get(conn, class, id))?)
    }

    pub fn set_metas(&self, class: EntityClass, id: &str, values: &Metas) -> Result<()> {
        validate_names(values.keys())?;
        Ok(self.db.with_conn(|conn| metas::set(conn, class, id, values))?)
    }

    /// An empty list is a no-op.
    pub fn del_metas(&self, class: EntityClass, id: &str, names: &[String]) -> Result<()> {
        let names = trimmed_names(names)?;
        if names.is_empty() {
            return Ok(());
        }
        Ok(self.db.with_conn(|conn| metas::delete(conn, class, id, &names))?)
    }

    pub fn del_all_metas(&self, class: EntityClass, id: &str) -> Result<()> {
        self.db.with_conn(|conn| metas::delete_all(conn, class, id))?;
        Ok(())
    }

    pub fn get_fields(&self, class: EntityClass, id: &str) -> Result<Vec<Field>> {
        Ok(self.db.with_conn(|conn| fields::get(conn, class, id))?)
    }

    pub fn set_fields(&self, class: EntityClass, id: &str, values: &[Field]) -> Result<()> {
        validate_names(values.iter().map(|f| &f.name))?;
        Ok(self.db.with_conn(|conn| fields::set(conn, class, id, values))?)
    }

    pub fn del_fields(&self, class: EntityClass, id: &str, names: &[String]) -> Result<()> {
        let names = trimmed_names(names)?;
        if names.is_empty() {
            return Ok(());
        }
        Ok(self.db.with_conn(|conn| fields::delete(conn, class, id, &names))?)
    }

    pub fn del_all_fields(&self, class: EntityClass, id: &str) -> Result<()> {
        self.db.with_conn(|conn| fields::delete_all(conn, class, id))?;
        Ok(())
    }
}
