use uuid::Uuid;

use roster_db::queries::{countries, persons};
use roster_types::api::PersonsFilter;
use roster_types::models::{Country, Person};

use crate::error::{Result, RosterError};
use crate::{Roster, parse_sort};

impl Roster {
    /// Persons without their nationalities.
    pub fn get_persons(&self, filter: &PersonsFilter, sort: &str, limit: u32) -> Result<Vec<Person>> {
        let sort = parse_sort(sort, persons::SORT_KEYS)?;
        Ok(self
            .db
            .with_conn(|conn| persons::list(conn, filter, &sort, limit))?)
    }

    pub fn get_person(&self, id: Uuid) -> Result<Person> {
        self.db
            .with_conn(|conn| persons::get(conn, id))?
            .ok_or_else(|| RosterError::not_found("person", id))
    }

    pub fn get_countries(&self, name_filter: &str) -> Result<Vec<Country>> {
        Ok(self
            .db
            .with_conn(|conn| countries::list(conn, name_filter.trim()))?)
    }
}
