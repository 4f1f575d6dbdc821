pub mod access;
pub mod attributes;
pub mod config;
pub mod error;
pub mod groups;
pub mod identity;
pub mod messaging;
pub mod password;
pub mod persons;
pub mod registration;

use roster_db::Database;
use roster_db::listing::SortKey;

pub use config::RosterConfig;
pub use error::{ErrorKind, Result, RosterError};
pub use identity::NewUser;
pub use password::{MinLength, PasswordPolicy};

/// The membership service. All operations are synchronous and run against
/// the shared [`Database`].
pub struct Roster {
    db: Database,
    config: RosterConfig,
    policy: Box<dyn PasswordPolicy>,
}

impl Roster {
    /// Uses [`MinLength`] with `config.min_password_length` as the password
    /// policy.
    pub fn new(db: Database, config: RosterConfig) -> Self {
        let policy = Box::new(MinLength(config.min_password_length));
        Self { db, config, policy }
    }

    pub fn with_password_policy(mut self, policy: impl PasswordPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// Parses a comma separated sort spec such as `name,-id`.
pub(crate) fn parse_sort(spec: &str, allowed: &[(&str, &'static str)]) -> Result<Vec<SortKey>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            SortKey::parse(s, allowed)
                .ok_or_else(|| RosterError::validation(format!("cannot sort on \"{s}\"")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[(&str, &'static str)] = &[("name", "t.name"), ("id", "t.id")];

    #[test]
    fn sort_spec_is_split_and_checked() {
        let keys = parse_sort(" name , -id,", KEYS).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].column, "t.id");
        assert!(keys[1].descending);

        assert!(parse_sort("", KEYS).unwrap().is_empty());
        assert!(matches!(
            parse_sort("name,passhash", KEYS),
            Err(RosterError::Validation(_))
        ));
    }
}
