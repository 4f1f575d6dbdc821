use uuid::Uuid;

use roster_db::PUBLIC_ACCOUNT_ID;

/// Tunables of the [`Roster`](crate::Roster) service.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    /// Account that self-registered users are created under.
    pub public_account_id: Uuid,
    /// Minimum length accepted by the default password policy (default: 8).
    pub min_password_length: usize,
    /// Length of generated admin and registration passwords (default: 10).
    pub generated_password_length: usize,
    /// Longest parent chain walked before giving up (default: 32).
    pub max_group_depth: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            public_account_id: PUBLIC_ACCOUNT_ID,
            min_password_length: 8,
            generated_password_length: 10,
            max_group_depth: 32,
        }
    }
}
