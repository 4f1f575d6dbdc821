pub mod accounts;
pub mod auth;
pub mod error;
pub mod groups;
pub mod messages;
pub mod middleware;
pub mod persons;
pub mod routes;
pub mod users;

use serde::Deserialize;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;

/// `?sort=..&limit=..` shared by the listing endpoints. Filters are read
/// from the same query string by a second extractor.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub limit: u32,
}
