use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use roster_core::{ErrorKind, RosterError};

use crate::auth::{AppState, blocking};
use crate::error::ApiError;

pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Resolves the `X-Auth-Token` header to a [`Session`](roster_types::models::Session)
/// and stores it in the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RosterError::Authentication(format!("missing {AUTH_HEADER} header")))?
        .to_string();

    let session = blocking(&state, move |roster| roster.get_session(&token))
        .await
        .map_err(|e| match e {
            ApiError::Roster(e) if e.kind() != ErrorKind::Storage => {
                debug!("rejected session: {}", e);
                ApiError::Roster(RosterError::Authentication("invalid session".into()))
            }
            other => other,
        })?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
