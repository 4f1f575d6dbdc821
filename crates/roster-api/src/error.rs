use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use roster_core::{ErrorKind, RosterError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Roster(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Authentication | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                // disallowed state changes
                ErrorKind::Conflict => StatusCode::METHOD_NOT_ALLOWED,
                ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {:#}", self);
            "internal error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
