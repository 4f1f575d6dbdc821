use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("{entity}({id}) not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Coarse classification used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Unauthorized,
    NotFound,
    Conflict,
    Storage,
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
