// Error taxonomy shared by the store, the stats engine, and the API layer.
//
// Client errors (validation, not found, conflict) carry a message meant for
// the caller. Everything else is a server fault: the detail is logged and the
// caller only sees a generic message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing/invalid required field or uniqueness violation
    #[error("{0}")]
    Validation(String),

    /// Unknown identifier
    #[error("{0}")]
    NotFound(String),

    /// Operation refused because of dependent records
    #[error("{0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// True for errors caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::NotFound(_) | AppError::Conflict(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
