//! Unified application error type.
//! All modules (db, core, api, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Local store
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Remote backend
    // ---------------------------
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected the request (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    // ---------------------------
    // Session state
    // ---------------------------
    #[error("No active session: check in first")]
    NotCheckedIn,

    #[error("Another check-in/check-out request is still pending")]
    Busy,

    #[error("Invariant violated: {0}")]
    Invariant(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Network and server failures the user may simply retry.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Http(_) => true,
            AppError::Remote { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }

    /// Errors that indicate a bug in the caller rather than a business failure.
    pub fn is_defect(&self) -> bool {
        matches!(self, AppError::Invariant(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let e = AppError::Remote {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(e.is_transient());

        let e = AppError::Remote {
            status: 404,
            message: "not found".into(),
        };
        assert!(!e.is_transient());
        assert!(AppError::Invariant("close without id".into()).is_defect());
        assert!(!AppError::NotCheckedIn.is_defect());
    }
}
