//! Bracket error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the bracket engine, the stores and the orchestration layer
#[derive(Debug, Error)]
pub enum BracketError {
    /// Bad input to bracket generation (e.g. fewer than two players)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not allowed in the current state of a match or tournament
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Rejected user input (e.g. equal scores)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A stored status value outside the closed set
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl BracketError {
    pub(crate) fn tournament_not_found(id: Uuid) -> Self {
        BracketError::NotFound {
            entity: "Tournament",
            id,
        }
    }

    pub(crate) fn match_not_found(id: Uuid) -> Self {
        BracketError::NotFound { entity: "Match", id }
    }

    pub(crate) fn player_not_found(id: Uuid) -> Self {
        BracketError::NotFound {
            entity: "Player",
            id,
        }
    }

    pub(crate) fn not_draft(id: Uuid, status: impl std::fmt::Display, action: &str) -> Self {
        BracketError::InvalidOperation(format!(
            "cannot {action} tournament {id} in status {status}"
        ))
    }

    /// Whether this error is one of the `NotFound` family
    pub fn is_not_found(&self) -> bool {
        matches!(self, BracketError::NotFound { .. })
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and migration errors are collapsed into a generic message so
    /// SQL details never reach the presentation layer.
    pub fn client_message(&self) -> String {
        match self {
            BracketError::Database(_) | BracketError::Migration(_) => {
                "Internal server error".to_string()
            }
            BracketError::UnknownStatus(_) => "Corrupt match data".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for bracket and tournament operations
pub type BracketResult<T> = Result<T, BracketError>;
