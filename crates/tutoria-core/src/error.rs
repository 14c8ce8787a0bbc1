//! Error types for Tutoria

use thiserror::Error;

/// Result type alias using Tutoria's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tutoria error types
///
/// Expected "not found" conditions never surface here: the data-access
/// facade reports those as failure records in its outcome types. This enum
/// carries the store's native failures, such as constraint violations and
/// connectivity problems, so callers see them untranslated.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Whether the store rejected a write for violating a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(e)) if e.is_unique_violation())
    }

    /// Whether the store rejected a write that references a missing parent row
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(e)) if e.is_foreign_key_violation())
    }
}
