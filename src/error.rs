//! Error types shared by the special-command dispatcher and the database layer.

use thiserror::Error;

/// Opaque failure reported by a cursor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DatabaseError(pub String);

impl DatabaseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<mysql::Error> for DatabaseError {
    fn from(err: mysql::Error) -> Self {
        Self(err.to_string())
    }
}

/// Errors surfaced by special-command dispatch.
#[derive(Error, Debug)]
pub enum SpecialError {
    /// The command is absent from every command table.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// A stub handler for a feature that is intentionally unbuilt.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// A handler that needs a cursor was invoked without one.
    #[error("Command {0} needs a database cursor")]
    InvalidInvocation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result type alias for special-command operations.
pub type Result<T> = std::result::Result<T, SpecialError>;
