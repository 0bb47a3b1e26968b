//! The module contains the errors the engine can throw.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The requested entity does not exist.
    #[error("{0} not exists")]
    NotFound(String),
    /// The entity exists but belongs to another user.
    #[error("{0}")]
    Forbidden(String),
    /// Another category of the same user already carries this name.
    #[error("category \"{0}\" already exists")]
    DuplicateName(String),
    /// A user with this email already exists.
    #[error("user \"{0}\" already exists")]
    DuplicateEmail(String),
    /// The operation is semantically disallowed, e.g. deleting a default
    /// category.
    #[error("{0}")]
    InvalidOperation(String),
    /// Input failed validation.
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::DuplicateName(a), Self::DuplicateName(b)) => a == b,
            (Self::DuplicateEmail(a), Self::DuplicateEmail(b)) => a == b,
            (Self::InvalidOperation(a), Self::InvalidOperation(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// True when the database rejected a write over a unique constraint.
///
/// The unique indexes are the source of truth for duplicate detection; the
/// in-op existence checks only produce friendlier errors for the common case.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
