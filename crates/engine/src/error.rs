//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when an input is missing or malformed. It is
//!   always detected before a database transaction starts.
//! - [`KeyNotFound`] thrown when a register, ledger row or withdrawal is absent.
//! - [`CaseInUse`] thrown when a case already has an open register.
//! - [`AlreadyClosed`] thrown when closing a register twice.
//! - [`MismatchedCaja`] thrown when a batch of rows spans several registers.
//! - [`Storage`] thrown when the receipt storage fails.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`CaseInUse`]: EngineError::CaseInUse
//!  [`AlreadyClosed`]: EngineError::AlreadyClosed
//!  [`MismatchedCaja`]: EngineError::MismatchedCaja
//!  [`Storage`]: EngineError::Storage
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Case already in use: {0}")]
    CaseInUse(String),
    #[error("Register already closed: {0}")]
    AlreadyClosed(String),
    #[error("Rows belong to different registers: {0}")]
    MismatchedCaja(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Maps a unique-index violation on the open-register index to
    /// [`EngineError::CaseInUse`]; any other database error is kept as is.
    pub(crate) fn from_open_insert(err: DbErr, case_id: i32) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                Self::CaseInUse(format!("case {case_id} already has an open register"))
            }
            _ => Self::Database(err),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::CaseInUse(a), Self::CaseInUse(b)) => a == b,
            (Self::AlreadyClosed(a), Self::AlreadyClosed(b)) => a == b,
            (Self::MismatchedCaja(a), Self::MismatchedCaja(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
