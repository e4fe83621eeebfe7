//! The module contains the error the engine can throw.
//!
//! Every variant carries a human readable message. Callers that need to
//! translate an error into a transport response should match on
//! [`EngineError::kind`] instead of the variants themselves:
//!
//! - [`InsufficientBalance`] thrown when a withdrawal exceeds the balance.
//! - [`AccountNotFound`] thrown when an account ID number is unknown.
//! - [`EmailExists`] thrown when an email is already registered.
//!
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`AccountNotFound`]: EngineError::AccountNotFound
//!  [`EmailExists`]: EngineError::EmailExists
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid transaction type: {0}")]
    InvalidTransactionType(String),
    #[error("\"{0}\" not found")]
    KeyNotFound(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("email already exists: {0}")]
    EmailExists(String),
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Flat classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    EmailExists,
    InsufficientBalance,
    StoreFailure,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidAmount(_) | Self::InvalidTransactionType(_) => {
                ErrorKind::InvalidInput
            }
            Self::KeyNotFound(_) | Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::EmailExists(_) => ErrorKind::EmailExists,
            Self::InsufficientBalance(_) => ErrorKind::InsufficientBalance,
            Self::PasswordHash(_) | Self::Database(_) => ErrorKind::StoreFailure,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransactionType(a), Self::InvalidTransactionType(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::EmailExists(a), Self::EmailExists(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
