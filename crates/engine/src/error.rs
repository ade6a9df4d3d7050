//! The module contains the error the engine can throw.
//!
//! Validation failures are reported before anything is written, so callers
//! can treat every error as "nothing changed" unless it is a
//! [`Database`](EngineError::Database) error raised mid-transaction, in which
//! case the transaction has been rolled back.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid goals: {0}")]
    InvalidGoals(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Insufficient leaves: balance {balance}, change {change}, short by {short}", short = shortfall(.balance, .change))]
    InsufficientLeaves { balance: i64, change: i64 },
    #[error("Conflicting update: {0}")]
    Conflict(String),
    #[error("Farm missing for user {0}")]
    MissingFarm(i32),
    #[error("Goals not initialized for user {user_id}: found {found} of {expected}")]
    IncompleteGoals {
        user_id: i32,
        found: usize,
        expected: usize,
    },
    #[error("Receipt rejected: {0}")]
    ReceiptRejected(String),
    #[error("Receipt classifier failed: {0}")]
    Classifier(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

fn shortfall(balance: &i64, change: &i64) -> i64 {
    balance.saturating_add(*change).saturating_neg()
}

impl EngineError {
    /// How many leaves were missing for an [`InsufficientLeaves`] error.
    ///
    /// [`InsufficientLeaves`]: EngineError::InsufficientLeaves
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            Self::InsufficientLeaves { balance, change } => Some(shortfall(balance, change)),
            _ => None,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidGoals(a), Self::InvalidGoals(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (
                Self::InsufficientLeaves {
                    balance: a,
                    change: b,
                },
                Self::InsufficientLeaves {
                    balance: c,
                    change: d,
                },
            ) => a == c && b == d,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::MissingFarm(a), Self::MissingFarm(b)) => a == b,
            (
                Self::IncompleteGoals {
                    user_id: a,
                    found: b,
                    expected: c,
                },
                Self::IncompleteGoals {
                    user_id: d,
                    found: e,
                    expected: f,
                },
            ) => a == d && b == e && c == f,
            (Self::ReceiptRejected(a), Self::ReceiptRejected(b)) => a == b,
            (Self::Classifier(a), Self::Classifier(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
