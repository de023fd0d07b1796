//! Error types for refhub storage.

use refhub_core::{ReferralError, RequestStatus};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "wallet".
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// Available balance cannot cover the amount.
    #[error("insufficient funds: available={available}, required={required}")]
    InsufficientFunds {
        /// Currently available balance in paise.
        available: i64,
        /// Required amount in paise.
        required: i64,
    },

    /// A hold already exists for the reference.
    #[error("hold already exists for reference: {reference}")]
    DuplicateHold {
        /// The conflicting reference.
        reference: String,
    },

    /// A proof already exists for this (request, referrer) pair.
    #[error("proof already submitted for request {request}")]
    DuplicateProof {
        /// The request the proof was for.
        request: String,
    },

    /// A conditional status update found the row in a different state.
    ///
    /// This is how claim races resolve: the loser of the compare-and-swap
    /// sees the winner's status here.
    #[error("request {request} is {current}, not in an eligible state")]
    StatusConflict {
        /// The request that failed the check.
        request: String,
        /// The status actually found.
        current: RequestStatus,
    },

    /// The wallet is frozen and rejects all mutations.
    #[error("wallet is frozen: {owner}")]
    WalletFrozen {
        /// The frozen wallet's owner.
        owner: String,
    },

    /// Amount must be strictly positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),
}

impl From<StoreError> for ReferralError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(msg) => Self::Storage(msg),
            StoreError::Serialization(msg) => Self::Serialization(msg),
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::InsufficientFunds {
                available,
                required,
            } => Self::insufficient(available, required),
            StoreError::DuplicateHold { reference } => {
                Self::Conflict(format!("hold already exists for {reference}"))
            }
            StoreError::DuplicateProof { request } => {
                Self::Conflict(format!("proof already submitted for request {request}"))
            }
            StoreError::StatusConflict { request, current } => {
                Self::Conflict(format!("request {request} is already {current}"))
            }
            StoreError::WalletFrozen { owner } => {
                Self::Conflict(format!("wallet is frozen: {owner}"))
            }
            StoreError::InvalidAmount(amount) => {
                Self::Validation(format!("amount must be positive, got {amount}"))
            }
        }
    }
}
