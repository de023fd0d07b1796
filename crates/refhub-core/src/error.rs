//! Error taxonomy for refhub.

use crate::ids::IdError;

/// Result type for refhub operations.
pub type Result<T> = std::result::Result<T, ReferralError>;

/// Errors surfaced by the referral engine and its components.
#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    /// Bad input or an illegal state transition.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "wallet" or "referral request".
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// Duplicate resource or a request that is no longer available.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Wallet balance cannot cover the operation.
    ///
    /// Carries enough detail for the caller to prompt a recharge.
    #[error("insufficient balance: available={balance}, required={required}, short by {shortfall}")]
    InsufficientBalance {
        /// Currently available balance in paise (balance minus active holds).
        balance: i64,
        /// Amount required in paise.
        required: i64,
        /// How much is missing, in paise.
        shortfall: i64,
    },

    /// Storage layer failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl ReferralError {
    /// Build an [`ReferralError::InsufficientBalance`] from what is
    /// available and what is needed.
    #[must_use]
    pub fn insufficient(balance: i64, required: i64) -> Self {
        Self::InsufficientBalance {
            balance,
            required,
            shortfall: required - balance,
        }
    }
}
