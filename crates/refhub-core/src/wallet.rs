//! Wallet and transaction ledger types.
//!
//! Balances are integer **paise** (`i64`): ₹49 = 4900 paise. Integer minor
//! units avoid floating point drift in the ledger.
//!
//! Every balance mutation appends exactly one immutable
//! [`WalletTransaction`] carrying before/after snapshots. Holds do not move
//! the balance; they reduce the *available* balance until released or
//! finalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// A user's internal wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// The owning user.
    pub owner: UserId,

    /// Settled balance in paise. Never negative.
    pub balance_paise: i64,

    /// ISO currency code. Always "INR" today.
    pub currency: String,

    /// Wallet status.
    pub status: WalletStatus,

    /// When the wallet was created.
    pub created_at: DateTime<Utc>,

    /// When the wallet was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new active wallet with zero balance.
    #[must_use]
    pub fn new(owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            owner,
            balance_paise: 0,
            currency: "INR".into(),
            status: WalletStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    /// Wallet can transact.
    Active,

    /// Wallet is frozen; all mutations are rejected.
    Frozen,
}

/// An active reservation against a wallet.
///
/// A hold reduces the available balance without being a permanent debit.
/// The reference is the id of the referral request that placed it, so one
/// request can carry at most one hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    /// External reference (the referral request id).
    pub reference: String,

    /// The wallet owner the hold is against.
    pub owner: UserId,

    /// Reserved amount in paise.
    pub amount_paise: i64,

    /// Why the hold was placed.
    pub reason: String,

    /// When the hold was placed.
    pub placed_at: DateTime<Utc>,
}

/// Direction of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Adds to the balance.
    Credit,

    /// Removes from the balance.
    Debit,
}

/// Lifecycle status of a wallet transaction.
///
/// The ledger invariant `balance == Σ completed credits − Σ completed
/// debits` counts only [`TransactionStatus::Completed`] entries; hold
/// placement and release entries are audit rows that never move the
/// balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// A hold audit entry; the amount is reserved, not settled.
    Pending,

    /// A settled balance mutation.
    Completed,

    /// A hold that was released back to the available balance.
    Reversed,
}

/// Business source of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Fee reserved or settled for a referral request.
    ReferralFee,

    /// Payout credited to a referrer on completion, from platform funds.
    ReferrerPayout,

    /// Points converted into wallet balance.
    PointsConversion,

    /// Verified recharge amount from the payment gateway.
    Recharge,

    /// Promotional or welcome credit.
    Bonus,

    /// Manual adjustment by an operator.
    Adjustment,
}

/// An immutable, append-only ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Unique transaction id (ULID, time-ordered).
    pub id: TransactionId,

    /// The wallet owner.
    pub owner: UserId,

    /// Credit or debit.
    pub kind: TransactionKind,

    /// Amount in paise. Always strictly positive; direction is `kind`.
    pub amount_paise: i64,

    /// Balance before this entry, in paise.
    pub balance_before_paise: i64,

    /// Balance after this entry, in paise.
    pub balance_after_paise: i64,

    /// Business source of the entry.
    pub source: TransactionSource,

    /// Optional external reference (request id, gateway order id, ...).
    pub reference: Option<String>,

    /// Human-readable description.
    pub description: String,

    /// Entry status.
    pub status: TransactionStatus,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Audit entry for a hold being placed. The balance does not move.
    #[must_use]
    pub fn hold_placed(
        owner: UserId,
        amount_paise: i64,
        balance_paise: i64,
        reference: String,
        reason: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            owner,
            kind: TransactionKind::Debit,
            amount_paise,
            balance_before_paise: balance_paise,
            balance_after_paise: balance_paise,
            source: TransactionSource::ReferralFee,
            reference: Some(reference),
            description: reason,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Audit entry for a hold being released. The balance does not move.
    #[must_use]
    pub fn hold_released(
        owner: UserId,
        amount_paise: i64,
        balance_paise: i64,
        reference: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            owner,
            kind: TransactionKind::Credit,
            amount_paise,
            balance_before_paise: balance_paise,
            balance_after_paise: balance_paise,
            source: TransactionSource::ReferralFee,
            reference: Some(reference),
            description: "Hold released".into(),
            status: TransactionStatus::Reversed,
            created_at: Utc::now(),
        }
    }

    /// Settled debit converting a hold into a permanent charge.
    #[must_use]
    pub fn hold_finalized(
        owner: UserId,
        amount_paise: i64,
        balance_before_paise: i64,
        reference: String,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            owner,
            kind: TransactionKind::Debit,
            amount_paise,
            balance_before_paise,
            balance_after_paise: balance_before_paise - amount_paise,
            source: TransactionSource::ReferralFee,
            reference: Some(reference),
            description,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Direct settled debit with no reservation phase.
    #[must_use]
    pub fn debit(
        owner: UserId,
        amount_paise: i64,
        balance_before_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            owner,
            kind: TransactionKind::Debit,
            amount_paise,
            balance_before_paise,
            balance_after_paise: balance_before_paise - amount_paise,
            source,
            reference: None,
            description,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Settled credit.
    #[must_use]
    pub fn credit(
        owner: UserId,
        amount_paise: i64,
        balance_before_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            owner,
            kind: TransactionKind::Credit,
            amount_paise,
            balance_before_paise,
            balance_after_paise: balance_before_paise + amount_paise,
            source,
            reference: None,
            description,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Signed effect of this entry on the settled balance.
    #[must_use]
    pub fn settled_delta_paise(&self) -> i64 {
        if self.status != TransactionStatus::Completed {
            return 0;
        }
        match self.kind {
            TransactionKind::Credit => self.amount_paise,
            TransactionKind::Debit => -self.amount_paise,
        }
    }
}
