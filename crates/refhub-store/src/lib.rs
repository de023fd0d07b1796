//! `RocksDB` storage layer for refhub.
//!
//! This crate persists wallets, the append-only transaction ledger, referral
//! requests with their immutable status history, proofs, the points reward
//! ledger, denormalized referrer stats, pricing settings, and sweep run
//! logs.
//!
//! # Consistency model
//!
//! Every multi-row mutation is a *compound operation*: the store takes the
//! relevant per-row locks, re-reads state under them, and commits a single
//! `WriteBatch`. Callers never observe a partially-applied transition.
//! Status transitions are conditional updates — the expected status is
//! re-checked under the request lock, so of two racing claims exactly one
//! succeeds and the other gets [`StoreError::StatusConflict`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
mod locks;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};

use refhub_core::{
    Actor, Hold, OrgId, PricingSetting, ReferralProof, ReferralRequest, ReferralReward,
    ReferrerStats, RequestId, StatusChange, SweepRun, TransactionSource, UserId, Wallet,
    WalletTransaction,
};

/// Monetary settlement applied when a request reaches Completed.
#[derive(Debug, Clone)]
pub struct CompletionSettlement {
    /// Description for the seeker's finalized fee debit.
    pub fee_description: String,

    /// Tiered payout credited to the referrer from platform funds, in
    /// paise. Zero skips the payout leg.
    pub payout_paise: i64,

    /// Description for the referrer's payout credit.
    pub payout_description: String,
}

/// What a completion compound operation did.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// The request after the transition.
    pub request: ReferralRequest,

    /// The seeker's finalized fee debit, if a hold was outstanding.
    pub fee_tx: Option<WalletTransaction>,

    /// The referrer's payout credit, if a payout was due.
    pub payout_tx: Option<WalletTransaction>,
}

/// The storage trait defining all database operations.
///
/// This abstracts the storage layer so the engine can run against
/// different implementations.
pub trait Store: Send + Sync {
    // =========================================================================
    // Wallets and ledger
    // =========================================================================

    /// Get a wallet by owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_wallet(&self, owner: &UserId) -> Result<Option<Wallet>>;

    /// Get the owner's wallet, creating an empty active one if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_or_create_wallet(&self, owner: &UserId) -> Result<Wallet>;

    /// Credit a wallet and append the ledger entry atomically. Creates the
    /// wallet if it does not exist yet.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidAmount`] if `amount_paise <= 0`.
    /// - [`StoreError::WalletFrozen`] if the wallet is frozen.
    fn credit_wallet(
        &self,
        owner: &UserId,
        amount_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Result<WalletTransaction>;

    /// Debit a wallet directly (no reservation phase) and append the ledger
    /// entry atomically. The check is against the *available* balance:
    /// settled balance minus active holds.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the wallet does not exist.
    /// - [`StoreError::InsufficientFunds`] if available balance is too low.
    fn debit_wallet(
        &self,
        owner: &UserId,
        amount_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Result<WalletTransaction>;

    /// Reserve funds against a wallet. Fails if the available balance
    /// cannot cover the amount; otherwise records the hold and a pending
    /// audit entry.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the wallet does not exist.
    /// - [`StoreError::InsufficientFunds`] if available balance is too low.
    /// - [`StoreError::DuplicateHold`] if the reference already has a hold.
    fn place_hold(
        &self,
        owner: &UserId,
        amount_paise: i64,
        reference: &str,
        reason: String,
    ) -> Result<Hold>;

    /// Release an active hold, returning the reserved amount to the
    /// available balance. Returns `Ok(None)` (not an error) when no active
    /// hold exists for the reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn release_hold(&self, reference: &str) -> Result<Option<Hold>>;

    /// Convert an active hold into a permanent debit ledger entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no active hold exists.
    fn finalize_hold(&self, reference: &str, description: String) -> Result<WalletTransaction>;

    /// Get an active hold by reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_hold(&self, reference: &str) -> Result<Option<Hold>>;

    /// List the owner's active holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn active_holds(&self, owner: &UserId) -> Result<Vec<Hold>>;

    /// List ledger entries for an owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions(
        &self,
        owner: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WalletTransaction>>;

    // =========================================================================
    // Referral requests
    // =========================================================================

    /// Insert a referral request and its indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_request(&self, request: &ReferralRequest) -> Result<()>;

    /// Get a request by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_request(&self, id: &RequestId) -> Result<Option<ReferralRequest>>;

    /// Find an open (non-terminal) request by the same seeker for the same
    /// target, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_open_duplicate(&self, seeker: &UserId, dedup_key: &str) -> Result<Option<RequestId>>;

    /// Conditionally claim a Pending request for a referrer.
    ///
    /// The Pending check runs under the request lock; the loser of a race
    /// gets [`StoreError::StatusConflict`] carrying the winner's status.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the request does not exist.
    /// - [`StoreError::StatusConflict`] if the request is not Pending.
    fn claim_request(&self, id: &RequestId, referrer: &UserId) -> Result<ReferralRequest>;

    /// Complete a request in one atomic batch: conditional transition to
    /// Completed, proof insert, finalization of the seeker's hold, and the
    /// referrer's payout credit.
    ///
    /// `from` is Pending for the fused claim+proof path and Claimed for an
    /// assigned referrer submitting proof.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the request does not exist.
    /// - [`StoreError::StatusConflict`] if the status is not `from`.
    /// - [`StoreError::DuplicateProof`] if this referrer already submitted
    ///   proof for this request.
    fn complete_request(
        &self,
        id: &RequestId,
        referrer: &UserId,
        proof: &ReferralProof,
        from: refhub_core::RequestStatus,
        settlement: &CompletionSettlement,
    ) -> Result<CompletionOutcome>;

    /// Record the seeker's verification verdict on a Completed request.
    /// `verified = true` transitions to Verified (terminal); `false` only
    /// records the flag.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the request does not exist.
    /// - [`StoreError::StatusConflict`] if the status is not Completed.
    fn verify_request(
        &self,
        id: &RequestId,
        verified: bool,
        actor: Actor,
    ) -> Result<ReferralRequest>;

    /// Cancel a Pending request and release its hold in one batch.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the request does not exist.
    /// - [`StoreError::StatusConflict`] if the status is not Pending.
    fn cancel_request(&self, id: &RequestId, actor: Actor)
        -> Result<(ReferralRequest, Option<Hold>)>;

    /// Expire an open request (Pending, Claimed, or Completed-unverified)
    /// and release any outstanding hold in one batch. History is attributed
    /// to the system.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the request does not exist.
    /// - [`StoreError::StatusConflict`] if the request is not expirable.
    fn expire_request(&self, id: &RequestId) -> Result<(ReferralRequest, Option<Hold>)>;

    /// List expirable requests older than the cutoff, oldest first, up to
    /// `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_expirable(&self, cutoff: DateTime<Utc>, limit: usize)
        -> Result<Vec<ReferralRequest>>;

    /// List all requests at an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_requests_by_org(&self, org: &OrgId) -> Result<Vec<ReferralRequest>>;

    /// List all requests created by a seeker.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_requests_by_seeker(&self, seeker: &UserId) -> Result<Vec<ReferralRequest>>;

    /// Read the immutable status history of a request, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn status_history(&self, id: &RequestId) -> Result<Vec<StatusChange>>;

    /// Get the proof a referrer submitted for a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_proof(&self, request: &RequestId, referrer: &UserId) -> Result<Option<ReferralProof>>;

    // =========================================================================
    // Points rewards
    // =========================================================================

    /// Insert a reward row and bump the referrer's running total
    /// atomically. For request-linked kinds this is insert-or-ignore on the
    /// (referrer, request, kind) uniqueness key: returns `false` without
    /// writing anything when the row already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_reward(&self, reward: &ReferralReward) -> Result<bool>;

    /// The referrer's current point total.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn points_total(&self, referrer: &UserId) -> Result<i64>;

    /// List reward rows for a referrer, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_rewards(
        &self,
        referrer: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferralReward>>;

    /// Convert the referrer's whole point total to wallet balance in one
    /// atomic batch: wallet credit, conversion reward row, total reset to
    /// zero. Returns `Ok(None)` when there is nothing to convert.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn convert_points(
        &self,
        referrer: &UserId,
        paise_per_point: i64,
    ) -> Result<Option<(i64, WalletTransaction)>>;

    // =========================================================================
    // Referrer stats
    // =========================================================================

    /// Get a referrer's stats row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_stats(&self, referrer: &UserId) -> Result<Option<ReferrerStats>>;

    /// Apply a signed delta to the pending counter (clamped at zero),
    /// creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn bump_stats(&self, referrer: &UserId, delta: i32) -> Result<ReferrerStats>;

    /// Overwrite a stats row (used by recompute).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_stats(&self, stats: &ReferrerStats) -> Result<()>;

    // =========================================================================
    // Pricing settings
    // =========================================================================

    /// Insert or update a pricing setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_setting(&self, setting: &PricingSetting) -> Result<()>;

    /// List all pricing settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_settings(&self) -> Result<Vec<PricingSetting>>;

    // =========================================================================
    // Sweep runs
    // =========================================================================

    /// Persist a sweep run summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_sweep_run(&self, run: &SweepRun) -> Result<()>;

    /// List sweep runs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_sweep_runs(&self, limit: usize) -> Result<Vec<SweepRun>>;
}
