//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Wallet records, keyed by owner `UserId`.
    pub const WALLETS: &str = "wallets";

    /// Wallet transactions, keyed by `transaction_id` (ULID).
    pub const WALLET_TXS: &str = "wallet_txs";

    /// Index: transactions by owner, keyed by `owner || transaction_id`.
    /// Value is empty (index only).
    pub const WALLET_TXS_BY_OWNER: &str = "wallet_txs_by_owner";

    /// Active holds, keyed by reference (the request id string).
    pub const HOLDS: &str = "holds";

    /// Index: holds by owner, keyed by `owner || reference`.
    pub const HOLDS_BY_OWNER: &str = "holds_by_owner";

    /// Referral requests, keyed by `request_id` (ULID, so key order is
    /// creation order — the sweeper scans this oldest first).
    pub const REQUESTS: &str = "requests";

    /// Index: requests by organization, keyed by `org || request_id`.
    pub const REQUESTS_BY_ORG: &str = "requests_by_org";

    /// Index: requests by seeker, keyed by `seeker || request_id`.
    pub const REQUESTS_BY_SEEKER: &str = "requests_by_seeker";

    /// Immutable status history, keyed by `request_id || entry_ulid`.
    pub const STATUS_HISTORY: &str = "status_history";

    /// Referral proofs, keyed by `request_id || referrer`. Key uniqueness
    /// enforces one proof per (request, referrer).
    pub const PROOFS: &str = "proofs";

    /// Reward ledger rows, keyed by `reward_id` (ULID).
    pub const REWARDS: &str = "rewards";

    /// Index: rewards by referrer, keyed by `referrer || reward_id`.
    pub const REWARDS_BY_REFERRER: &str = "rewards_by_referrer";

    /// Uniqueness keys for request-linked rewards, keyed by
    /// `referrer || request_id || kind_tag`. Insert-or-ignore on this key
    /// is what makes awarding idempotent.
    pub const REWARD_KEYS: &str = "reward_keys";

    /// Running point totals, keyed by referrer.
    pub const POINTS_TOTALS: &str = "points_totals";

    /// Denormalized referrer stats, keyed by referrer.
    pub const REFERRER_STATS: &str = "referrer_stats";

    /// Pricing setting overrides, keyed by lookup key string.
    pub const SETTINGS: &str = "settings";

    /// Expiration sweep run log, keyed by run id (ULID).
    pub const SWEEP_RUNS: &str = "sweep_runs";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::WALLETS,
        cf::WALLET_TXS,
        cf::WALLET_TXS_BY_OWNER,
        cf::HOLDS,
        cf::HOLDS_BY_OWNER,
        cf::REQUESTS,
        cf::REQUESTS_BY_ORG,
        cf::REQUESTS_BY_SEEKER,
        cf::STATUS_HISTORY,
        cf::PROOFS,
        cf::REWARDS,
        cf::REWARDS_BY_REFERRER,
        cf::REWARD_KEYS,
        cf::POINTS_TOTALS,
        cf::REFERRER_STATS,
        cf::SETTINGS,
        cf::SWEEP_RUNS,
    ]
}
