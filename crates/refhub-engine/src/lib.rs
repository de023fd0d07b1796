//! Business logic for the refhub referral marketplace.
//!
//! The engine layers on top of [`refhub_store`]'s atomic compound
//! operations:
//!
//! - [`WalletLedger`] — balances, holds, and the append-only ledger.
//! - [`PricingResolver`] — tiered costs and payouts with a TTL cache.
//! - [`PointsAwarder`] — idempotent bonus points and conversion.
//! - [`ReferrerStatsTracker`] — denormalized pending counters with a
//!   recompute backstop.
//! - [`ReferralEngine`] — the request lifecycle state machine.
//! - [`ExpirationSweeper`] — scheduled expiry of stale open requests.
//!
//! External collaborators enter through two seams: [`EmploymentDirectory`]
//! for employment facts and [`Notifier`] for best-effort event delivery.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod directory;
pub mod engine;
pub mod ledger;
pub mod notify;
pub mod points;
pub mod pricing;
pub mod stats;
pub mod sweeper;

pub use directory::{EmploymentDirectory, StaticDirectory};
pub use engine::{CompletionSummary, NewRequest, ProofSubmission, ReferralEngine};
pub use ledger::WalletLedger;
pub use notify::{LogNotifier, Notifier, ReferralEvent};
pub use points::PointsAwarder;
pub use pricing::{Clock, PricingResolver, SystemClock};
pub use stats::ReferrerStatsTracker;
pub use sweeper::ExpirationSweeper;
