//! Core types for the refhub referral marketplace.
//!
//! This crate provides the domain types used throughout the platform:
//!
//! - **Identifiers**: `UserId`, `OrgId`, `JobId`, `RequestId`,
//!   `TransactionId`, `RewardId`
//! - **Wallet**: `Wallet`, `Hold`, `WalletTransaction`
//! - **Requests**: `ReferralRequest`, `JobTarget`, `ReferralProof`,
//!   `StatusChange`
//! - **Rewards**: `ReferralReward`, `RewardKind`
//! - **Pricing**: `Tier`, `PricingSetting`, `PricingDefaults`
//!
//! # Monetary unit
//!
//! **Amounts are integer paise**: ₹49 = 4900 paise. Points convert to
//! wallet balance at a configured rate (default 1 point = 50 paise).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod pricing;
pub mod request;
pub mod reward;
pub mod stats;
pub mod sweep;
pub mod wallet;

pub use error::{ReferralError, Result};
pub use ids::{IdError, JobId, OrgId, RequestId, RewardId, TransactionId, UserId};
pub use pricing::{lookup_key, setting_key, PricingDefaults, PricingSetting, Tier};
pub use request::{
    Actor, JobTarget, ReferralProof, ReferralRequest, RequestStatus, StatusChange,
};
pub use reward::{ReferralReward, RewardKind};
pub use stats::ReferrerStats;
pub use sweep::SweepRun;
pub use wallet::{
    Hold, TransactionKind, TransactionSource, TransactionStatus, Wallet, WalletStatus,
    WalletTransaction,
};
