//! HTTP request handlers.

pub mod admin;
pub mod health;
pub mod points;
pub mod referrals;
pub mod stats;
pub mod wallet;
