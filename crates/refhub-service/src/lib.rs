//! Refhub HTTP API service.
//!
//! This crate exposes the referral marketplace over HTTP:
//!
//! - Referral request lifecycle (create, claim, proof, verify, cancel)
//! - Wallet balance, ledger history, and recharges
//! - Points balance, history, and conversion
//! - Referrer stats
//! - Admin-triggered expiration sweeps
//!
//! # Authentication
//!
//! Session validation happens upstream; requests arrive with the caller's
//! identity as a bearer principal. Admin endpoints use a shared API key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Axum handlers all return Result and need async for routing consistency.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_async)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
