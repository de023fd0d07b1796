//! Router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, health, points, referrals, stats, wallet};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Referrals (bearer identity)
/// - `POST /v1/referrals` - Create a referral request
/// - `GET /v1/referrals` - List the caller's requests
/// - `GET /v1/referrals/:id` - Get a request
/// - `POST /v1/referrals/:id/claim` - Claim a pending request
/// - `POST /v1/referrals/:id/proof` - Submit proof (fused claim optional)
/// - `POST /v1/referrals/:id/verify` - Record the seeker's verdict
/// - `POST /v1/referrals/:id/cancel` - Cancel a pending request
///
/// ## Wallet (bearer identity)
/// - `GET /v1/wallet` - Balance, available balance, and active holds
/// - `GET /v1/wallet/transactions` - Ledger history, newest first
/// - `POST /v1/wallet/recharge` - Credit a verified recharge amount
///
/// ## Points (bearer identity)
/// - `GET /v1/points` - Point total and conversion rate
/// - `GET /v1/points/history` - Reward ledger, newest first
/// - `POST /v1/points/convert` - Convert points to wallet balance
///
/// ## Stats (bearer identity)
/// - `GET /v1/referrers/me/stats` - Pending-request counter
///
/// ## Admin (API key)
/// - `POST /v1/admin/expire` - Trigger an expiration sweep
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Referrals
        .route("/referrals", post(referrals::create_referral))
        .route("/referrals", get(referrals::list_referrals))
        .route("/referrals/:id", get(referrals::get_referral))
        .route("/referrals/:id/claim", post(referrals::claim_referral))
        .route("/referrals/:id/proof", post(referrals::submit_proof))
        .route("/referrals/:id/verify", post(referrals::verify_referral))
        .route("/referrals/:id/cancel", post(referrals::cancel_referral))
        // Wallet
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/transactions", get(wallet::list_transactions))
        .route("/wallet/recharge", post(wallet::recharge))
        // Points
        .route("/points", get(points::get_points))
        .route("/points/history", get(points::points_history))
        .route("/points/convert", post(points::convert_points))
        // Stats
        .route("/referrers/me/stats", get(stats::get_stats))
        // Admin
        .route("/admin/expire", post(admin::trigger_expire));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
