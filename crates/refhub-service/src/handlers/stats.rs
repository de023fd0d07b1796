//! Referrer stats handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Referrer stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Open requests visible to the caller as a referrer.
    pub pending_count: u32,
    /// When the counter was last touched.
    pub last_updated: String,
}

/// Get the caller's referrer stats.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.engine.stats().get(&auth.user_id)?;
    Ok(Json(StatsResponse {
        pending_count: stats.pending_count,
        last_updated: stats.last_updated.to_rfc3339(),
    }))
}
