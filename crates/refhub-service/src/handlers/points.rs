//! Points handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use refhub_core::{ReferralReward, RewardKind};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::wallet::PageQuery;
use crate::state::AppState;

/// Points balance response.
#[derive(Debug, Serialize)]
pub struct PointsResponse {
    /// The referrer's current point total.
    pub total_points: i64,
    /// Paise credited per point on conversion.
    pub paise_per_point: i64,
}

/// Get the caller's point total.
pub async fn get_points(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<PointsResponse>, ApiError> {
    let total = state.engine.points().total(&auth.user_id)?;
    Ok(Json(PointsResponse {
        total_points: total,
        paise_per_point: state.engine.pricing().paise_per_point(),
    }))
}

/// Reward ledger row response.
#[derive(Debug, Serialize)]
pub struct RewardResponse {
    /// Reward ID.
    pub id: String,
    /// The linked request, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    /// Signed points delta.
    pub points: i64,
    /// Why the points moved.
    pub kind: RewardKind,
    /// When the row was created.
    pub awarded_at: String,
}

impl From<&ReferralReward> for RewardResponse {
    fn from(reward: &ReferralReward) -> Self {
        Self {
            id: reward.id.to_string(),
            request: reward.request.map(|r| r.to_string()),
            points: reward.points,
            kind: reward.kind,
            awarded_at: reward.awarded_at.to_rfc3339(),
        }
    }
}

/// List the caller's reward history, newest first.
pub async fn points_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<RewardResponse>>, ApiError> {
    let rewards = state
        .engine
        .points()
        .history(&auth.user_id, page.limit(), page.offset())?;
    Ok(Json(rewards.iter().map(RewardResponse::from).collect()))
}

/// Conversion response.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    /// Points converted (zero when there was nothing to convert).
    pub points_converted: i64,
    /// Wallet amount credited, in paise.
    pub amount_credited_paise: i64,
    /// Wallet balance after the conversion, in paise.
    pub balance_paise: i64,
}

/// Convert the caller's whole point total into wallet balance.
pub async fn convert_points(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ConvertResponse>, ApiError> {
    let rate = state.engine.pricing().paise_per_point();
    let outcome = state.engine.points().convert_to_wallet(&auth.user_id, rate)?;

    let response = match outcome {
        Some((points, tx)) => ConvertResponse {
            points_converted: points,
            amount_credited_paise: tx.amount_paise,
            balance_paise: tx.balance_after_paise,
        },
        None => ConvertResponse {
            points_converted: 0,
            amount_credited_paise: 0,
            balance_paise: state.engine.ledger().balance(&auth.user_id)?,
        },
    };
    Ok(Json(response))
}
