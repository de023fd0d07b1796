//! Admin handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use refhub_core::SweepRun;
use refhub_engine::ExpirationSweeper;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Expiration run parameters.
#[derive(Debug, Deserialize)]
pub struct ExpireBody {
    /// Age threshold in days.
    pub days_old: Option<i64>,
    /// Maximum rows to process.
    pub batch_size: Option<usize>,
}

/// Sweep run response.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// Run ID.
    pub id: String,
    /// Eligible rows found.
    pub found: usize,
    /// Rows expired.
    pub expired: usize,
    /// Holds released.
    pub holds_released: usize,
    /// Total paise returned to available balances.
    pub amount_released_paise: i64,
    /// Per-item failures.
    pub errors: Vec<String>,
    /// When the run started.
    pub started_at: String,
    /// When the run finished.
    pub finished_at: String,
}

impl From<SweepRun> for SweepResponse {
    fn from(run: SweepRun) -> Self {
        Self {
            id: run.id.to_string(),
            found: run.found,
            expired: run.expired,
            holds_released: run.holds_released,
            amount_released_paise: run.amount_released_paise,
            errors: run.errors,
            started_at: run.started_at.to_rfc3339(),
            finished_at: run.finished_at.to_rfc3339(),
        }
    }
}

/// Trigger an expiration sweep.
pub async fn trigger_expire(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Json(body): Json<ExpireBody>,
) -> Result<Json<SweepResponse>, ApiError> {
    let days_old = body.days_old.unwrap_or(ExpirationSweeper::DEFAULT_DAYS_OLD);
    if days_old <= 0 {
        return Err(ApiError::BadRequest("days_old must be positive".into()));
    }
    let batch_size = body
        .batch_size
        .unwrap_or(ExpirationSweeper::DEFAULT_BATCH_SIZE);

    // The sweep is blocking RocksDB work; keep it off the async workers.
    let sweeper = Arc::clone(&state.sweeper);
    let run = tokio::task::spawn_blocking(move || sweeper.run(days_old, batch_size))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(SweepResponse::from(run)))
}
