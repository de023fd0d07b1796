//! Expiration sweep run log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Summary of one expiration sweep, persisted for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRun {
    /// Unique run id (ULID, time-ordered).
    pub id: Ulid,

    /// When the sweep started.
    pub started_at: DateTime<Utc>,

    /// When the sweep finished.
    pub finished_at: DateTime<Utc>,

    /// Age threshold used, in days.
    pub days_old: i64,

    /// Batch size limit used.
    pub batch_size: usize,

    /// Eligible rows found in the window.
    pub found: usize,

    /// Rows successfully expired.
    pub expired: usize,

    /// Holds released while expiring.
    pub holds_released: usize,

    /// Total amount returned to available balances, in paise.
    pub amount_released_paise: i64,

    /// Per-item failures. A bad row is recorded here and skipped; it never
    /// halts the batch.
    pub errors: Vec<String>,
}
