//! Denormalized referrer statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Per-referrer counter of open requests at their organization.
///
/// This is an eventually-consistent cache. Incremental updates keep it
/// roughly fresh; `recompute` from live request rows is the correctness
/// backstop against drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferrerStats {
    /// The referrer the counter belongs to.
    pub referrer: UserId,

    /// Number of open (pending or claimed) requests visible to them.
    pub pending_count: u32,

    /// When the counter was last touched.
    pub last_updated: DateTime<Utc>,
}

impl ReferrerStats {
    /// Create a zeroed counter.
    #[must_use]
    pub fn new(referrer: UserId) -> Self {
        Self {
            referrer,
            pending_count: 0,
            last_updated: Utc::now(),
        }
    }

    /// Apply a signed delta, clamping at zero. Scattered incremental
    /// updates can race; the clamp keeps a missed increment from ever
    /// producing an underflow.
    pub fn apply(&mut self, delta: i32) {
        self.pending_count = self.pending_count.saturating_add_signed(delta).max(0);
        self.last_updated = Utc::now();
    }
}
