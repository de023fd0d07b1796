//! Denormalized referrer statistics.
//!
//! Incremental updates from the engine keep counters roughly fresh;
//! `recompute` derives them from live request rows and is the
//! correctness backstop, invoked by the sweeper after each batch.

use std::sync::Arc;

use refhub_core::{OrgId, ReferrerStats, Result, UserId};
use refhub_store::Store;

use crate::directory::EmploymentDirectory;

/// Pending-request counters per referrer.
pub struct ReferrerStatsTracker {
    store: Arc<dyn Store>,
    directory: Arc<dyn EmploymentDirectory>,
}

impl ReferrerStatsTracker {
    /// Create a tracker over the given store and directory.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, directory: Arc<dyn EmploymentDirectory>) -> Self {
        Self { store, directory }
    }

    /// A referrer's stats row, zeroed when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn get(&self, referrer: &UserId) -> Result<ReferrerStats> {
        Ok(self
            .store
            .get_stats(referrer)?
            .unwrap_or_else(|| ReferrerStats::new(*referrer)))
    }

    /// Increment the pending counter for every eligible referrer at the
    /// organization. Failures are logged and swallowed.
    pub fn increment_for_org(&self, org: &OrgId) {
        self.bump_for_org(org, 1);
    }

    /// Decrement the pending counter for every eligible referrer at the
    /// organization, clamped at zero. Failures are logged and swallowed.
    pub fn decrement_for_org(&self, org: &OrgId) {
        self.bump_for_org(org, -1);
    }

    fn bump_for_org(&self, org: &OrgId, delta: i32) {
        for referrer in self.directory.eligible_referrers(org) {
            if let Err(err) = self.store.bump_stats(&referrer, delta) {
                tracing::warn!(%referrer, %org, delta, error = %err, "stats update failed");
            }
        }
    }

    /// Recompute pending counts for the organization from live
    /// Pending/Claimed rows, overwriting the incremental counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn recompute(&self, org: &OrgId) -> Result<u32> {
        let open = self
            .store
            .list_requests_by_org(org)?
            .into_iter()
            .filter(|r| r.status.is_actionable())
            .count();
        let count = u32::try_from(open).unwrap_or(u32::MAX);

        for referrer in self.directory.eligible_referrers(org) {
            let mut stats = self.get(&referrer)?;
            stats.pending_count = count;
            stats.last_updated = chrono::Utc::now();
            self.store.put_stats(&stats)?;
        }
        Ok(count)
    }
}
