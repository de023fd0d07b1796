//! Points reward accounting.
//!
//! Points are a bonus path, not a correctness-critical one: awarding
//! never propagates an error to the caller of the primary state
//! transition. Conversion to wallet balance is user-initiated and does
//! return errors.

use std::sync::Arc;

use refhub_core::{
    ReferralReward, RequestId, Result, RewardKind, UserId, WalletTransaction,
};
use refhub_store::Store;

/// Idempotent points ledger with conversion to wallet balance.
pub struct PointsAwarder {
    store: Arc<dyn Store>,
}

impl PointsAwarder {
    /// Create an awarder over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Award points for a request-linked milestone.
    ///
    /// Idempotent per (referrer, request, kind): a repeat award is a
    /// no-op. Failures are logged and swallowed; the return value is the
    /// points actually added (zero for a duplicate or a failure).
    pub fn award(
        &self,
        referrer: &UserId,
        request: &RequestId,
        points: i64,
        kind: RewardKind,
    ) -> i64 {
        if points <= 0 {
            return 0;
        }
        let reward = ReferralReward::award(*referrer, *request, points, kind);
        match self.store.insert_reward(&reward) {
            Ok(true) => {
                tracing::info!(%referrer, %request, points, ?kind, "points awarded");
                points
            }
            Ok(false) => {
                tracing::debug!(%referrer, %request, ?kind, "points already awarded, skipping");
                0
            }
            Err(err) => {
                tracing::warn!(%referrer, %request, ?kind, error = %err, "points award failed");
                0
            }
        }
    }

    /// Convert the referrer's whole point total into wallet balance.
    ///
    /// The wallet credit, the conversion reward row, and the total reset
    /// happen in one atomic store batch. Returns `None` when there is
    /// nothing to convert.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn convert_to_wallet(
        &self,
        referrer: &UserId,
        paise_per_point: i64,
    ) -> Result<Option<(i64, WalletTransaction)>> {
        Ok(self.store.convert_points(referrer, paise_per_point)?)
    }

    /// The referrer's current point total.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn total(&self, referrer: &UserId) -> Result<i64> {
        Ok(self.store.points_total(referrer)?)
    }

    /// Reward rows for the referrer, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn history(
        &self,
        referrer: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferralReward>> {
        Ok(self.store.list_rewards(referrer, limit, offset)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refhub_store::RocksStore;
    use tempfile::TempDir;

    fn awarder() -> (PointsAwarder, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        (PointsAwarder::new(store), dir)
    }

    #[test]
    fn repeat_award_is_a_noop() {
        let (points, _dir) = awarder();
        let referrer = UserId::generate();
        let request = RequestId::generate();

        assert_eq!(
            points.award(&referrer, &request, 15, RewardKind::ProofSubmission),
            15
        );
        assert_eq!(
            points.award(&referrer, &request, 15, RewardKind::ProofSubmission),
            0
        );
        assert_eq!(points.total(&referrer).unwrap(), 15);
    }

    #[test]
    fn non_positive_awards_are_skipped() {
        let (points, _dir) = awarder();
        let referrer = UserId::generate();
        assert_eq!(
            points.award(&referrer, &RequestId::generate(), 0, RewardKind::Verification),
            0
        );
        assert_eq!(points.total(&referrer).unwrap(), 0);
    }

    #[test]
    fn conversion_credits_and_records_history() {
        let (points, _dir) = awarder();
        let referrer = UserId::generate();
        points.award(&referrer, &RequestId::generate(), 40, RewardKind::ProofSubmission);

        let (converted, tx) = points.convert_to_wallet(&referrer, 50).unwrap().unwrap();
        assert_eq!(converted, 40);
        assert_eq!(tx.amount_paise, 2000);
        assert_eq!(points.total(&referrer).unwrap(), 0);

        // Conversion appends a negative ledger row.
        let history = points.history(&referrer, 10, 0).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].points, -40);
        assert_eq!(history[0].kind, RewardKind::Conversion);
    }

    #[test]
    fn conversion_with_no_points_is_none() {
        let (points, _dir) = awarder();
        assert!(points
            .convert_to_wallet(&UserId::generate(), 50)
            .unwrap()
            .is_none());
    }
}
