//! The referral request state machine.
//!
//! Orchestrates the pricing resolver, wallet ledger, points awarder, and
//! stats tracker around the store's atomic compound operations.
//!
//! Money is correctness-critical and flows through `Result`; points,
//! stats, and notifications are bonus paths that never fail a primary
//! transition.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use refhub_core::{
    Actor, Hold, JobTarget, OrgId, ReferralError, ReferralProof, ReferralRequest, RequestId,
    RequestStatus, Result, RewardKind, StatusChange, UserId,
};
use refhub_store::{CompletionSettlement, Store, StoreError};

use crate::directory::EmploymentDirectory;
use crate::ledger::WalletLedger;
use crate::notify::{Notifier, ReferralEvent};
use crate::points::PointsAwarder;
use crate::pricing::PricingResolver;
use crate::stats::ReferrerStatsTracker;

/// Input for creating a referral request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    /// The seeker creating the request.
    pub seeker: UserId,

    /// URL of the resume to forward.
    pub resume_url: String,

    /// The targeted job.
    pub target: JobTarget,

    /// Organization the referral is at.
    pub org: OrgId,

    /// Optional message to the referrer.
    pub message: Option<String>,
}

/// Input for submitting proof of referral.
#[derive(Debug, Clone)]
pub struct ProofSubmission {
    /// URL of the uploaded evidence.
    pub file_url: String,

    /// MIME type or short kind tag of the evidence.
    pub file_type: String,

    /// Optional note from the referrer.
    pub description: Option<String>,
}

/// What a completion did: the transitioned request, the payout credited
/// to the referrer, and the points actually awarded.
#[derive(Debug, Clone)]
pub struct CompletionSummary {
    /// The request after the transition to Completed.
    pub request: ReferralRequest,

    /// Payout credited to the referrer, in paise.
    pub payout_paise: i64,

    /// Points added by this completion (zero for repeats).
    pub points_awarded: i64,
}

/// The orchestrating engine for the referral lifecycle.
pub struct ReferralEngine {
    store: Arc<dyn Store>,
    directory: Arc<dyn EmploymentDirectory>,
    notifier: Arc<dyn Notifier>,
    pricing: PricingResolver,
    ledger: WalletLedger,
    points: PointsAwarder,
    stats: ReferrerStatsTracker,
}

impl ReferralEngine {
    /// Wire an engine over a store, directory, and notifier.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        directory: Arc<dyn EmploymentDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let pricing = PricingResolver::new(Arc::clone(&store));
        let ledger = WalletLedger::new(Arc::clone(&store));
        let points = PointsAwarder::new(Arc::clone(&store));
        let stats = ReferrerStatsTracker::new(Arc::clone(&store), Arc::clone(&directory));
        Self {
            store,
            directory,
            notifier,
            pricing,
            ledger,
            points,
            stats,
        }
    }

    /// The wallet ledger.
    #[must_use]
    pub fn ledger(&self) -> &WalletLedger {
        &self.ledger
    }

    /// The points awarder.
    #[must_use]
    pub fn points(&self) -> &PointsAwarder {
        &self.points
    }

    /// The stats tracker.
    #[must_use]
    pub fn stats(&self) -> &ReferrerStatsTracker {
        &self.stats
    }

    /// The pricing resolver.
    #[must_use]
    pub fn pricing(&self) -> &PricingResolver {
        &self.pricing
    }

    /// Get a request by id.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::NotFound`] if the request does not exist.
    pub fn get_request(&self, id: &RequestId) -> Result<ReferralRequest> {
        self.store
            .get_request(id)?
            .ok_or_else(|| ReferralError::NotFound {
                entity: "referral request",
                id: id.to_string(),
            })
    }

    /// The immutable status history of a request, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn status_history(&self, id: &RequestId) -> Result<Vec<StatusChange>> {
        Ok(self.store.status_history(id)?)
    }

    /// All requests created by a seeker.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn requests_by_seeker(&self, seeker: &UserId) -> Result<Vec<ReferralRequest>> {
        Ok(self.store.list_requests_by_seeker(seeker)?)
    }

    /// Create a referral request.
    ///
    /// The fee hold is placed **before** the row is inserted; if the
    /// insert then fails the hold is released on the way out, so a failed
    /// create never leaves money reserved.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Validation`] for a bad target or resume.
    /// - [`ReferralError::Conflict`] when an open request for the same
    ///   target already exists.
    /// - [`ReferralError::InsufficientBalance`] when the available balance
    ///   cannot cover the tier's fee.
    pub fn create_request(&self, input: NewRequest) -> Result<ReferralRequest> {
        let NewRequest {
            seeker,
            resume_url,
            target,
            org,
            message,
        } = input;

        if resume_url.trim().is_empty() {
            return Err(ReferralError::Validation("resume URL is required".into()));
        }
        if let JobTarget::External { company, title, .. } = &target {
            if company.trim().is_empty() || title.trim().is_empty() {
                return Err(ReferralError::Validation(
                    "external job target requires company and title".into(),
                ));
            }
        }

        if let Some(existing) = self.store.find_open_duplicate(&seeker, &target.dedup_key())? {
            return Err(ReferralError::Conflict(format!(
                "an open request for this job already exists: {existing}"
            )));
        }

        let tier = self.directory.org_tier(&org);
        let cost = self.pricing.cost(tier);
        self.ledger.get_or_create_wallet(&seeker)?;

        let request = ReferralRequest::new(seeker, resume_url, target, org, message);
        let reference = request.id.to_string();
        self.ledger.place_hold(
            &seeker,
            cost,
            &reference,
            format!("Referral fee ({} tier)", tier.tag()),
        )?;

        if let Err(err) = self.store.put_request(&request) {
            if let Err(release_err) = self.ledger.release_hold(&reference) {
                tracing::error!(
                    request = %request.id,
                    error = %release_err,
                    "failed to release hold after insert failure"
                );
            }
            return Err(err.into());
        }

        self.stats.increment_for_org(&org);
        self.notifier.publish(ReferralEvent::Created {
            request: request.id,
            seeker,
        });
        tracing::info!(request = %request.id, %seeker, cost_paise = cost, "request created");
        Ok(request)
    }

    /// Claim a Pending request for a referrer.
    ///
    /// Eligibility (employment at the target organization) is re-checked
    /// here, not just at creation time. The transition itself is a
    /// conditional update, so of two racing claims exactly one wins.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Validation`] for self-referral or a referrer not
    ///   employed at the organization.
    /// - [`ReferralError::Conflict`] when the request is no longer
    ///   available.
    pub fn claim_request(&self, referrer: &UserId, id: &RequestId) -> Result<ReferralRequest> {
        let request = self.get_request(id)?;
        self.check_claim_eligibility(&request, referrer)?;

        let claimed = self
            .store
            .claim_request(id, referrer)
            .map_err(Self::no_longer_available)?;

        self.notifier.publish(ReferralEvent::Claimed {
            request: *id,
            referrer: *referrer,
        });
        Ok(claimed)
    }

    /// Fused claim + proof: claim and complete in a single transition.
    ///
    /// Same eligibility checks as [`Self::claim_request`]; the status
    /// change, proof insert, fee finalization, and payout credit land in
    /// one atomic store batch.
    ///
    /// # Errors
    ///
    /// As [`Self::claim_request`], plus proof validation.
    pub fn claim_with_proof(
        &self,
        referrer: &UserId,
        id: &RequestId,
        submission: ProofSubmission,
    ) -> Result<CompletionSummary> {
        let request = self.get_request(id)?;
        self.check_claim_eligibility(&request, referrer)?;
        self.complete(&request, referrer, submission, RequestStatus::Pending)
    }

    /// Submit proof for a Claimed request, assigned referrer only.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Validation`] when the caller is not the assigned
    ///   referrer.
    /// - [`ReferralError::Conflict`] when the request is not Claimed.
    pub fn submit_proof(
        &self,
        referrer: &UserId,
        id: &RequestId,
        submission: ProofSubmission,
    ) -> Result<CompletionSummary> {
        let request = self.get_request(id)?;
        match request.referrer {
            Some(assigned) if assigned == *referrer => {}
            Some(_) => {
                return Err(ReferralError::Validation(
                    "only the assigned referrer can submit proof".into(),
                ))
            }
            None => {
                return Err(ReferralError::Conflict(format!(
                    "request {id} has not been claimed"
                )))
            }
        }
        self.complete(&request, referrer, submission, RequestStatus::Claimed)
    }

    /// Record the seeker's verification verdict on a Completed request.
    ///
    /// A positive verdict transitions to Verified and awards the referrer
    /// the verification bonus (idempotent per request).
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Validation`] when the caller is not the seeker.
    /// - [`ReferralError::Conflict`] when the request is not Completed.
    pub fn verify(&self, seeker: &UserId, id: &RequestId, verified: bool) -> Result<ReferralRequest> {
        let request = self.get_request(id)?;
        if request.seeker != *seeker {
            return Err(ReferralError::Validation(
                "only the requesting seeker can verify".into(),
            ));
        }

        let updated = self.store.verify_request(id, verified, Actor::User(*seeker))?;

        if verified {
            if let Some(referrer) = updated.referrer {
                self.points.award(
                    &referrer,
                    id,
                    self.pricing.verification_points(),
                    RewardKind::Verification,
                );
            }
        }

        self.notifier.publish(ReferralEvent::Verified {
            request: *id,
            verified,
        });
        Ok(updated)
    }

    /// Cancel a Pending request, releasing its fee hold.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Validation`] when the caller is not the seeker.
    /// - [`ReferralError::Conflict`] when the request is not Pending.
    pub fn cancel(&self, seeker: &UserId, id: &RequestId) -> Result<ReferralRequest> {
        let request = self.get_request(id)?;
        if request.seeker != *seeker {
            return Err(ReferralError::Validation(
                "only the requesting seeker can cancel".into(),
            ));
        }

        let (cancelled, hold) = self.store.cancel_request(id, Actor::User(*seeker))?;
        if let Some(hold) = hold {
            tracing::info!(request = %id, amount_paise = hold.amount_paise, "hold released on cancel");
        }

        self.stats.decrement_for_org(&cancelled.org);
        self.notifier
            .publish(ReferralEvent::Cancelled { request: *id });
        Ok(cancelled)
    }

    /// Expire a stale open request. System path, driven by the sweeper.
    ///
    /// Legal from Pending, Claimed, or Completed-but-never-verified, once
    /// the request is at or past `cutoff`. The caller owns the window
    /// (the sweeper derives it from the run's `days_old`) so selection
    /// and the age re-check here can never disagree. Releases any
    /// outstanding hold; history is attributed to the system.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::Validation`] when the request is not old enough.
    /// - [`ReferralError::Conflict`] when the request is not expirable.
    pub fn expire(
        &self,
        id: &RequestId,
        cutoff: DateTime<Utc>,
    ) -> Result<(ReferralRequest, Option<Hold>)> {
        let request = self.get_request(id)?;
        if request.requested_at > cutoff {
            return Err(ReferralError::Validation(format!(
                "request {id} is not past the expiration threshold"
            )));
        }

        let was_open = request.status.is_actionable();
        let (expired, hold) = self.store.expire_request(id)?;
        if let Some(hold) = &hold {
            tracing::info!(request = %id, amount_paise = hold.amount_paise, "hold released on expiry");
        }

        // Completed-unverified rows already left the open set.
        if was_open {
            self.stats.decrement_for_org(&expired.org);
        }
        self.notifier.publish(ReferralEvent::Expired { request: *id });
        Ok((expired, hold))
    }

    fn check_claim_eligibility(&self, request: &ReferralRequest, referrer: &UserId) -> Result<()> {
        if *referrer == request.seeker {
            return Err(ReferralError::Validation(
                "cannot claim your own referral request".into(),
            ));
        }
        if !self.directory.is_eligible_referrer(referrer, &request.org) {
            return Err(ReferralError::Validation(
                "referrer does not currently work at the target organization".into(),
            ));
        }
        Ok(())
    }

    fn complete(
        &self,
        request: &ReferralRequest,
        referrer: &UserId,
        submission: ProofSubmission,
        from: RequestStatus,
    ) -> Result<CompletionSummary> {
        if submission.file_url.trim().is_empty() {
            return Err(ReferralError::Validation("proof file URL is required".into()));
        }

        let tier = self.directory.org_tier(&request.org);
        let proof = ReferralProof {
            request: request.id,
            referrer: *referrer,
            file_url: submission.file_url,
            file_type: submission.file_type,
            description: submission.description,
            submitted_at: Utc::now(),
        };
        let settlement = CompletionSettlement {
            fee_description: format!("Referral fee for request {}", request.id),
            payout_paise: self.pricing.payout(tier),
            payout_description: format!("Referral payout for request {}", request.id),
        };

        let outcome = self
            .store
            .complete_request(&request.id, referrer, &proof, from, &settlement)
            .map_err(Self::no_longer_available)?;

        let mut awarded = self.points.award(
            referrer,
            &request.id,
            self.pricing.proof_points(),
            RewardKind::ProofSubmission,
        );
        if Utc::now() - request.requested_at <= Duration::hours(24) {
            awarded += self.points.award(
                referrer,
                &request.id,
                self.pricing.quick_response_points(),
                RewardKind::QuickResponseBonus,
            );
        }

        self.stats.decrement_for_org(&request.org);
        self.notifier.publish(ReferralEvent::Completed {
            request: request.id,
            referrer: *referrer,
        });

        let payout_paise = outcome
            .payout_tx
            .as_ref()
            .map_or(0, |tx| tx.amount_paise);
        tracing::info!(
            request = %request.id,
            %referrer,
            payout_paise,
            points = awarded,
            "request completed"
        );
        Ok(CompletionSummary {
            request: outcome.request,
            payout_paise,
            points_awarded: awarded,
        })
    }

    /// Map a lost claim race to a distinguishable "no longer available"
    /// conflict.
    fn no_longer_available(err: StoreError) -> ReferralError {
        match err {
            StoreError::StatusConflict { request, .. } => {
                ReferralError::Conflict(format!("request {request} is no longer available"))
            }
            other => other.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use crate::notify::LogNotifier;
    use refhub_core::{Tier, TransactionSource};
    use refhub_store::RocksStore;
    use tempfile::TempDir;

    struct Harness {
        engine: ReferralEngine,
        store: Arc<RocksStore>,
        directory: Arc<StaticDirectory>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let directory = Arc::new(StaticDirectory::new());
        let engine = ReferralEngine::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&directory) as Arc<dyn EmploymentDirectory>,
            Arc::new(LogNotifier),
        );
        Harness {
            engine,
            store,
            directory,
            _dir: dir,
        }
    }

    fn seeker_with_balance(h: &Harness, paise: i64) -> UserId {
        let seeker = UserId::generate();
        h.engine
            .ledger()
            .credit_bonus(&seeker, paise, TransactionSource::Recharge, "seed".into())
            .unwrap();
        seeker
    }

    fn new_request(seeker: UserId, org: OrgId) -> NewRequest {
        NewRequest {
            seeker,
            resume_url: "https://cdn.example/resume.pdf".into(),
            target: JobTarget::External {
                company: "Acme".into(),
                title: "Engineer".into(),
                url: None,
            },
            org,
            message: None,
        }
    }

    fn proof() -> ProofSubmission {
        ProofSubmission {
            file_url: "https://cdn.example/proof.png".into(),
            file_type: "image/png".into(),
            description: None,
        }
    }

    #[test]
    fn create_places_hold_and_leaves_request_pending() {
        // Seeker has ₹100; the standard-tier fee is ₹49.
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        assert_eq!(h.engine.ledger().balance(&seeker).unwrap(), 10000);
        assert_eq!(h.engine.ledger().available(&seeker).unwrap(), 5100);
        let holds = h.engine.ledger().active_holds(&seeker).unwrap();
        assert_eq!(holds.len(), 1);
        assert_eq!(holds[0].amount_paise, 4900);
    }

    #[test]
    fn create_with_shortfall_leaves_no_trace() {
        // Seeker has ₹30; the fee is ₹49, short by ₹19.
        let h = harness();
        let seeker = seeker_with_balance(&h, 3000);

        let err = h
            .engine
            .create_request(new_request(seeker, OrgId::generate()))
            .unwrap_err();
        match err {
            ReferralError::InsufficientBalance { shortfall, .. } => assert_eq!(shortfall, 1900),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(h.engine.requests_by_seeker(&seeker).unwrap().is_empty());
        assert!(h.engine.ledger().active_holds(&seeker).unwrap().is_empty());
    }

    #[test]
    fn create_rejects_duplicate_open_target() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 20000);

        h.engine.create_request(new_request(seeker, org)).unwrap();
        let err = h
            .engine
            .create_request(new_request(seeker, org))
            .unwrap_err();
        assert!(matches!(err, ReferralError::Conflict(_)));
    }

    #[test]
    fn create_uses_tiered_pricing() {
        let h = harness();
        let org = OrgId::generate();
        h.directory.set_tier(org, Tier::Elite);
        let seeker = seeker_with_balance(&h, 30000);

        h.engine.create_request(new_request(seeker, org)).unwrap();
        // Elite fee is ₹199.
        assert_eq!(h.engine.ledger().available(&seeker).unwrap(), 10100);
    }

    #[test]
    fn create_rejects_blank_external_target() {
        let h = harness();
        let seeker = seeker_with_balance(&h, 10000);
        let mut input = new_request(seeker, OrgId::generate());
        input.target = JobTarget::External {
            company: "  ".into(),
            title: "Engineer".into(),
            url: None,
        };
        assert!(matches!(
            h.engine.create_request(input),
            Err(ReferralError::Validation(_))
        ));
    }

    #[test]
    fn claim_requires_current_employment() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let request = h.engine.create_request(new_request(seeker, org)).unwrap();

        let referrer = UserId::generate();
        // Not employed at the org.
        assert!(matches!(
            h.engine.claim_request(&referrer, &request.id),
            Err(ReferralError::Validation(_))
        ));

        h.directory.employ(referrer, org);
        let claimed = h.engine.claim_request(&referrer, &request.id).unwrap();
        assert_eq!(claimed.status, RequestStatus::Claimed);
    }

    #[test]
    fn claim_rejects_self_referral() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        h.directory.employ(seeker, org);
        let request = h.engine.create_request(new_request(seeker, org)).unwrap();

        assert!(matches!(
            h.engine.claim_request(&seeker, &request.id),
            Err(ReferralError::Validation(_))
        ));
    }

    #[test]
    fn employment_change_blocks_claim() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);
        let request = h.engine.create_request(new_request(seeker, org)).unwrap();

        // Referrer left the org between creation and claim.
        h.directory.terminate(&referrer, &org);
        assert!(matches!(
            h.engine.claim_request(&referrer, &request.id),
            Err(ReferralError::Validation(_))
        ));
    }

    #[test]
    fn lost_claim_race_reads_as_no_longer_available() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let request = h.engine.create_request(new_request(seeker, org)).unwrap();

        let first = UserId::generate();
        let second = UserId::generate();
        h.directory.employ(first, org);
        h.directory.employ(second, org);

        h.engine.claim_request(&first, &request.id).unwrap();
        let err = h.engine.claim_request(&second, &request.id).unwrap_err();
        match err {
            ReferralError::Conflict(msg) => assert!(msg.contains("no longer available")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn quick_proof_awards_bonus_and_settles_money() {
        // Scenario: claim then proof within 24h earns 15 + 10 points.
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        h.engine.claim_request(&referrer, &request.id).unwrap();
        let summary = h
            .engine
            .submit_proof(&referrer, &request.id, proof())
            .unwrap();

        assert_eq!(summary.request.status, RequestStatus::Completed);
        assert_eq!(summary.points_awarded, 25);
        assert_eq!(summary.payout_paise, 2500);

        assert_eq!(h.engine.points().total(&referrer).unwrap(), 25);
        // Fee settled, hold gone.
        assert_eq!(h.engine.ledger().balance(&seeker).unwrap(), 5100);
        assert!(h.engine.ledger().active_holds(&seeker).unwrap().is_empty());
        // Payout landed.
        assert_eq!(h.engine.ledger().balance(&referrer).unwrap(), 2500);
    }

    #[test]
    fn slow_proof_skips_quick_bonus() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        h.engine.claim_request(&referrer, &request.id).unwrap();

        // Backdate creation past the 24h window.
        let mut aged = h.store.get_request(&request.id).unwrap().unwrap();
        aged.requested_at = Utc::now() - Duration::hours(30);
        h.store.put_request(&aged).unwrap();

        let summary = h
            .engine
            .submit_proof(&referrer, &request.id, proof())
            .unwrap();
        assert_eq!(summary.points_awarded, 15);
    }

    #[test]
    fn fused_claim_with_proof_completes_from_pending() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        let summary = h
            .engine
            .claim_with_proof(&referrer, &request.id, proof())
            .unwrap();

        assert_eq!(summary.request.status, RequestStatus::Completed);
        assert_eq!(summary.request.referrer, Some(referrer));
        let history = h.engine.status_history(&request.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from, RequestStatus::Pending);
        assert_eq!(history[0].to, RequestStatus::Completed);
    }

    #[test]
    fn proof_from_unassigned_referrer_is_rejected() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let assigned = UserId::generate();
        let interloper = UserId::generate();
        h.directory.employ(assigned, org);
        h.directory.employ(interloper, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        h.engine.claim_request(&assigned, &request.id).unwrap();

        assert!(matches!(
            h.engine.submit_proof(&interloper, &request.id, proof()),
            Err(ReferralError::Validation(_))
        ));
    }

    #[test]
    fn verify_awards_bonus_and_terminates() {
        // Scenario: seeker verifies a completed request; referrer earns +25.
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        h.engine
            .claim_with_proof(&referrer, &request.id, proof())
            .unwrap();
        let before = h.engine.points().total(&referrer).unwrap();

        let verified = h.engine.verify(&seeker, &request.id, true).unwrap();
        assert_eq!(verified.status, RequestStatus::Verified);
        assert_eq!(h.engine.points().total(&referrer).unwrap(), before + 25);

        // Terminal: a second verify conflicts.
        assert!(matches!(
            h.engine.verify(&seeker, &request.id, true),
            Err(ReferralError::Conflict(_))
        ));
    }

    #[test]
    fn negative_verdict_keeps_request_completed() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        h.engine
            .claim_with_proof(&referrer, &request.id, proof())
            .unwrap();
        let before = h.engine.points().total(&referrer).unwrap();

        let updated = h.engine.verify(&seeker, &request.id, false).unwrap();
        assert_eq!(updated.status, RequestStatus::Completed);
        assert_eq!(updated.verified, Some(false));
        assert_eq!(h.engine.points().total(&referrer).unwrap(), before);
    }

    #[test]
    fn verify_requires_the_seeker() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        h.engine
            .claim_with_proof(&referrer, &request.id, proof())
            .unwrap();

        assert!(matches!(
            h.engine.verify(&referrer, &request.id, true),
            Err(ReferralError::Validation(_))
        ));
    }

    #[test]
    fn cancel_restores_available_balance() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        assert_eq!(h.engine.ledger().available(&seeker).unwrap(), 5100);

        let cancelled = h.engine.cancel(&seeker, &request.id).unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert_eq!(h.engine.ledger().available(&seeker).unwrap(), 10000);
        assert_eq!(h.engine.ledger().balance(&seeker).unwrap(), 10000);
    }

    #[test]
    fn cancel_after_claim_conflicts() {
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        h.engine.claim_request(&referrer, &request.id).unwrap();

        assert!(matches!(
            h.engine.cancel(&seeker, &request.id),
            Err(ReferralError::Conflict(_))
        ));
    }

    #[test]
    fn expire_rejects_fresh_requests() {
        let h = harness();
        let seeker = seeker_with_balance(&h, 10000);
        let request = h
            .engine
            .create_request(new_request(seeker, OrgId::generate()))
            .unwrap();

        assert!(matches!(
            h.engine.expire(&request.id, Utc::now() - Duration::days(14)),
            Err(ReferralError::Validation(_))
        ));
    }

    #[test]
    fn expire_releases_hold_and_decrements_stats() {
        // Scenario: a pending request aged 15 days is expired; the ₹49
        // hold returns and the referrer's counter drops.
        let h = harness();
        let org = OrgId::generate();
        let seeker = seeker_with_balance(&h, 10000);
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let request = h.engine.create_request(new_request(seeker, org)).unwrap();
        assert_eq!(h.engine.stats().get(&referrer).unwrap().pending_count, 1);

        let mut aged = h.store.get_request(&request.id).unwrap().unwrap();
        aged.requested_at = Utc::now() - Duration::days(15);
        h.store.put_request(&aged).unwrap();

        let (expired, hold) = h
            .engine
            .expire(&request.id, Utc::now() - Duration::days(14))
            .unwrap();
        assert_eq!(expired.status, RequestStatus::Expired);
        assert_eq!(hold.unwrap().amount_paise, 4900);
        assert_eq!(h.engine.ledger().available(&seeker).unwrap(), 10000);
        assert_eq!(h.engine.stats().get(&referrer).unwrap().pending_count, 0);
    }
}
