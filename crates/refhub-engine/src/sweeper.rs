//! Scheduled expiration of stale requests.
//!
//! The sweeper scans open requests oldest first and drives the engine's
//! expire path for each, independently: one bad row is recorded in the
//! run's error list and never halts the batch. After a batch it
//! recomputes stats for every affected organization, the reconciliation
//! backstop against incremental drift.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ulid::Ulid;

use refhub_core::{Result, SweepRun};
use refhub_store::Store;

use crate::engine::ReferralEngine;

/// Batch expiration of stale open requests.
pub struct ExpirationSweeper {
    engine: Arc<ReferralEngine>,
    store: Arc<dyn Store>,
}

impl ExpirationSweeper {
    /// Default age threshold in days.
    pub const DEFAULT_DAYS_OLD: i64 = 14;

    /// Default batch size.
    pub const DEFAULT_BATCH_SIZE: usize = 500;

    /// Create a sweeper driving the given engine.
    #[must_use]
    pub fn new(engine: Arc<ReferralEngine>, store: Arc<dyn Store>) -> Self {
        Self { engine, store }
    }

    /// Run one sweep: expire up to `batch_size` open requests older than
    /// `days_old` days, oldest first.
    ///
    /// Re-running over the same window is safe: already-Expired rows are
    /// excluded by the status filter. The run summary is persisted and
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error only when the eligibility scan itself fails;
    /// per-item failures are collected into the run's error list.
    pub fn run(&self, days_old: i64, batch_size: usize) -> Result<SweepRun> {
        let started_at = Utc::now();
        let cutoff = started_at - chrono::Duration::days(days_old);

        let eligible = self.store.list_expirable(cutoff, batch_size)?;
        let found = eligible.len();
        tracing::info!(days_old, batch_size, found, "expiration sweep started");

        let mut expired = 0;
        let mut holds_released = 0;
        let mut amount_released_paise = 0;
        let mut errors = Vec::new();
        let mut affected_orgs = HashSet::new();

        for request in eligible {
            match self.engine.expire(&request.id, cutoff) {
                Ok((_, hold)) => {
                    expired += 1;
                    if let Some(hold) = hold {
                        holds_released += 1;
                        amount_released_paise += hold.amount_paise;
                    }
                    affected_orgs.insert(request.org);
                }
                Err(err) => {
                    tracing::warn!(request = %request.id, error = %err, "sweep item failed");
                    errors.push(format!("{}: {err}", request.id));
                }
            }
        }

        for org in &affected_orgs {
            if let Err(err) = self.engine.stats().recompute(org) {
                tracing::warn!(%org, error = %err, "stats recompute failed after sweep");
            }
        }

        let run = SweepRun {
            id: Ulid::new(),
            started_at,
            finished_at: Utc::now(),
            days_old,
            batch_size,
            found,
            expired,
            holds_released,
            amount_released_paise,
            errors,
        };
        if let Err(err) = self.store.put_sweep_run(&run) {
            tracing::warn!(run = %run.id, error = %err, "failed to persist sweep run");
        }
        tracing::info!(
            run = %run.id,
            found,
            expired,
            holds_released,
            amount_released_paise,
            failures = run.errors.len(),
            "expiration sweep finished"
        );
        Ok(run)
    }

    /// Spawn the sweeper on a tokio interval, using the pricing-resolved
    /// expiry window for each run.
    ///
    /// Each tick runs the blocking sweep on the blocking thread pool.
    pub fn spawn(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let sweeper = Arc::clone(&self);
                let outcome = tokio::task::spawn_blocking(move || {
                    let days_old = sweeper.engine.pricing().expiry_days();
                    sweeper.run(days_old, Self::DEFAULT_BATCH_SIZE)
                })
                .await;
                match outcome {
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => tracing::error!(error = %err, "scheduled sweep failed"),
                    Err(err) => tracing::error!(error = %err, "scheduled sweep panicked"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{EmploymentDirectory, StaticDirectory};
    use crate::engine::NewRequest;
    use crate::notify::LogNotifier;
    use chrono::Duration as ChronoDuration;
    use refhub_core::{JobTarget, OrgId, RequestStatus, TransactionSource, UserId};
    use refhub_store::RocksStore;
    use tempfile::TempDir;

    struct Harness {
        sweeper: ExpirationSweeper,
        engine: Arc<ReferralEngine>,
        store: Arc<RocksStore>,
        directory: Arc<StaticDirectory>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let directory = Arc::new(StaticDirectory::new());
        let engine = Arc::new(ReferralEngine::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&directory) as Arc<dyn EmploymentDirectory>,
            Arc::new(LogNotifier),
        ));
        let sweeper = ExpirationSweeper::new(
            Arc::clone(&engine),
            Arc::clone(&store) as Arc<dyn Store>,
        );
        Harness {
            sweeper,
            engine,
            store,
            directory,
            _dir: dir,
        }
    }

    fn aged_pending_request(h: &Harness, org: OrgId, days: i64) -> refhub_core::ReferralRequest {
        let seeker = UserId::generate();
        h.engine
            .ledger()
            .credit_bonus(&seeker, 10000, TransactionSource::Recharge, "seed".into())
            .unwrap();
        let request = h
            .engine
            .create_request(NewRequest {
                seeker,
                resume_url: "https://cdn.example/resume.pdf".into(),
                target: JobTarget::External {
                    company: format!("Acme {}", ulid::Ulid::new()),
                    title: "Engineer".into(),
                    url: None,
                },
                org,
                message: None,
            })
            .unwrap();

        let mut aged = h.store.get_request(&request.id).unwrap().unwrap();
        aged.requested_at = Utc::now() - ChronoDuration::days(days);
        h.store.put_request(&aged).unwrap();
        aged
    }

    #[test]
    fn sweep_expires_stale_rows_and_reports() {
        let h = harness();
        let org = OrgId::generate();
        let referrer = UserId::generate();
        h.directory.employ(referrer, org);

        let stale = aged_pending_request(&h, org, 15);
        let fresh = aged_pending_request(&h, org, 2);

        let run = h.sweeper.run(14, 100).unwrap();
        assert_eq!(run.found, 1);
        assert_eq!(run.expired, 1);
        assert_eq!(run.holds_released, 1);
        assert_eq!(run.amount_released_paise, 4900);
        assert!(run.errors.is_empty());

        let stale = h.store.get_request(&stale.id).unwrap().unwrap();
        assert_eq!(stale.status, RequestStatus::Expired);
        let fresh = h.store.get_request(&fresh.id).unwrap().unwrap();
        assert_eq!(fresh.status, RequestStatus::Pending);

        // Recompute ran for the affected org: one open request remains.
        assert_eq!(h.engine.stats().get(&referrer).unwrap().pending_count, 1);

        // The run log was persisted.
        let runs = h.store.list_sweep_runs(10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].expired, 1);
    }

    #[test]
    fn non_default_windows_expire_what_they_select() {
        let h = harness();
        let org = OrgId::generate();
        let aged = aged_pending_request(&h, org, 10);

        // A window wider than the row's age selects nothing.
        let wide = h.sweeper.run(30, 100).unwrap();
        assert_eq!(wide.found, 0);
        assert_eq!(wide.expired, 0);

        // A narrower window selects the row and actually expires it.
        let narrow = h.sweeper.run(7, 100).unwrap();
        assert_eq!(narrow.found, 1);
        assert_eq!(narrow.expired, 1);
        assert!(narrow.errors.is_empty());

        let row = h.store.get_request(&aged.id).unwrap().unwrap();
        assert_eq!(row.status, RequestStatus::Expired);
    }

    #[test]
    fn second_sweep_over_same_window_finds_nothing() {
        let h = harness();
        let org = OrgId::generate();
        aged_pending_request(&h, org, 20);

        let first = h.sweeper.run(14, 100).unwrap();
        assert_eq!(first.expired, 1);

        let second = h.sweeper.run(14, 100).unwrap();
        assert_eq!(second.found, 0);
        assert_eq!(second.expired, 0);
    }

    #[test]
    fn batch_size_caps_the_sweep() {
        let h = harness();
        let org = OrgId::generate();
        for _ in 0..3 {
            aged_pending_request(&h, org, 15);
        }

        let run = h.sweeper.run(14, 2).unwrap();
        assert_eq!(run.found, 2);
        assert_eq!(run.expired, 2);

        let rest = h.sweeper.run(14, 100).unwrap();
        assert_eq!(rest.expired, 1);
    }
}
