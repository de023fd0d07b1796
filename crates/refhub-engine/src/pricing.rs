//! Tiered pricing resolution with a TTL cache.
//!
//! Settings live in the store as operator overrides; everything falls
//! back to [`PricingDefaults`] when a key is missing or the fetch fails.
//! A pricing lookup never fails the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use refhub_core::{lookup_key, setting_key, PricingDefaults, Tier};
use refhub_store::Store;

/// Time source, injectable so cache TTL is testable.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CachedSettings {
    fetched_at: DateTime<Utc>,
    values: HashMap<String, i64>,
}

/// Resolves costs, payouts, and point schedules.
pub struct PricingResolver {
    store: Arc<dyn Store>,
    defaults: PricingDefaults,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<CachedSettings>>,
}

impl PricingResolver {
    /// Default cache TTL: five minutes.
    pub const DEFAULT_TTL_SECS: i64 = 300;

    /// Create a resolver with the default TTL and wall clock.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), Self::DEFAULT_TTL_SECS)
    }

    /// Create a resolver with an explicit clock and TTL in seconds.
    #[must_use]
    pub fn with_clock(store: Arc<dyn Store>, clock: Arc<dyn Clock>, ttl_secs: i64) -> Self {
        Self {
            store,
            defaults: PricingDefaults::default(),
            ttl: Duration::seconds(ttl_secs),
            clock,
            cache: Mutex::new(None),
        }
    }

    /// Referral fee for a tier, in paise.
    #[must_use]
    pub fn cost(&self, tier: Tier) -> i64 {
        self.resolve(&lookup_key(setting_key::REFERRAL_COST, Some(tier)))
            .unwrap_or_else(|| self.defaults.cost(tier))
    }

    /// Referrer payout for a tier, in paise.
    #[must_use]
    pub fn payout(&self, tier: Tier) -> i64 {
        self.resolve(&lookup_key(setting_key::REFERRER_PAYOUT, Some(tier)))
            .unwrap_or_else(|| self.defaults.payout(tier))
    }

    /// Value for a flat (tier-independent) setting key.
    #[must_use]
    pub fn setting(&self, key: &str) -> i64 {
        self.resolve(key)
            .or_else(|| self.defaults.flat(key))
            .unwrap_or(0)
    }

    /// Points for submitting proof.
    #[must_use]
    pub fn proof_points(&self) -> i64 {
        self.setting(setting_key::PROOF_POINTS)
    }

    /// Bonus points for completing within 24 hours.
    #[must_use]
    pub fn quick_response_points(&self) -> i64 {
        self.setting(setting_key::QUICK_RESPONSE_POINTS)
    }

    /// Bonus points when the seeker verifies.
    #[must_use]
    pub fn verification_points(&self) -> i64 {
        self.setting(setting_key::VERIFICATION_POINTS)
    }

    /// Wallet paise credited per point on conversion.
    #[must_use]
    pub fn paise_per_point(&self) -> i64 {
        self.setting(setting_key::PAISE_PER_POINT)
    }

    /// Days before an open request may be expired.
    #[must_use]
    pub fn expiry_days(&self) -> i64 {
        self.setting(setting_key::EXPIRY_DAYS)
    }

    /// Look a key up in the cached settings, refreshing if stale.
    fn resolve(&self, key: &str) -> Option<i64> {
        let now = self.clock.now();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        let stale = cache
            .as_ref()
            .map_or(true, |c| now - c.fetched_at >= self.ttl);
        if stale {
            match self.fetch() {
                Ok(values) => {
                    *cache = Some(CachedSettings {
                        fetched_at: now,
                        values,
                    });
                }
                // Keep serving the stale snapshot (or defaults) rather
                // than failing the caller.
                Err(err) => {
                    tracing::warn!(error = %err, "pricing settings fetch failed, using fallback");
                }
            }
        }

        cache.as_ref().and_then(|c| c.values.get(key).copied())
    }

    fn fetch(&self) -> refhub_store::Result<HashMap<String, i64>> {
        let settings = self.store.list_settings()?;
        Ok(settings
            .into_iter()
            .filter(|s| s.active)
            .map(|s| (s.lookup_key(), s.value))
            .collect())
    }
}
