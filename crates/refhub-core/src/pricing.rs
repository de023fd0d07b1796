//! Pricing configuration: tiers, setting keys, and compiled-in defaults.
//!
//! Operators can override individual values through persisted
//! [`PricingSetting`] rows; everything falls back to [`PricingDefaults`]
//! when the settings store is unreachable or a key is missing, so a
//! settings fetch failure never fails a pricing lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Organization classification determining referral cost and payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Default tier.
    Standard,

    /// Mid-tier organizations.
    Premium,

    /// Top-tier organizations.
    Elite,
}

impl Tier {
    /// Stable tag used in setting keys.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Elite => "elite",
        }
    }
}

/// Well-known setting keys.
pub mod setting_key {
    /// Referral fee charged to the seeker, per tier, in paise.
    pub const REFERRAL_COST: &str = "referral_cost";

    /// Monetary payout to the referrer on completion, per tier, in paise.
    pub const REFERRER_PAYOUT: &str = "referrer_payout";

    /// Points for submitting proof. Flat across tiers.
    pub const PROOF_POINTS: &str = "proof_points";

    /// Bonus points for completing within 24 hours. Flat across tiers.
    pub const QUICK_RESPONSE_POINTS: &str = "quick_response_points";

    /// Bonus points when the seeker verifies. Flat across tiers.
    pub const VERIFICATION_POINTS: &str = "verification_points";

    /// Wallet paise credited per point on conversion.
    pub const PAISE_PER_POINT: &str = "paise_per_point";

    /// Days before an open request is eligible for expiration.
    pub const EXPIRY_DAYS: &str = "expiry_days";
}

/// A persisted pricing override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSetting {
    /// Setting key, one of [`setting_key`].
    pub key: String,

    /// Tier scope; `None` for flat settings.
    pub tier: Option<Tier>,

    /// Numeric value (paise, points, or days depending on the key).
    pub value: i64,

    /// Inactive settings are ignored by lookups.
    pub active: bool,

    /// When the setting was last changed.
    pub updated_at: DateTime<Utc>,
}

impl PricingSetting {
    /// Lookup key combining setting name and tier scope.
    #[must_use]
    pub fn lookup_key(&self) -> String {
        lookup_key(&self.key, self.tier)
    }
}

/// Build the lookup key for a setting name and optional tier scope.
#[must_use]
pub fn lookup_key(key: &str, tier: Option<Tier>) -> String {
    match tier {
        Some(t) => format!("{key}:{}", t.tag()),
        None => key.to_string(),
    }
}

/// Compiled-in pricing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingDefaults {
    /// Referral fee per tier, in paise.
    pub referral_cost_paise: HashMap<Tier, i64>,

    /// Referrer payout per tier, in paise.
    pub referrer_payout_paise: HashMap<Tier, i64>,

    /// Points for submitting proof.
    pub proof_points: i64,

    /// Bonus points for completing within 24 hours.
    pub quick_response_points: i64,

    /// Bonus points when the seeker verifies.
    pub verification_points: i64,

    /// Paise credited per point on conversion (50 = ₹0.50).
    pub paise_per_point: i64,

    /// Days before an open request may be expired.
    pub expiry_days: i64,
}

impl Default for PricingDefaults {
    fn default() -> Self {
        let mut referral_cost_paise = HashMap::new();
        referral_cost_paise.insert(Tier::Standard, 4900); // ₹49
        referral_cost_paise.insert(Tier::Premium, 9900); // ₹99
        referral_cost_paise.insert(Tier::Elite, 19900); // ₹199

        let mut referrer_payout_paise = HashMap::new();
        referrer_payout_paise.insert(Tier::Standard, 2500); // ₹25
        referrer_payout_paise.insert(Tier::Premium, 5000); // ₹50
        referrer_payout_paise.insert(Tier::Elite, 10000); // ₹100

        Self {
            referral_cost_paise,
            referrer_payout_paise,
            proof_points: 15,
            quick_response_points: 10,
            verification_points: 25,
            paise_per_point: 50,
            expiry_days: 14,
        }
    }
}

impl PricingDefaults {
    /// Default referral fee for a tier, in paise.
    #[must_use]
    pub fn cost(&self, tier: Tier) -> i64 {
        self.referral_cost_paise.get(&tier).copied().unwrap_or(4900)
    }

    /// Default referrer payout for a tier, in paise.
    #[must_use]
    pub fn payout(&self, tier: Tier) -> i64 {
        self.referrer_payout_paise
            .get(&tier)
            .copied()
            .unwrap_or(2500)
    }

    /// Default value for a flat setting key, if it is one we know.
    #[must_use]
    pub fn flat(&self, key: &str) -> Option<i64> {
        match key {
            setting_key::PROOF_POINTS => Some(self.proof_points),
            setting_key::QUICK_RESPONSE_POINTS => Some(self.quick_response_points),
            setting_key::VERIFICATION_POINTS => Some(self.verification_points),
            setting_key::PAISE_PER_POINT => Some(self.paise_per_point),
            setting_key::EXPIRY_DAYS => Some(self.expiry_days),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_costs_by_tier() {
        let defaults = PricingDefaults::default();
        assert_eq!(defaults.cost(Tier::Standard), 4900);
        assert_eq!(defaults.cost(Tier::Premium), 9900);
        assert_eq!(defaults.cost(Tier::Elite), 19900);
    }

    #[test]
    fn default_payouts_by_tier() {
        let defaults = PricingDefaults::default();
        assert_eq!(defaults.payout(Tier::Standard), 2500);
        assert_eq!(defaults.payout(Tier::Elite), 10000);
    }

    #[test]
    fn flat_settings_known_keys() {
        let defaults = PricingDefaults::default();
        assert_eq!(defaults.flat(setting_key::PROOF_POINTS), Some(15));
        assert_eq!(defaults.flat(setting_key::PAISE_PER_POINT), Some(50));
        assert_eq!(defaults.flat("nonsense"), None);
    }

    #[test]
    fn lookup_key_scoping() {
        assert_eq!(
            lookup_key(setting_key::REFERRAL_COST, Some(Tier::Premium)),
            "referral_cost:premium"
        );
        assert_eq!(lookup_key(setting_key::EXPIRY_DAYS, None), "expiry_days");
    }
}
