//! Points reward ledger types.
//!
//! Points are a secondary reward currency earned by referrers, convertible
//! to wallet balance at a configured rate. Request-linked rewards are
//! unique per (referrer, request, kind) so that re-awarding is a no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RequestId, RewardId, UserId};

/// Why points were awarded (or deducted, for conversions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    /// Referrer submitted proof of referral.
    ProofSubmission,

    /// Seeker verified the completed referral.
    Verification,

    /// Proof submitted within 24 hours of the request being created.
    QuickResponseBonus,

    /// Points converted into wallet balance (negative points).
    Conversion,
}

impl RewardKind {
    /// Stable tag used in uniqueness keys.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::ProofSubmission => 1,
            Self::Verification => 2,
            Self::QuickResponseBonus => 3,
            Self::Conversion => 4,
        }
    }
}

/// A row in the points ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralReward {
    /// Unique reward id (ULID, time-ordered).
    pub id: RewardId,

    /// The referrer whose total changed.
    pub referrer: UserId,

    /// The request the award is tied to; `None` for conversions.
    pub request: Option<RequestId>,

    /// Signed points delta. Positive for awards, negative for conversions.
    pub points: i64,

    /// Why the points moved.
    pub kind: RewardKind,

    /// When the row was created.
    pub awarded_at: DateTime<Utc>,
}

impl ReferralReward {
    /// An award tied to a request.
    #[must_use]
    pub fn award(referrer: UserId, request: RequestId, points: i64, kind: RewardKind) -> Self {
        Self {
            id: RewardId::generate(),
            referrer,
            request: Some(request),
            points,
            kind,
            awarded_at: Utc::now(),
        }
    }

    /// A conversion row recording the deduction of the full total.
    #[must_use]
    pub fn conversion(referrer: UserId, points_converted: i64) -> Self {
        Self {
            id: RewardId::generate(),
            referrer,
            request: None,
            points: -points_converted,
            kind: RewardKind::Conversion,
            awarded_at: Utc::now(),
        }
    }
}
