//! Referral request, proof, and status-history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, OrgId, RequestId, UserId};

/// Status of a referral request.
///
/// Legal transitions:
///
/// ```text
/// Pending   -> Claimed   (claim)
/// Pending   -> Completed (fused claim + proof)
/// Pending   -> Cancelled (seeker)
/// Pending   -> Expired   (sweeper)
/// Claimed   -> Completed (proof)
/// Claimed   -> Expired   (sweeper)
/// Completed -> Verified  (seeker)
/// Completed -> Expired   (sweeper, only if never verified)
/// ```
///
/// Verified, Expired, and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Open, waiting for a referrer to claim it.
    Pending,

    /// A referrer committed to it.
    Claimed,

    /// The referrer submitted proof of referral.
    Completed,

    /// The seeker confirmed the referral happened.
    Verified,

    /// Timed out by the sweeper.
    Expired,

    /// Withdrawn by the seeker.
    Cancelled,
}

impl RequestStatus {
    /// Whether the status is final. No transition leaves a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Expired | Self::Cancelled)
    }

    /// Whether a request in this status still counts as open work for
    /// referrers (drives the pending-count stats).
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::Pending | Self::Claimed)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Completed => "completed",
            Self::Verified => "verified",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The job a seeker wants to be referred to.
///
/// Exactly one of the two shapes; a request can never carry both an internal
/// posting and an external descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum JobTarget {
    /// A job posting listed on the platform.
    Internal {
        /// The internal job posting id.
        job: JobId,
    },

    /// A job the seeker found elsewhere.
    External {
        /// Company name as entered by the seeker.
        company: String,
        /// Job title as entered by the seeker.
        title: String,
        /// Optional link to the posting.
        url: Option<String>,
    },
}

impl JobTarget {
    /// Stable identity used for duplicate-open-request detection.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        match self {
            Self::Internal { job } => format!("internal:{job}"),
            Self::External { company, title, .. } => {
                format!(
                    "external:{}:{}",
                    company.trim().to_lowercase(),
                    title.trim().to_lowercase()
                )
            }
        }
    }
}

/// A referral request created by a seeker.
///
/// Rows are never physically deleted; terminal states are final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralRequest {
    /// Unique request id (ULID, time-ordered).
    pub id: RequestId,

    /// The job seeker who created the request.
    pub seeker: UserId,

    /// URL of the resume to forward.
    pub resume_url: String,

    /// The targeted job.
    pub target: JobTarget,

    /// Organization the referral is at.
    pub org: OrgId,

    /// Current status.
    pub status: RequestStatus,

    /// Optional message from the seeker to the referrer.
    pub message: Option<String>,

    /// When the request was created.
    pub requested_at: DateTime<Utc>,

    /// The referrer who claimed it, once claimed.
    pub referrer: Option<UserId>,

    /// When proof was submitted, once completed.
    pub referred_at: Option<DateTime<Utc>>,

    /// Seeker's verification verdict, once given.
    pub verified: Option<bool>,
}

impl ReferralRequest {
    /// Create a new pending request.
    #[must_use]
    pub fn new(
        seeker: UserId,
        resume_url: String,
        target: JobTarget,
        org: OrgId,
        message: Option<String>,
    ) -> Self {
        Self {
            id: RequestId::generate(),
            seeker,
            resume_url,
            target,
            org,
            status: RequestStatus::Pending,
            message,
            requested_at: Utc::now(),
            referrer: None,
            referred_at: None,
            verified: None,
        }
    }

    /// Whether the request is past the given age threshold and in a state
    /// the sweeper may expire: Pending, Claimed, or Completed without a
    /// positive verification. A negative verdict does not pin a request in
    /// Completed; only Verified (and the other terminal states) are final.
    #[must_use]
    pub fn is_expirable(&self, cutoff: DateTime<Utc>) -> bool {
        if self.requested_at > cutoff {
            return false;
        }
        match self.status {
            RequestStatus::Pending | RequestStatus::Claimed => true,
            RequestStatus::Completed => self.verified != Some(true),
            _ => false,
        }
    }
}

/// Who drove a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Actor {
    /// A user (seeker or referrer).
    User(UserId),

    /// The system, e.g. the expiration sweeper.
    System,
}

/// An immutable status-history entry, appended with every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    /// The request that transitioned.
    pub request: RequestId,

    /// Status before.
    pub from: RequestStatus,

    /// Status after.
    pub to: RequestStatus,

    /// Who drove the transition.
    pub actor: Actor,

    /// When it happened.
    pub at: DateTime<Utc>,
}

/// Proof that a referral was made, submitted by the referrer.
///
/// Unique per (request, referrer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralProof {
    /// The request the proof belongs to.
    pub request: RequestId,

    /// The referrer who submitted it.
    pub referrer: UserId,

    /// URL of the uploaded evidence.
    pub file_url: String,

    /// MIME type or short kind tag of the evidence.
    pub file_type: String,

    /// Optional note from the referrer.
    pub description: Option<String>,

    /// When the proof was submitted.
    pub submitted_at: DateTime<Utc>,
}
