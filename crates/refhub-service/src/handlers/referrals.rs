//! Referral request handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use refhub_core::{JobId, JobTarget, OrgId, ReferralRequest, RequestId};
use refhub_engine::{NewRequest, ProofSubmission};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Referral request response.
#[derive(Debug, Serialize)]
pub struct ReferralResponse {
    /// Request ID.
    pub id: String,
    /// The seeker who created it.
    pub seeker: String,
    /// Organization the referral is at.
    pub org: String,
    /// Current status.
    pub status: String,
    /// The targeted job.
    pub target: JobTarget,
    /// Resume URL.
    pub resume_url: String,
    /// Optional message to the referrer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Creation timestamp.
    pub requested_at: String,
    /// Assigned referrer, once claimed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// When proof was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_at: Option<String>,
    /// Seeker's verification verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl From<&ReferralRequest> for ReferralResponse {
    fn from(request: &ReferralRequest) -> Self {
        Self {
            id: request.id.to_string(),
            seeker: request.seeker.to_string(),
            org: request.org.to_string(),
            status: request.status.to_string(),
            target: request.target.clone(),
            resume_url: request.resume_url.clone(),
            message: request.message.clone(),
            requested_at: request.requested_at.to_rfc3339(),
            referrer: request.referrer.map(|r| r.to_string()),
            referred_at: request.referred_at.map(|t| t.to_rfc3339()),
            verified: request.verified,
        }
    }
}

/// Job target as submitted by the client. Exactly one shape must be
/// filled in: an internal `job_id`, or an external `company` + `title`.
#[derive(Debug, Deserialize)]
pub struct TargetBody {
    /// Internal job posting ID.
    pub job_id: Option<JobId>,
    /// External company name.
    pub company: Option<String>,
    /// External job title.
    pub title: Option<String>,
    /// External posting URL.
    pub url: Option<String>,
}

impl TargetBody {
    fn into_target(self) -> Result<JobTarget, ApiError> {
        match (self.job_id, self.company, self.title) {
            (Some(job), None, None) => Ok(JobTarget::Internal { job }),
            (None, Some(company), Some(title)) => Ok(JobTarget::External {
                company,
                title,
                url: self.url,
            }),
            _ => Err(ApiError::BadRequest(
                "target must be either an internal job_id or an external company and title"
                    .into(),
            )),
        }
    }
}

/// Create referral request body.
#[derive(Debug, Deserialize)]
pub struct CreateReferralBody {
    /// Organization the referral is at.
    pub org_id: OrgId,
    /// Resume URL to forward.
    pub resume_url: String,
    /// The targeted job.
    pub target: TargetBody,
    /// Optional message to the referrer.
    pub message: Option<String>,
}

/// Create a referral request.
pub async fn create_referral(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateReferralBody>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let target = body.target.into_target()?;
    let request = state.engine.create_request(NewRequest {
        seeker: auth.user_id,
        resume_url: body.resume_url,
        target,
        org: body.org_id,
        message: body.message,
    })?;
    Ok(Json(ReferralResponse::from(&request)))
}

/// List the caller's referral requests.
pub async fn list_referrals(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<ReferralResponse>>, ApiError> {
    let requests = state.engine.requests_by_seeker(&auth.user_id)?;
    Ok(Json(requests.iter().map(ReferralResponse::from).collect()))
}

/// Get a referral request by ID.
pub async fn get_referral(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<RequestId>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let request = state.engine.get_request(&id)?;
    Ok(Json(ReferralResponse::from(&request)))
}

/// Claim a pending referral request.
pub async fn claim_referral(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<RequestId>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let claimed = state.engine.claim_request(&auth.user_id, &id)?;
    Ok(Json(ReferralResponse::from(&claimed)))
}

/// Proof submission body. With `claim: true` the request is claimed and
/// completed in one step (the fused path); otherwise the caller must be
/// the assigned referrer on a claimed request.
#[derive(Debug, Deserialize)]
pub struct ProofBody {
    /// URL of the uploaded evidence.
    pub file_url: String,
    /// MIME type or short kind tag.
    pub file_type: String,
    /// Optional note from the referrer.
    pub description: Option<String>,
    /// Fuse claim + proof into one transition.
    #[serde(default)]
    pub claim: bool,
}

/// Completion response.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    /// The request after completion.
    pub request: ReferralResponse,
    /// Payout credited to the referrer, in paise.
    pub payout_paise: i64,
    /// Points awarded by this completion.
    pub points_awarded: i64,
}

/// Submit proof of referral.
pub async fn submit_proof(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<RequestId>,
    Json(body): Json<ProofBody>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let submission = ProofSubmission {
        file_url: body.file_url,
        file_type: body.file_type,
        description: body.description,
    };
    let summary = if body.claim {
        state
            .engine
            .claim_with_proof(&auth.user_id, &id, submission)?
    } else {
        state.engine.submit_proof(&auth.user_id, &id, submission)?
    };
    Ok(Json(CompletionResponse {
        request: ReferralResponse::from(&summary.request),
        payout_paise: summary.payout_paise,
        points_awarded: summary.points_awarded,
    }))
}

/// Verification body.
#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    /// The seeker's verdict.
    pub verified: bool,
}

/// Record the seeker's verification verdict.
pub async fn verify_referral(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<RequestId>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let updated = state.engine.verify(&auth.user_id, &id, body.verified)?;
    Ok(Json(ReferralResponse::from(&updated)))
}

/// Cancel a pending referral request.
pub async fn cancel_referral(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<RequestId>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let cancelled = state.engine.cancel(&auth.user_id, &id)?;
    Ok(Json(ReferralResponse::from(&cancelled)))
}
