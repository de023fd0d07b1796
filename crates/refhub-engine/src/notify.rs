//! Notification seam.
//!
//! Delivery is best effort and fire-and-forget: no engine operation
//! blocks on, or fails because of, a notification.

use refhub_core::{RequestId, UserId};

/// A lifecycle event worth telling someone about.
#[derive(Debug, Clone)]
pub enum ReferralEvent {
    /// A seeker created a request.
    Created {
        /// The new request.
        request: RequestId,
        /// The seeker who created it.
        seeker: UserId,
    },

    /// A referrer claimed a request.
    Claimed {
        /// The claimed request.
        request: RequestId,
        /// The claiming referrer.
        referrer: UserId,
    },

    /// A referrer submitted proof; the request is completed.
    Completed {
        /// The completed request.
        request: RequestId,
        /// The referrer who completed it.
        referrer: UserId,
    },

    /// The seeker recorded a verification verdict.
    Verified {
        /// The verified request.
        request: RequestId,
        /// The verdict.
        verified: bool,
    },

    /// The seeker withdrew a request.
    Cancelled {
        /// The cancelled request.
        request: RequestId,
    },

    /// The sweeper expired a stale request.
    Expired {
        /// The expired request.
        request: RequestId,
    },
}

/// Best-effort event sink.
pub trait Notifier: Send + Sync {
    /// Publish an event. Implementations must not block or panic;
    /// failures stay inside the implementation.
    fn publish(&self, event: ReferralEvent);
}

/// A notifier that writes events to the tracing log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn publish(&self, event: ReferralEvent) {
        match event {
            ReferralEvent::Created { request, seeker } => {
                tracing::info!(%request, %seeker, "referral request created");
            }
            ReferralEvent::Claimed { request, referrer } => {
                tracing::info!(%request, %referrer, "referral request claimed");
            }
            ReferralEvent::Completed { request, referrer } => {
                tracing::info!(%request, %referrer, "referral request completed");
            }
            ReferralEvent::Verified { request, verified } => {
                tracing::info!(%request, verified, "referral request verification recorded");
            }
            ReferralEvent::Cancelled { request } => {
                tracing::info!(%request, "referral request cancelled");
            }
            ReferralEvent::Expired { request } => {
                tracing::info!(%request, "referral request expired");
            }
        }
    }
}
