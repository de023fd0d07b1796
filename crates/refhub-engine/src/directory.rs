//! Employment directory seam.
//!
//! Employment and eligibility facts live in an external organization
//! directory. The engine consults it at creation time (who to count in
//! stats) and again at claim time, because employment may have changed
//! between the two.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use refhub_core::{OrgId, Tier, UserId};

/// Source of employment and organization facts.
pub trait EmploymentDirectory: Send + Sync {
    /// Whether the user currently works at the organization and is open
    /// to refer.
    fn is_eligible_referrer(&self, user: &UserId, org: &OrgId) -> bool;

    /// All users currently eligible to refer at the organization.
    fn eligible_referrers(&self, org: &OrgId) -> Vec<UserId>;

    /// The organization's pricing tier.
    fn org_tier(&self, org: &OrgId) -> Tier;
}

/// In-memory directory backed by explicit employment records.
///
/// The production deployment wires a client for the real directory here;
/// this implementation serves tests and single-node setups.
#[derive(Default)]
pub struct StaticDirectory {
    inner: RwLock<DirectoryState>,
}

#[derive(Default)]
struct DirectoryState {
    employments: HashMap<OrgId, Vec<UserId>>,
    tiers: HashMap<OrgId, Tier>,
}

impl StaticDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a user works at an organization and is open to refer.
    pub fn employ(&self, user: UserId, org: OrgId) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let users = state.employments.entry(org).or_default();
        if !users.contains(&user) {
            users.push(user);
        }
    }

    /// Remove a user's employment record at an organization.
    pub fn terminate(&self, user: &UserId, org: &OrgId) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(users) = state.employments.get_mut(org) {
            users.retain(|u| u != user);
        }
    }

    /// Set an organization's pricing tier.
    pub fn set_tier(&self, org: OrgId, tier: Tier) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.tiers.insert(org, tier);
    }
}

impl EmploymentDirectory for StaticDirectory {
    fn is_eligible_referrer(&self, user: &UserId, org: &OrgId) -> bool {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state
            .employments
            .get(org)
            .is_some_and(|users| users.contains(user))
    }

    fn eligible_referrers(&self, org: &OrgId) -> Vec<UserId> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.employments.get(org).cloned().unwrap_or_default()
    }

    fn org_tier(&self, org: &OrgId) -> Tier {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.tiers.get(org).copied().unwrap_or(Tier::Standard)
    }
}
