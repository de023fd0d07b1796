//! Key encoding utilities for `RocksDB`.
//!
//! Composite index keys are fixed-width id bytes concatenated in query
//! order, so prefix iteration walks one owner's rows in ULID (time) order.

use refhub_core::{OrgId, RequestId, RewardId, RewardKind, TransactionId, UserId};

/// Wallet key from the owner.
#[must_use]
pub fn wallet_key(owner: &UserId) -> Vec<u8> {
    owner.as_bytes().to_vec()
}

/// Wallet transaction key.
#[must_use]
pub fn wallet_tx_key(id: &TransactionId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Index key `owner (16) || transaction_id (16)`.
#[must_use]
pub fn owner_tx_key(owner: &UserId, id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(owner.as_bytes());
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Hold key from its reference (the request id string).
#[must_use]
pub fn hold_key(reference: &str) -> Vec<u8> {
    reference.as_bytes().to_vec()
}

/// Index key `owner (16) || reference`.
#[must_use]
pub fn owner_hold_key(owner: &UserId, reference: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + reference.len());
    key.extend_from_slice(owner.as_bytes());
    key.extend_from_slice(reference.as_bytes());
    key
}

/// Extract the hold reference from an `owner || reference` index key.
#[must_use]
pub fn hold_reference_from_owner_key(key: &[u8]) -> String {
    String::from_utf8_lossy(&key[16..]).into_owned()
}

/// Request key.
#[must_use]
pub fn request_key(id: &RequestId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Index key `org (16) || request_id (16)`.
#[must_use]
pub fn org_request_key(org: &OrgId, id: &RequestId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(org.as_bytes());
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Index key `seeker (16) || request_id (16)`.
#[must_use]
pub fn seeker_request_key(seeker: &UserId, id: &RequestId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(seeker.as_bytes());
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Extract the request id from a 32-byte `prefix || request_id` index key.
///
/// # Panics
///
/// Panics if the key is shorter than 32 bytes.
#[must_use]
pub fn request_id_from_index_key(key: &[u8]) -> RequestId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    RequestId::from_bytes(bytes)
}

/// Status history key `request_id (16) || entry_ulid (16)`.
#[must_use]
pub fn history_key(request: &RequestId, entry: &ulid::Ulid) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&request.to_bytes());
    key.extend_from_slice(&entry.to_bytes());
    key
}

/// Proof key `request_id (16) || referrer (16)`.
#[must_use]
pub fn proof_key(request: &RequestId, referrer: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&request.to_bytes());
    key.extend_from_slice(referrer.as_bytes());
    key
}

/// Reward key.
#[must_use]
pub fn reward_key(id: &RewardId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Index key `referrer (16) || reward_id (16)`.
#[must_use]
pub fn referrer_reward_key(referrer: &UserId, id: &RewardId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(referrer.as_bytes());
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Extract the reward id from a `referrer || reward_id` index key.
///
/// # Panics
///
/// Panics if the key is shorter than 32 bytes.
#[must_use]
pub fn reward_id_from_index_key(key: &[u8]) -> RewardId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    RewardId::from_bytes(bytes)
}

/// Uniqueness key `referrer (16) || request_id (16) || kind_tag (1)` for
/// request-linked rewards.
#[must_use]
pub fn reward_uniqueness_key(referrer: &UserId, request: &RequestId, kind: RewardKind) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.extend_from_slice(referrer.as_bytes());
    key.extend_from_slice(&request.to_bytes());
    key.push(kind.tag());
    key
}

/// Points total key from the referrer.
#[must_use]
pub fn points_key(referrer: &UserId) -> Vec<u8> {
    referrer.as_bytes().to_vec()
}

/// Stats key from the referrer.
#[must_use]
pub fn stats_key(referrer: &UserId) -> Vec<u8> {
    referrer.as_bytes().to_vec()
}

/// Setting key from its lookup key string.
#[must_use]
pub fn setting_key(lookup: &str) -> Vec<u8> {
    lookup.as_bytes().to_vec()
}

/// Sweep run key.
#[must_use]
pub fn sweep_run_key(id: &ulid::Ulid) -> Vec<u8> {
    id.to_bytes().to_vec()
}
