//! Keyed lock registry.
//!
//! Wallet mutations and request transitions are read-modify-write
//! sequences over `RocksDB`. Each sequence runs with the row's lock held so
//! two concurrent debits against one wallet can never both pass the
//! balance check, and two claims on one request serialize into a winner
//! and a loser.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// A registry of per-key mutexes.
///
/// Lock entries are created on first use and kept for the life of the
/// store; the set of hot keys is bounded by the set of active users.
pub(crate) struct LockRegistry<K> {
    inner: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> LockRegistry<K> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Get the mutex for a key, creating it if needed. Callers hold the
    /// returned guard for the duration of the read-modify-write.
    pub(crate) fn entry(&self, key: &K) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
