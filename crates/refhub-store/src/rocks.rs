//! `RocksDB` storage implementation.
//!
//! Compound operations follow one shape: take the per-row locks, re-read
//! state under them, validate, then commit a single `WriteBatch`. The batch
//! is what makes a transition all-or-nothing; the locks are what make the
//! balance and status checks trustworthy.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use refhub_core::{
    Actor, Hold, OrgId, PricingSetting, ReferralProof, ReferralRequest, ReferralReward,
    ReferrerStats, RequestId, RequestStatus, StatusChange, SweepRun, TransactionSource, UserId,
    Wallet, WalletStatus, WalletTransaction,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::locks::LockRegistry;
use crate::schema::{all_column_families, cf};
use crate::{CompletionOutcome, CompletionSettlement, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    wallet_locks: LockRegistry<UserId>,
    request_locks: LockRegistry<RequestId>,
    points_locks: LockRegistry<UserId>,
    stats_locks: LockRegistry<UserId>,
}

fn hold_guard(lock: &Arc<Mutex<()>>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            wallet_locks: LockRegistry::new(),
            request_locks: LockRegistry::new(),
            points_locks: LockRegistry::new(),
            stats_locks: LockRegistry::new(),
        })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn decode<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_decoded<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::decode(&data))
            .transpose()
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Collect index keys under a 16-byte prefix.
    fn prefix_keys(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));

        let mut matched = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            matched.push(key.to_vec());
        }
        Ok(matched)
    }

    /// Sum of the owner's active holds, in paise.
    fn held_amount(&self, owner: &UserId) -> Result<i64> {
        Ok(self
            .active_holds(owner)?
            .iter()
            .map(|h| h.amount_paise)
            .sum())
    }

    fn require_wallet(&self, owner: &UserId) -> Result<Wallet> {
        self.get_wallet(owner)?.ok_or_else(|| StoreError::NotFound {
            entity: "wallet",
            id: owner.to_string(),
        })
    }

    fn check_active(wallet: &Wallet) -> Result<()> {
        if wallet.status == WalletStatus::Frozen {
            return Err(StoreError::WalletFrozen {
                owner: wallet.owner.to_string(),
            });
        }
        Ok(())
    }

    fn check_amount(amount_paise: i64) -> Result<()> {
        if amount_paise <= 0 {
            return Err(StoreError::InvalidAmount(amount_paise));
        }
        Ok(())
    }

    /// Stage a wallet write plus its ledger entry and owner index.
    fn stage_wallet_tx(
        &self,
        batch: &mut WriteBatch,
        wallet: &Wallet,
        tx: &WalletTransaction,
    ) -> Result<()> {
        let cf_wallets = self.cf(cf::WALLETS)?;
        let cf_txs = self.cf(cf::WALLET_TXS)?;
        let cf_by_owner = self.cf(cf::WALLET_TXS_BY_OWNER)?;

        batch.put_cf(
            &cf_wallets,
            keys::wallet_key(&wallet.owner),
            Self::encode(wallet)?,
        );
        batch.put_cf(&cf_txs, keys::wallet_tx_key(&tx.id), Self::encode(tx)?);
        batch.put_cf(&cf_by_owner, keys::owner_tx_key(&tx.owner, &tx.id), []);
        Ok(())
    }

    /// Stage deletion of a hold and its owner index.
    fn stage_hold_removal(&self, batch: &mut WriteBatch, hold: &Hold) -> Result<()> {
        let cf_holds = self.cf(cf::HOLDS)?;
        let cf_by_owner = self.cf(cf::HOLDS_BY_OWNER)?;
        batch.delete_cf(&cf_holds, keys::hold_key(&hold.reference));
        batch.delete_cf(
            &cf_by_owner,
            keys::owner_hold_key(&hold.owner, &hold.reference),
        );
        Ok(())
    }

    /// Stage a request row update plus a status-history entry.
    fn stage_transition(
        &self,
        batch: &mut WriteBatch,
        request: &ReferralRequest,
        change: &StatusChange,
    ) -> Result<()> {
        let cf_requests = self.cf(cf::REQUESTS)?;
        let cf_history = self.cf(cf::STATUS_HISTORY)?;
        batch.put_cf(
            &cf_requests,
            keys::request_key(&request.id),
            Self::encode(request)?,
        );
        batch.put_cf(
            &cf_history,
            keys::history_key(&request.id, &ulid::Ulid::new()),
            Self::encode(change)?,
        );
        Ok(())
    }

    fn require_request(&self, id: &RequestId) -> Result<ReferralRequest> {
        self.get_request(id)?.ok_or_else(|| StoreError::NotFound {
            entity: "referral request",
            id: id.to_string(),
        })
    }

    /// Stage the release of a hold: row removal plus a reversed audit
    /// entry. Caller holds the owner's wallet lock.
    fn stage_release(&self, batch: &mut WriteBatch, hold: &Hold) -> Result<()> {
        let balance = self
            .get_wallet(&hold.owner)?
            .map_or(0, |w| w.balance_paise);
        let audit = WalletTransaction::hold_released(
            hold.owner,
            hold.amount_paise,
            balance,
            hold.reference.clone(),
        );
        let cf_txs = self.cf(cf::WALLET_TXS)?;
        let cf_by_owner = self.cf(cf::WALLET_TXS_BY_OWNER)?;
        batch.put_cf(&cf_txs, keys::wallet_tx_key(&audit.id), Self::encode(&audit)?);
        batch.put_cf(&cf_by_owner, keys::owner_tx_key(&audit.owner, &audit.id), []);
        self.stage_hold_removal(batch, hold)?;
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Wallets and ledger
    // =========================================================================

    fn get_wallet(&self, owner: &UserId) -> Result<Option<Wallet>> {
        self.get_decoded(cf::WALLETS, &keys::wallet_key(owner))
    }

    fn get_or_create_wallet(&self, owner: &UserId) -> Result<Wallet> {
        let lock = self.wallet_locks.entry(owner);
        let _guard = hold_guard(&lock);

        if let Some(wallet) = self.get_wallet(owner)? {
            return Ok(wallet);
        }
        let wallet = Wallet::new(*owner);
        let cf = self.cf(cf::WALLETS)?;
        self.db
            .put_cf(&cf, keys::wallet_key(owner), Self::encode(&wallet)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(wallet)
    }

    fn credit_wallet(
        &self,
        owner: &UserId,
        amount_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Result<WalletTransaction> {
        Self::check_amount(amount_paise)?;

        let lock = self.wallet_locks.entry(owner);
        let _guard = hold_guard(&lock);

        let mut wallet = self.get_wallet(owner)?.unwrap_or_else(|| Wallet::new(*owner));
        Self::check_active(&wallet)?;

        let tx = WalletTransaction::credit(
            *owner,
            amount_paise,
            wallet.balance_paise,
            source,
            description,
        );
        wallet.balance_paise += amount_paise;
        wallet.updated_at = Utc::now();

        let mut batch = WriteBatch::default();
        self.stage_wallet_tx(&mut batch, &wallet, &tx)?;
        self.write(batch)?;
        Ok(tx)
    }

    fn debit_wallet(
        &self,
        owner: &UserId,
        amount_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Result<WalletTransaction> {
        Self::check_amount(amount_paise)?;

        let lock = self.wallet_locks.entry(owner);
        let _guard = hold_guard(&lock);

        let mut wallet = self.require_wallet(owner)?;
        Self::check_active(&wallet)?;

        let available = wallet.balance_paise - self.held_amount(owner)?;
        if available < amount_paise {
            return Err(StoreError::InsufficientFunds {
                available,
                required: amount_paise,
            });
        }

        let tx = WalletTransaction::debit(
            *owner,
            amount_paise,
            wallet.balance_paise,
            source,
            description,
        );
        wallet.balance_paise -= amount_paise;
        wallet.updated_at = Utc::now();

        let mut batch = WriteBatch::default();
        self.stage_wallet_tx(&mut batch, &wallet, &tx)?;
        self.write(batch)?;
        Ok(tx)
    }

    fn place_hold(
        &self,
        owner: &UserId,
        amount_paise: i64,
        reference: &str,
        reason: String,
    ) -> Result<Hold> {
        Self::check_amount(amount_paise)?;

        let lock = self.wallet_locks.entry(owner);
        let _guard = hold_guard(&lock);

        let wallet = self.require_wallet(owner)?;
        Self::check_active(&wallet)?;

        if self.get_hold(reference)?.is_some() {
            return Err(StoreError::DuplicateHold {
                reference: reference.to_string(),
            });
        }

        let available = wallet.balance_paise - self.held_amount(owner)?;
        if available < amount_paise {
            return Err(StoreError::InsufficientFunds {
                available,
                required: amount_paise,
            });
        }

        let hold = Hold {
            reference: reference.to_string(),
            owner: *owner,
            amount_paise,
            reason: reason.clone(),
            placed_at: Utc::now(),
        };
        let audit = WalletTransaction::hold_placed(
            *owner,
            amount_paise,
            wallet.balance_paise,
            reference.to_string(),
            reason,
        );

        let cf_holds = self.cf(cf::HOLDS)?;
        let cf_by_owner = self.cf(cf::HOLDS_BY_OWNER)?;
        let cf_txs = self.cf(cf::WALLET_TXS)?;
        let cf_txs_by_owner = self.cf(cf::WALLET_TXS_BY_OWNER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_holds, keys::hold_key(reference), Self::encode(&hold)?);
        batch.put_cf(&cf_by_owner, keys::owner_hold_key(owner, reference), []);
        batch.put_cf(&cf_txs, keys::wallet_tx_key(&audit.id), Self::encode(&audit)?);
        batch.put_cf(
            &cf_txs_by_owner,
            keys::owner_tx_key(&audit.owner, &audit.id),
            [],
        );
        self.write(batch)?;
        Ok(hold)
    }

    fn release_hold(&self, reference: &str) -> Result<Option<Hold>> {
        let Some(hold) = self.get_hold(reference)? else {
            return Ok(None);
        };

        let lock = self.wallet_locks.entry(&hold.owner);
        let _guard = hold_guard(&lock);

        // Re-read under the lock; another caller may have raced us here.
        let Some(hold) = self.get_hold(reference)? else {
            return Ok(None);
        };

        let mut batch = WriteBatch::default();
        self.stage_release(&mut batch, &hold)?;
        self.write(batch)?;
        Ok(Some(hold))
    }

    fn finalize_hold(&self, reference: &str, description: String) -> Result<WalletTransaction> {
        let hold = self.get_hold(reference)?.ok_or_else(|| StoreError::NotFound {
            entity: "hold",
            id: reference.to_string(),
        })?;

        let lock = self.wallet_locks.entry(&hold.owner);
        let _guard = hold_guard(&lock);

        let hold = self.get_hold(reference)?.ok_or_else(|| StoreError::NotFound {
            entity: "hold",
            id: reference.to_string(),
        })?;
        let mut wallet = self.require_wallet(&hold.owner)?;

        let tx = WalletTransaction::hold_finalized(
            hold.owner,
            hold.amount_paise,
            wallet.balance_paise,
            hold.reference.clone(),
            description,
        );
        wallet.balance_paise -= hold.amount_paise;
        wallet.updated_at = Utc::now();

        let mut batch = WriteBatch::default();
        self.stage_wallet_tx(&mut batch, &wallet, &tx)?;
        self.stage_hold_removal(&mut batch, &hold)?;
        self.write(batch)?;
        Ok(tx)
    }

    fn get_hold(&self, reference: &str) -> Result<Option<Hold>> {
        self.get_decoded(cf::HOLDS, &keys::hold_key(reference))
    }

    fn active_holds(&self, owner: &UserId) -> Result<Vec<Hold>> {
        let keys = self.prefix_keys(cf::HOLDS_BY_OWNER, owner.as_bytes())?;
        let mut holds = Vec::with_capacity(keys.len());
        for key in keys {
            let reference = keys::hold_reference_from_owner_key(&key);
            if let Some(hold) = self.get_hold(&reference)? {
                holds.push(hold);
            }
        }
        Ok(holds)
    }

    fn list_transactions(
        &self,
        owner: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WalletTransaction>> {
        let index_keys = self.prefix_keys(cf::WALLET_TXS_BY_OWNER, owner.as_bytes())?;

        // ULID suffixes sort oldest first; walk backwards for newest first.
        let mut transactions = Vec::new();
        for key in index_keys.iter().rev().skip(offset).take(limit) {
            let mut id_bytes = [0u8; 16];
            id_bytes.copy_from_slice(&key[16..32]);
            let id = refhub_core::TransactionId::from_bytes(id_bytes);
            if let Some(tx) = self.get_decoded(cf::WALLET_TXS, &keys::wallet_tx_key(&id))? {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }

    // =========================================================================
    // Referral requests
    // =========================================================================

    fn put_request(&self, request: &ReferralRequest) -> Result<()> {
        let cf_requests = self.cf(cf::REQUESTS)?;
        let cf_by_org = self.cf(cf::REQUESTS_BY_ORG)?;
        let cf_by_seeker = self.cf(cf::REQUESTS_BY_SEEKER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_requests,
            keys::request_key(&request.id),
            Self::encode(request)?,
        );
        batch.put_cf(
            &cf_by_org,
            keys::org_request_key(&request.org, &request.id),
            [],
        );
        batch.put_cf(
            &cf_by_seeker,
            keys::seeker_request_key(&request.seeker, &request.id),
            [],
        );
        self.write(batch)
    }

    fn get_request(&self, id: &RequestId) -> Result<Option<ReferralRequest>> {
        self.get_decoded(cf::REQUESTS, &keys::request_key(id))
    }

    fn find_open_duplicate(&self, seeker: &UserId, dedup_key: &str) -> Result<Option<RequestId>> {
        for request in self.list_requests_by_seeker(seeker)? {
            if !request.status.is_terminal() && request.target.dedup_key() == dedup_key {
                return Ok(Some(request.id));
            }
        }
        Ok(None)
    }

    fn claim_request(&self, id: &RequestId, referrer: &UserId) -> Result<ReferralRequest> {
        let lock = self.request_locks.entry(id);
        let _guard = hold_guard(&lock);

        let mut request = self.require_request(id)?;
        if request.status != RequestStatus::Pending {
            return Err(StoreError::StatusConflict {
                request: id.to_string(),
                current: request.status,
            });
        }

        let change = StatusChange {
            request: *id,
            from: request.status,
            to: RequestStatus::Claimed,
            actor: Actor::User(*referrer),
            at: Utc::now(),
        };
        request.status = RequestStatus::Claimed;
        request.referrer = Some(*referrer);

        let mut batch = WriteBatch::default();
        self.stage_transition(&mut batch, &request, &change)?;
        self.write(batch)?;
        Ok(request)
    }

    fn complete_request(
        &self,
        id: &RequestId,
        referrer: &UserId,
        proof: &ReferralProof,
        from: RequestStatus,
        settlement: &CompletionSettlement,
    ) -> Result<CompletionOutcome> {
        let req_lock = self.request_locks.entry(id);
        let _req_guard = hold_guard(&req_lock);

        let mut request = self.require_request(id)?;
        if request.status != from {
            return Err(StoreError::StatusConflict {
                request: id.to_string(),
                current: request.status,
            });
        }

        let cf_proofs = self.cf(cf::PROOFS)?;
        let proof_key = keys::proof_key(id, referrer);
        let exists = self
            .db
            .get_cf(&cf_proofs, &proof_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::DuplicateProof {
                request: id.to_string(),
            });
        }

        // Wallet locks in byte order; seeker and referrer are distinct.
        let seeker = request.seeker;
        let (first, second) = if seeker.as_bytes() <= referrer.as_bytes() {
            (seeker, *referrer)
        } else {
            (*referrer, seeker)
        };
        let lock_a = self.wallet_locks.entry(&first);
        let _guard_a = hold_guard(&lock_a);
        let lock_b = self.wallet_locks.entry(&second);
        let _guard_b = if first == second {
            None
        } else {
            Some(hold_guard(&lock_b))
        };

        let mut batch = WriteBatch::default();

        let change = StatusChange {
            request: *id,
            from,
            to: RequestStatus::Completed,
            actor: Actor::User(*referrer),
            at: Utc::now(),
        };
        request.status = RequestStatus::Completed;
        request.referrer = Some(*referrer);
        request.referred_at = Some(Utc::now());
        self.stage_transition(&mut batch, &request, &change)?;

        batch.put_cf(&cf_proofs, &proof_key, Self::encode(proof)?);

        // Finalize the seeker's hold into a permanent debit.
        let fee_tx = if let Some(hold) = self.get_hold(&id.to_string())? {
            let mut wallet = self.require_wallet(&hold.owner)?;
            let tx = WalletTransaction::hold_finalized(
                hold.owner,
                hold.amount_paise,
                wallet.balance_paise,
                hold.reference.clone(),
                settlement.fee_description.clone(),
            );
            wallet.balance_paise -= hold.amount_paise;
            wallet.updated_at = Utc::now();
            self.stage_wallet_tx(&mut batch, &wallet, &tx)?;
            self.stage_hold_removal(&mut batch, &hold)?;
            Some(tx)
        } else {
            None
        };

        // Payout from platform funds, independent of the seeker's debit.
        let payout_tx = if settlement.payout_paise > 0 {
            let mut wallet = self
                .get_wallet(referrer)?
                .unwrap_or_else(|| Wallet::new(*referrer));
            let mut tx = WalletTransaction::credit(
                *referrer,
                settlement.payout_paise,
                wallet.balance_paise,
                TransactionSource::ReferrerPayout,
                settlement.payout_description.clone(),
            );
            tx.reference = Some(id.to_string());
            wallet.balance_paise += settlement.payout_paise;
            wallet.updated_at = Utc::now();
            self.stage_wallet_tx(&mut batch, &wallet, &tx)?;
            Some(tx)
        } else {
            None
        };

        self.write(batch)?;
        Ok(CompletionOutcome {
            request,
            fee_tx,
            payout_tx,
        })
    }

    fn verify_request(
        &self,
        id: &RequestId,
        verified: bool,
        actor: Actor,
    ) -> Result<ReferralRequest> {
        let lock = self.request_locks.entry(id);
        let _guard = hold_guard(&lock);

        let mut request = self.require_request(id)?;
        if request.status != RequestStatus::Completed {
            return Err(StoreError::StatusConflict {
                request: id.to_string(),
                current: request.status,
            });
        }

        request.verified = Some(verified);
        let mut batch = WriteBatch::default();
        if verified {
            let change = StatusChange {
                request: *id,
                from: RequestStatus::Completed,
                to: RequestStatus::Verified,
                actor,
                at: Utc::now(),
            };
            request.status = RequestStatus::Verified;
            self.stage_transition(&mut batch, &request, &change)?;
        } else {
            let cf_requests = self.cf(cf::REQUESTS)?;
            batch.put_cf(&cf_requests, keys::request_key(id), Self::encode(&request)?);
        }
        self.write(batch)?;
        Ok(request)
    }

    fn cancel_request(
        &self,
        id: &RequestId,
        actor: Actor,
    ) -> Result<(ReferralRequest, Option<Hold>)> {
        let lock = self.request_locks.entry(id);
        let _guard = hold_guard(&lock);

        let mut request = self.require_request(id)?;
        if request.status != RequestStatus::Pending {
            return Err(StoreError::StatusConflict {
                request: id.to_string(),
                current: request.status,
            });
        }

        let change = StatusChange {
            request: *id,
            from: request.status,
            to: RequestStatus::Cancelled,
            actor,
            at: Utc::now(),
        };
        request.status = RequestStatus::Cancelled;

        let mut batch = WriteBatch::default();
        self.stage_transition(&mut batch, &request, &change)?;

        let hold = self.get_hold(&id.to_string())?;
        let wallet_lock = hold.as_ref().map(|h| self.wallet_locks.entry(&h.owner));
        let _wallet_guard = wallet_lock.as_ref().map(hold_guard);
        if let Some(hold) = &hold {
            self.stage_release(&mut batch, hold)?;
        }
        self.write(batch)?;
        Ok((request, hold))
    }

    fn expire_request(&self, id: &RequestId) -> Result<(ReferralRequest, Option<Hold>)> {
        let lock = self.request_locks.entry(id);
        let _guard = hold_guard(&lock);

        let mut request = self.require_request(id)?;
        let expirable = match request.status {
            RequestStatus::Pending | RequestStatus::Claimed => true,
            RequestStatus::Completed => request.verified != Some(true),
            _ => false,
        };
        if !expirable {
            return Err(StoreError::StatusConflict {
                request: id.to_string(),
                current: request.status,
            });
        }

        let change = StatusChange {
            request: *id,
            from: request.status,
            to: RequestStatus::Expired,
            actor: Actor::System,
            at: Utc::now(),
        };
        request.status = RequestStatus::Expired;

        let mut batch = WriteBatch::default();
        self.stage_transition(&mut batch, &request, &change)?;

        let hold = self.get_hold(&id.to_string())?;
        let wallet_lock = hold.as_ref().map(|h| self.wallet_locks.entry(&h.owner));
        let _wallet_guard = wallet_lock.as_ref().map(hold_guard);
        if let Some(hold) = &hold {
            self.stage_release(&mut batch, hold)?;
        }
        self.write(batch)?;
        Ok((request, hold))
    }

    fn list_expirable(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ReferralRequest>> {
        let cf = self.cf(cf::REQUESTS)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);

        // Keys are ULIDs, so iteration order is creation order.
        let mut eligible = Vec::new();
        for item in iter {
            if eligible.len() >= limit {
                break;
            }
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let request: ReferralRequest = Self::decode(&value)?;
            if request.is_expirable(cutoff) {
                eligible.push(request);
            }
        }
        Ok(eligible)
    }

    fn list_requests_by_org(&self, org: &OrgId) -> Result<Vec<ReferralRequest>> {
        let index_keys = self.prefix_keys(cf::REQUESTS_BY_ORG, org.as_bytes())?;
        let mut requests = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let id = keys::request_id_from_index_key(&key);
            if let Some(request) = self.get_request(&id)? {
                requests.push(request);
            }
        }
        Ok(requests)
    }

    fn list_requests_by_seeker(&self, seeker: &UserId) -> Result<Vec<ReferralRequest>> {
        let index_keys = self.prefix_keys(cf::REQUESTS_BY_SEEKER, seeker.as_bytes())?;
        let mut requests = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let id = keys::request_id_from_index_key(&key);
            if let Some(request) = self.get_request(&id)? {
                requests.push(request);
            }
        }
        Ok(requests)
    }

    fn status_history(&self, id: &RequestId) -> Result<Vec<StatusChange>> {
        let cf = self.cf(cf::STATUS_HISTORY)?;
        let prefix = id.to_bytes();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, rocksdb::Direction::Forward));

        let mut changes = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            changes.push(Self::decode(&value)?);
        }
        Ok(changes)
    }

    fn get_proof(&self, request: &RequestId, referrer: &UserId) -> Result<Option<ReferralProof>> {
        self.get_decoded(cf::PROOFS, &keys::proof_key(request, referrer))
    }

    // =========================================================================
    // Points rewards
    // =========================================================================

    fn insert_reward(&self, reward: &ReferralReward) -> Result<bool> {
        let lock = self.points_locks.entry(&reward.referrer);
        let _guard = hold_guard(&lock);

        let cf_rewards = self.cf(cf::REWARDS)?;
        let cf_by_referrer = self.cf(cf::REWARDS_BY_REFERRER)?;
        let cf_keys = self.cf(cf::REWARD_KEYS)?;
        let cf_totals = self.cf(cf::POINTS_TOTALS)?;

        let mut batch = WriteBatch::default();

        // Insert-or-ignore on the uniqueness key closes the check-then-act
        // race for request-linked rewards.
        if let Some(request) = &reward.request {
            let unique = keys::reward_uniqueness_key(&reward.referrer, request, reward.kind);
            let taken = self
                .db
                .get_cf(&cf_keys, &unique)
                .map_err(|e| StoreError::Database(e.to_string()))?
                .is_some();
            if taken {
                return Ok(false);
            }
            batch.put_cf(&cf_keys, &unique, reward.id.to_bytes());
        }

        let total = self.points_total(&reward.referrer)?;
        batch.put_cf(
            &cf_rewards,
            keys::reward_key(&reward.id),
            Self::encode(reward)?,
        );
        batch.put_cf(
            &cf_by_referrer,
            keys::referrer_reward_key(&reward.referrer, &reward.id),
            [],
        );
        batch.put_cf(
            &cf_totals,
            keys::points_key(&reward.referrer),
            Self::encode(&(total + reward.points))?,
        );
        self.write(batch)?;
        Ok(true)
    }

    fn points_total(&self, referrer: &UserId) -> Result<i64> {
        Ok(self
            .get_decoded::<i64>(cf::POINTS_TOTALS, &keys::points_key(referrer))?
            .unwrap_or(0))
    }

    fn list_rewards(
        &self,
        referrer: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferralReward>> {
        let index_keys = self.prefix_keys(cf::REWARDS_BY_REFERRER, referrer.as_bytes())?;
        let mut rewards = Vec::new();
        for key in index_keys.iter().rev().skip(offset).take(limit) {
            let id = keys::reward_id_from_index_key(key);
            if let Some(reward) = self.get_decoded(cf::REWARDS, &keys::reward_key(&id))? {
                rewards.push(reward);
            }
        }
        Ok(rewards)
    }

    fn convert_points(
        &self,
        referrer: &UserId,
        paise_per_point: i64,
    ) -> Result<Option<(i64, WalletTransaction)>> {
        let points_lock = self.points_locks.entry(referrer);
        let _points_guard = hold_guard(&points_lock);
        let wallet_lock = self.wallet_locks.entry(referrer);
        let _wallet_guard = hold_guard(&wallet_lock);

        let total = self.points_total(referrer)?;
        if total <= 0 {
            return Ok(None);
        }

        let mut wallet = self
            .get_wallet(referrer)?
            .unwrap_or_else(|| Wallet::new(*referrer));
        Self::check_active(&wallet)?;

        let amount_paise = total * paise_per_point;
        let tx = WalletTransaction::credit(
            *referrer,
            amount_paise,
            wallet.balance_paise,
            TransactionSource::PointsConversion,
            format!("Converted {total} points to wallet balance"),
        );
        wallet.balance_paise += amount_paise;
        wallet.updated_at = Utc::now();

        let conversion = ReferralReward::conversion(*referrer, total);

        let cf_rewards = self.cf(cf::REWARDS)?;
        let cf_by_referrer = self.cf(cf::REWARDS_BY_REFERRER)?;
        let cf_totals = self.cf(cf::POINTS_TOTALS)?;

        let mut batch = WriteBatch::default();
        self.stage_wallet_tx(&mut batch, &wallet, &tx)?;
        batch.put_cf(
            &cf_rewards,
            keys::reward_key(&conversion.id),
            Self::encode(&conversion)?,
        );
        batch.put_cf(
            &cf_by_referrer,
            keys::referrer_reward_key(referrer, &conversion.id),
            [],
        );
        batch.put_cf(&cf_totals, keys::points_key(referrer), Self::encode(&0i64)?);
        self.write(batch)?;
        Ok(Some((total, tx)))
    }

    // =========================================================================
    // Referrer stats
    // =========================================================================

    fn get_stats(&self, referrer: &UserId) -> Result<Option<ReferrerStats>> {
        self.get_decoded(cf::REFERRER_STATS, &keys::stats_key(referrer))
    }

    fn bump_stats(&self, referrer: &UserId, delta: i32) -> Result<ReferrerStats> {
        let lock = self.stats_locks.entry(referrer);
        let _guard = hold_guard(&lock);

        let mut stats = self
            .get_stats(referrer)?
            .unwrap_or_else(|| ReferrerStats::new(*referrer));
        stats.apply(delta);
        self.put_stats(&stats)?;
        Ok(stats)
    }

    fn put_stats(&self, stats: &ReferrerStats) -> Result<()> {
        let cf = self.cf(cf::REFERRER_STATS)?;
        self.db
            .put_cf(&cf, keys::stats_key(&stats.referrer), Self::encode(stats)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    // =========================================================================
    // Pricing settings
    // =========================================================================

    fn put_setting(&self, setting: &PricingSetting) -> Result<()> {
        let cf = self.cf(cf::SETTINGS)?;
        self.db
            .put_cf(
                &cf,
                keys::setting_key(&setting.lookup_key()),
                Self::encode(setting)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_settings(&self) -> Result<Vec<PricingSetting>> {
        let cf = self.cf(cf::SETTINGS)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        let mut settings = Vec::new();
        for item in iter {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            settings.push(Self::decode(&value)?);
        }
        Ok(settings)
    }

    // =========================================================================
    // Sweep runs
    // =========================================================================

    fn put_sweep_run(&self, run: &SweepRun) -> Result<()> {
        let cf = self.cf(cf::SWEEP_RUNS)?;
        self.db
            .put_cf(&cf, keys::sweep_run_key(&run.id), Self::encode(run)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_sweep_runs(&self, limit: usize) -> Result<Vec<SweepRun>> {
        let cf = self.cf(cf::SWEEP_RUNS)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::End);
        let mut runs = Vec::new();
        for item in iter.take(limit) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            runs.push(Self::decode(&value)?);
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use refhub_core::{JobTarget, RewardKind, TransactionStatus};
    use std::sync::Barrier;
    use tempfile::TempDir;

    fn create_test_store() -> (Arc<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (Arc::new(store), dir)
    }

    fn funded_wallet(store: &RocksStore, amount: i64) -> UserId {
        let owner = UserId::generate();
        store.get_or_create_wallet(&owner).unwrap();
        store
            .credit_wallet(&owner, amount, TransactionSource::Recharge, "seed".into())
            .unwrap();
        owner
    }

    fn pending_request(store: &RocksStore, seeker: UserId) -> ReferralRequest {
        let request = ReferralRequest::new(
            seeker,
            "https://cdn.example/resume.pdf".into(),
            JobTarget::External {
                company: "Acme".into(),
                title: "Engineer".into(),
                url: None,
            },
            OrgId::generate(),
            None,
        );
        store.put_request(&request).unwrap();
        request
    }

    fn proof_for(request: &ReferralRequest, referrer: UserId) -> ReferralProof {
        ReferralProof {
            request: request.id,
            referrer,
            file_url: "https://cdn.example/proof.png".into(),
            file_type: "image/png".into(),
            description: None,
            submitted_at: Utc::now(),
        }
    }

    fn settlement() -> CompletionSettlement {
        CompletionSettlement {
            fee_description: "Referral fee".into(),
            payout_paise: 2500,
            payout_description: "Referral payout".into(),
        }
    }

    #[test]
    fn credit_and_debit_track_balance() {
        let (store, _dir) = create_test_store();
        let owner = funded_wallet(&store, 10000);

        let tx = store
            .debit_wallet(&owner, 3000, TransactionSource::Adjustment, "test".into())
            .unwrap();
        assert_eq!(tx.balance_after_paise, 7000);

        let wallet = store.get_wallet(&owner).unwrap().unwrap();
        assert_eq!(wallet.balance_paise, 7000);
    }

    #[test]
    fn debit_rejects_insufficient_available() {
        let (store, _dir) = create_test_store();
        let owner = funded_wallet(&store, 5000);

        let result = store.debit_wallet(&owner, 6000, TransactionSource::Adjustment, "x".into());
        assert!(matches!(
            result,
            Err(StoreError::InsufficientFunds {
                available: 5000,
                required: 6000
            })
        ));
    }

    #[test]
    fn hold_reduces_available_not_balance() {
        let (store, _dir) = create_test_store();
        let owner = funded_wallet(&store, 10000);

        store
            .place_hold(&owner, 4900, "req-1", "Referral fee".into())
            .unwrap();

        let wallet = store.get_wallet(&owner).unwrap().unwrap();
        assert_eq!(wallet.balance_paise, 10000);

        // Only 5100 paise is available now.
        let result = store.debit_wallet(&owner, 5200, TransactionSource::Adjustment, "x".into());
        assert!(matches!(result, Err(StoreError::InsufficientFunds { .. })));
        store
            .debit_wallet(&owner, 5100, TransactionSource::Adjustment, "x".into())
            .unwrap();
    }

    #[test]
    fn hold_rejected_when_available_too_low() {
        let (store, _dir) = create_test_store();
        let owner = funded_wallet(&store, 3000);

        let result = store.place_hold(&owner, 4900, "req-1", "fee".into());
        assert!(matches!(
            result,
            Err(StoreError::InsufficientFunds {
                available: 3000,
                required: 4900
            })
        ));
        assert!(store.active_holds(&owner).unwrap().is_empty());
    }

    #[test]
    fn release_hold_is_noop_when_absent() {
        let (store, _dir) = create_test_store();
        assert!(store.release_hold("missing").unwrap().is_none());
    }

    #[test]
    fn finalize_hold_debits_balance() {
        let (store, _dir) = create_test_store();
        let owner = funded_wallet(&store, 10000);
        store
            .place_hold(&owner, 4900, "req-1", "fee".into())
            .unwrap();

        let tx = store.finalize_hold("req-1", "Referral fee".into()).unwrap();
        assert_eq!(tx.balance_after_paise, 5100);
        assert_eq!(tx.status, TransactionStatus::Completed);

        let wallet = store.get_wallet(&owner).unwrap().unwrap();
        assert_eq!(wallet.balance_paise, 5100);
        assert!(store.get_hold("req-1").unwrap().is_none());
    }

    #[test]
    fn ledger_balances_to_completed_entries() {
        let (store, _dir) = create_test_store();
        let owner = funded_wallet(&store, 10000);
        store
            .place_hold(&owner, 4900, "req-1", "fee".into())
            .unwrap();
        store.finalize_hold("req-1", "fee".into()).unwrap();
        store
            .place_hold(&owner, 1000, "req-2", "fee".into())
            .unwrap();
        store.release_hold("req-2").unwrap();
        store
            .credit_wallet(&owner, 500, TransactionSource::Bonus, "promo".into())
            .unwrap();

        let wallet = store.get_wallet(&owner).unwrap().unwrap();
        let history = store.list_transactions(&owner, 100, 0).unwrap();
        let settled: i64 = history.iter().map(WalletTransaction::settled_delta_paise).sum();
        assert_eq!(wallet.balance_paise, settled);
        assert_eq!(wallet.balance_paise, 5600);
    }

    #[test]
    fn concurrent_debits_never_overdraw() {
        let (store, _dir) = create_test_store();
        let owner = funded_wallet(&store, 5000);

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store.debit_wallet(&owner, 3000, TransactionSource::Adjustment, "race".into())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let wallet = store.get_wallet(&owner).unwrap().unwrap();
        assert_eq!(wallet.balance_paise, 2000);
    }

    #[test]
    fn claim_is_conditional_on_pending() {
        let (store, _dir) = create_test_store();
        let request = pending_request(&store, UserId::generate());
        let referrer = UserId::generate();

        let claimed = store.claim_request(&request.id, &referrer).unwrap();
        assert_eq!(claimed.status, RequestStatus::Claimed);
        assert_eq!(claimed.referrer, Some(referrer));

        let other = UserId::generate();
        let result = store.claim_request(&request.id, &other);
        assert!(matches!(
            result,
            Err(StoreError::StatusConflict {
                current: RequestStatus::Claimed,
                ..
            })
        ));
    }

    #[test]
    fn concurrent_claims_one_winner() {
        let (store, _dir) = create_test_store();
        let request = pending_request(&store, UserId::generate());

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let id = request.id;
                std::thread::spawn(move || {
                    let referrer = UserId::generate();
                    barrier.wait();
                    store.claim_request(&id, &referrer)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(StoreError::StatusConflict { .. }))));
    }

    #[test]
    fn complete_settles_fee_and_payout_atomically() {
        let (store, _dir) = create_test_store();
        let seeker = funded_wallet(&store, 10000);
        let request = pending_request(&store, seeker);
        store
            .place_hold(&seeker, 4900, &request.id.to_string(), "fee".into())
            .unwrap();

        let referrer = UserId::generate();
        let outcome = store
            .complete_request(
                &request.id,
                &referrer,
                &proof_for(&request, referrer),
                RequestStatus::Pending,
                &settlement(),
            )
            .unwrap();

        assert_eq!(outcome.request.status, RequestStatus::Completed);
        assert!(outcome.fee_tx.is_some());
        assert!(outcome.payout_tx.is_some());

        let seeker_wallet = store.get_wallet(&seeker).unwrap().unwrap();
        assert_eq!(seeker_wallet.balance_paise, 5100);
        let referrer_wallet = store.get_wallet(&referrer).unwrap().unwrap();
        assert_eq!(referrer_wallet.balance_paise, 2500);
        assert!(store.get_hold(&request.id.to_string()).unwrap().is_none());
        assert!(store.get_proof(&request.id, &referrer).unwrap().is_some());
    }

    #[test]
    fn complete_rejects_wrong_source_state() {
        let (store, _dir) = create_test_store();
        let request = pending_request(&store, UserId::generate());
        let referrer = UserId::generate();

        // Expecting Claimed but the row is Pending.
        let result = store.complete_request(
            &request.id,
            &referrer,
            &proof_for(&request, referrer),
            RequestStatus::Claimed,
            &settlement(),
        );
        assert!(matches!(result, Err(StoreError::StatusConflict { .. })));
    }

    #[test]
    fn cancel_releases_hold() {
        let (store, _dir) = create_test_store();
        let seeker = funded_wallet(&store, 10000);
        let request = pending_request(&store, seeker);
        store
            .place_hold(&seeker, 4900, &request.id.to_string(), "fee".into())
            .unwrap();

        let (cancelled, hold) = store
            .cancel_request(&request.id, Actor::User(seeker))
            .unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        assert_eq!(hold.unwrap().amount_paise, 4900);

        // Full amount is spendable again.
        store
            .debit_wallet(&seeker, 10000, TransactionSource::Adjustment, "all".into())
            .unwrap();
    }

    #[test]
    fn expire_from_terminal_is_conflict() {
        let (store, _dir) = create_test_store();
        let seeker = UserId::generate();
        let request = pending_request(&store, seeker);
        store
            .cancel_request(&request.id, Actor::User(seeker))
            .unwrap();

        let result = store.expire_request(&request.id);
        assert!(matches!(result, Err(StoreError::StatusConflict { .. })));
    }

    #[test]
    fn expire_allows_completed_with_negative_verdict() {
        let (store, _dir) = create_test_store();
        let seeker = UserId::generate();
        let mut request = pending_request(&store, seeker);
        request.status = RequestStatus::Completed;
        request.referrer = Some(UserId::generate());
        request.verified = Some(false);
        store.put_request(&request).unwrap();

        let (expired, hold) = store.expire_request(&request.id).unwrap();
        assert_eq!(expired.status, RequestStatus::Expired);
        assert!(hold.is_none());
    }

    #[test]
    fn list_expirable_filters_by_age_and_status() {
        let (store, _dir) = create_test_store();
        let seeker = UserId::generate();

        let mut old = pending_request(&store, seeker);
        old.requested_at = Utc::now() - Duration::days(15);
        store.put_request(&old).unwrap();

        let _fresh = pending_request(&store, seeker);

        let cutoff = Utc::now() - Duration::days(14);
        let eligible = store.list_expirable(cutoff, 100).unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, old.id);
    }

    #[test]
    fn status_history_records_transitions() {
        let (store, _dir) = create_test_store();
        let request = pending_request(&store, UserId::generate());
        let referrer = UserId::generate();

        store.claim_request(&request.id, &referrer).unwrap();
        store
            .complete_request(
                &request.id,
                &referrer,
                &proof_for(&request, referrer),
                RequestStatus::Claimed,
                &settlement(),
            )
            .unwrap();

        let history = store.status_history(&request.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to, RequestStatus::Claimed);
        assert_eq!(history[1].to, RequestStatus::Completed);
    }

    #[test]
    fn reward_insert_is_idempotent() {
        let (store, _dir) = create_test_store();
        let referrer = UserId::generate();
        let request = RequestId::generate();

        let first = ReferralReward::award(referrer, request, 15, RewardKind::ProofSubmission);
        assert!(store.insert_reward(&first).unwrap());

        let again = ReferralReward::award(referrer, request, 15, RewardKind::ProofSubmission);
        assert!(!store.insert_reward(&again).unwrap());

        assert_eq!(store.points_total(&referrer).unwrap(), 15);
        assert_eq!(store.list_rewards(&referrer, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn different_kinds_award_separately() {
        let (store, _dir) = create_test_store();
        let referrer = UserId::generate();
        let request = RequestId::generate();

        store
            .insert_reward(&ReferralReward::award(
                referrer,
                request,
                15,
                RewardKind::ProofSubmission,
            ))
            .unwrap();
        store
            .insert_reward(&ReferralReward::award(
                referrer,
                request,
                25,
                RewardKind::Verification,
            ))
            .unwrap();

        assert_eq!(store.points_total(&referrer).unwrap(), 40);
    }

    #[test]
    fn convert_points_credits_and_resets() {
        let (store, _dir) = create_test_store();
        let referrer = UserId::generate();
        store
            .insert_reward(&ReferralReward::award(
                referrer,
                RequestId::generate(),
                40,
                RewardKind::ProofSubmission,
            ))
            .unwrap();

        let (points, tx) = store.convert_points(&referrer, 50).unwrap().unwrap();
        assert_eq!(points, 40);
        assert_eq!(tx.amount_paise, 2000);

        assert_eq!(store.points_total(&referrer).unwrap(), 0);
        let wallet = store.get_wallet(&referrer).unwrap().unwrap();
        assert_eq!(wallet.balance_paise, 2000);

        // Nothing left to convert.
        assert!(store.convert_points(&referrer, 50).unwrap().is_none());
    }

    #[test]
    fn stats_bump_and_clamp() {
        let (store, _dir) = create_test_store();
        let referrer = UserId::generate();

        let stats = store.bump_stats(&referrer, 2).unwrap();
        assert_eq!(stats.pending_count, 2);
        let stats = store.bump_stats(&referrer, -5).unwrap();
        assert_eq!(stats.pending_count, 0);
    }

    #[test]
    fn settings_roundtrip() {
        let (store, _dir) = create_test_store();
        let setting = PricingSetting {
            key: refhub_core::setting_key::REFERRAL_COST.into(),
            tier: Some(refhub_core::Tier::Premium),
            value: 12900,
            active: true,
            updated_at: Utc::now(),
        };
        store.put_setting(&setting).unwrap();

        let settings = store.list_settings().unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].value, 12900);
    }

    #[test]
    fn find_open_duplicate_ignores_terminal_rows() {
        let (store, _dir) = create_test_store();
        let seeker = UserId::generate();
        let request = pending_request(&store, seeker);
        let key = request.target.dedup_key();

        assert_eq!(
            store.find_open_duplicate(&seeker, &key).unwrap(),
            Some(request.id)
        );

        store
            .cancel_request(&request.id, Actor::User(seeker))
            .unwrap();
        assert!(store.find_open_duplicate(&seeker, &key).unwrap().is_none());
    }
}
