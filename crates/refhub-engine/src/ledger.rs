//! Wallet ledger operations.
//!
//! Thin orchestration over the store's atomic wallet operations, mapping
//! storage errors into the domain taxonomy. The hold model: placing a
//! hold reserves funds against the available balance, releasing returns
//! them, finalizing converts the reservation into a permanent debit.

use std::sync::Arc;

use refhub_core::{
    Hold, ReferralError, Result, TransactionSource, UserId, Wallet, WalletTransaction,
};
use refhub_store::Store;

/// Per-user balance with an append-only transaction log.
pub struct WalletLedger {
    store: Arc<dyn Store>,
}

impl WalletLedger {
    /// Create a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Get the owner's wallet, creating an empty one if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Storage`] on storage failure.
    pub fn get_or_create_wallet(&self, owner: &UserId) -> Result<Wallet> {
        Ok(self.store.get_or_create_wallet(owner)?)
    }

    /// The owner's settled balance in paise. Zero for a missing wallet.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Storage`] on storage failure.
    pub fn balance(&self, owner: &UserId) -> Result<i64> {
        Ok(self.store.get_wallet(owner)?.map_or(0, |w| w.balance_paise))
    }

    /// The owner's available balance: settled balance minus active holds.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Storage`] on storage failure.
    pub fn available(&self, owner: &UserId) -> Result<i64> {
        let balance = self.balance(owner)?;
        let held: i64 = self
            .store
            .active_holds(owner)?
            .iter()
            .map(|h| h.amount_paise)
            .sum();
        Ok(balance - held)
    }

    /// Reserve funds against the owner's wallet.
    ///
    /// # Errors
    ///
    /// - [`ReferralError::InsufficientBalance`] when the available balance
    ///   cannot cover the amount; carries balance, required, and shortfall.
    /// - [`ReferralError::Conflict`] when the reference already has a hold.
    pub fn place_hold(
        &self,
        owner: &UserId,
        amount_paise: i64,
        reference: &str,
        reason: String,
    ) -> Result<Hold> {
        Ok(self.store.place_hold(owner, amount_paise, reference, reason)?)
    }

    /// Release an active hold. No-op (returns `None`) when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Storage`] on storage failure.
    pub fn release_hold(&self, reference: &str) -> Result<Option<Hold>> {
        Ok(self.store.release_hold(reference)?)
    }

    /// Convert an active hold into a permanent debit.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::NotFound`] when no active hold exists.
    pub fn finalize_hold(&self, reference: &str, description: String) -> Result<WalletTransaction> {
        Ok(self.store.finalize_hold(reference, description)?)
    }

    /// Direct debit with no reservation phase.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::InsufficientBalance`] when the available
    /// balance cannot cover the amount.
    pub fn debit(
        &self,
        owner: &UserId,
        amount_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Result<WalletTransaction> {
        Ok(self
            .store
            .debit_wallet(owner, amount_paise, source, description)?)
    }

    /// Atomic credit with a ledger entry. Creates the wallet if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Validation`] for a non-positive amount.
    pub fn credit_bonus(
        &self,
        owner: &UserId,
        amount_paise: i64,
        source: TransactionSource,
        description: String,
    ) -> Result<WalletTransaction> {
        Ok(self
            .store
            .credit_wallet(owner, amount_paise, source, description)?)
    }

    /// Credit a verified recharge amount from the payment gateway.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Validation`] for a non-positive amount.
    pub fn recharge(
        &self,
        owner: &UserId,
        amount_paise: i64,
        gateway_reference: &str,
    ) -> Result<WalletTransaction> {
        if amount_paise <= 0 {
            return Err(ReferralError::Validation(format!(
                "recharge amount must be positive, got {amount_paise}"
            )));
        }
        self.credit_bonus(
            owner,
            amount_paise,
            TransactionSource::Recharge,
            format!("Wallet recharge ({gateway_reference})"),
        )
    }

    /// The owner's active holds.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Storage`] on storage failure.
    pub fn active_holds(&self, owner: &UserId) -> Result<Vec<Hold>> {
        Ok(self.store.active_holds(owner)?)
    }

    /// Ledger entries for the owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::Storage`] on storage failure.
    pub fn transactions(
        &self,
        owner: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WalletTransaction>> {
        Ok(self.store.list_transactions(owner, limit, offset)?)
    }
}
