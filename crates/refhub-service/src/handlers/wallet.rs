//! Wallet and ledger handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use refhub_core::{
    Hold, TransactionKind, TransactionSource, TransactionStatus, WalletTransaction,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Maximum rows to return.
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}

impl PageQuery {
    pub(crate) fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Active hold response.
#[derive(Debug, Serialize)]
pub struct HoldResponse {
    /// The referral request the hold belongs to.
    pub reference: String,
    /// Reserved amount in paise.
    pub amount_paise: i64,
    /// Why the hold was placed.
    pub reason: String,
    /// When it was placed.
    pub placed_at: String,
}

impl From<&Hold> for HoldResponse {
    fn from(hold: &Hold) -> Self {
        Self {
            reference: hold.reference.clone(),
            amount_paise: hold.amount_paise,
            reason: hold.reason.clone(),
            placed_at: hold.placed_at.to_rfc3339(),
        }
    }
}

/// Wallet response.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    /// Wallet owner.
    pub owner: String,
    /// Settled balance in paise.
    pub balance_paise: i64,
    /// Available balance (settled minus active holds), in paise.
    pub available_paise: i64,
    /// ISO currency code.
    pub currency: String,
    /// Active holds.
    pub holds: Vec<HoldResponse>,
}

/// Get the caller's wallet.
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<WalletResponse>, ApiError> {
    let ledger = state.engine.ledger();
    let wallet = ledger.get_or_create_wallet(&auth.user_id)?;
    let holds = ledger.active_holds(&auth.user_id)?;
    let held: i64 = holds.iter().map(|h| h.amount_paise).sum();

    Ok(Json(WalletResponse {
        owner: wallet.owner.to_string(),
        balance_paise: wallet.balance_paise,
        available_paise: wallet.balance_paise - held,
        currency: wallet.currency,
        holds: holds.iter().map(HoldResponse::from).collect(),
    }))
}

/// Ledger entry response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// credit or debit.
    pub kind: TransactionKind,
    /// Amount in paise.
    pub amount_paise: i64,
    /// Balance before, in paise.
    pub balance_before_paise: i64,
    /// Balance after, in paise.
    pub balance_after_paise: i64,
    /// Business source tag.
    pub source: TransactionSource,
    /// Optional external reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Human-readable description.
    pub description: String,
    /// Entry status.
    pub status: TransactionStatus,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<&WalletTransaction> for TransactionResponse {
    fn from(tx: &WalletTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            kind: tx.kind,
            amount_paise: tx.amount_paise,
            balance_before_paise: tx.balance_before_paise,
            balance_after_paise: tx.balance_after_paise,
            source: tx.source,
            reference: tx.reference.clone(),
            description: tx.description.clone(),
            status: tx.status,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List the caller's ledger entries, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let transactions =
        state
            .engine
            .ledger()
            .transactions(&auth.user_id, page.limit(), page.offset())?;
    Ok(Json(
        transactions.iter().map(TransactionResponse::from).collect(),
    ))
}

/// Recharge body: a verified amount from the payment gateway.
#[derive(Debug, Deserialize)]
pub struct RechargeBody {
    /// Verified amount in paise.
    pub amount_paise: i64,
    /// Gateway order reference.
    pub reference: String,
}

/// Credit a verified recharge into the caller's wallet.
pub async fn recharge(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RechargeBody>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = state
        .engine
        .ledger()
        .recharge(&auth.user_id, body.amount_paise, &body.reference)?;
    Ok(Json(TransactionResponse::from(&tx)))
}
