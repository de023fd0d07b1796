//! Wallet and ledger integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

use refhub_core::UserId;

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn get_wallet_without_auth_fails() {
    let harness = TestHarness::new();

    harness.server.get("/v1/wallet").await.assert_status_unauthorized();
}

#[tokio::test]
async fn get_wallet_creates_an_empty_wallet() {
    let harness = TestHarness::new();
    let user = UserId::generate();

    let response = harness
        .server
        .get("/v1/wallet")
        .add_header("authorization", TestHarness::auth_header(&user))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["owner"], user.to_string());
    assert_eq!(body["balance_paise"], 0);
    assert_eq!(body["available_paise"], 0);
    assert_eq!(body["currency"], "INR");
    assert!(body["holds"].as_array().unwrap().is_empty());
}

// ============================================================================
// Recharge
// ============================================================================

#[tokio::test]
async fn recharge_credits_the_balance() {
    let harness = TestHarness::new();
    let user = UserId::generate();

    let response = harness
        .server
        .post("/v1/wallet/recharge")
        .add_header("authorization", TestHarness::auth_header(&user))
        .json(&json!({"amount_paise": 9900, "reference": "order_123"}))
        .await;

    response.assert_status_ok();
    let tx: serde_json::Value = response.json();
    assert_eq!(tx["kind"], "credit");
    assert_eq!(tx["amount_paise"], 9900);
    assert_eq!(tx["balance_before_paise"], 0);
    assert_eq!(tx["balance_after_paise"], 9900);
    assert_eq!(tx["source"], "recharge");
    assert_eq!(tx["status"], "completed");
    assert!(tx["description"]
        .as_str()
        .unwrap()
        .contains("order_123"));

    let wallet: serde_json::Value = harness
        .server
        .get("/v1/wallet")
        .add_header("authorization", TestHarness::auth_header(&user))
        .await
        .json();
    assert_eq!(wallet["balance_paise"], 9900);
}

#[tokio::test]
async fn recharge_rejects_non_positive_amounts() {
    let harness = TestHarness::new();
    let user = UserId::generate();

    let response = harness
        .server
        .post("/v1/wallet/recharge")
        .add_header("authorization", TestHarness::auth_header(&user))
        .json(&json!({"amount_paise": 0, "reference": "order_123"}))
        .await;
    response.assert_status_bad_request();

    let response = harness
        .server
        .post("/v1/wallet/recharge")
        .add_header("authorization", TestHarness::auth_header(&user))
        .json(&json!({"amount_paise": -500, "reference": "order_123"}))
        .await;
    response.assert_status_bad_request();
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn transactions_list_newest_first() {
    let harness = TestHarness::new();
    let user = UserId::generate();

    harness.recharge(&user, 1000).await;
    harness.recharge(&user, 2000).await;
    harness.recharge(&user, 3000).await;

    let response = harness
        .server
        .get("/v1/wallet/transactions")
        .add_header("authorization", TestHarness::auth_header(&user))
        .await;

    response.assert_status_ok();
    let rows: serde_json::Value = response.json();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["amount_paise"], 3000);
    assert_eq!(rows[2]["amount_paise"], 1000);
}

#[tokio::test]
async fn transactions_honor_pagination() {
    let harness = TestHarness::new();
    let user = UserId::generate();

    for amount in [1000, 2000, 3000] {
        harness.recharge(&user, amount).await;
    }

    let response = harness
        .server
        .get("/v1/wallet/transactions?limit=1&offset=1")
        .add_header("authorization", TestHarness::auth_header(&user))
        .await;

    response.assert_status_ok();
    let rows: serde_json::Value = response.json();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["amount_paise"], 2000);
}

#[tokio::test]
async fn transactions_are_isolated_per_user() {
    let harness = TestHarness::new();
    let user = UserId::generate();
    let other = UserId::generate();

    harness.recharge(&user, 5000).await;

    let response = harness
        .server
        .get("/v1/wallet/transactions")
        .add_header("authorization", TestHarness::auth_header(&other))
        .await;

    response.assert_status_ok();
    let rows: serde_json::Value = response.json();
    assert!(rows.as_array().unwrap().is_empty());
}
