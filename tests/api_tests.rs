//! Integration tests for the REST API.
//!
//! These tests run against the axum router directly, backed by an in-memory
//! ledger. Plans returned by the API are submitted through the shared client
//! to move bounties between states.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use githoney_escrow::api::{AppState, build_router, status_for};
use githoney_escrow::config::ClientConfig;
use githoney_escrow::sdk::{
    AssetBag, BountyClient, BountyError, BountyRecord, InMemoryLedger, LedgerError, SettingsRecord,
    TxPlan, UtxoRef, Wallet,
};
use githoney_escrow::{generate_script_hash, generate_wallet};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const NOW: u64 = 1_700_000_000_000;
const HOUR: u64 = 60 * 60 * 1000;

// ─── Test helpers ───────────────────────────────────────────

struct TestEnv {
    state: AppState<InMemoryLedger>,
    bounty: UtxoRef,
    admin: Wallet,
    funder: Wallet,
}

/// Ledger with 5% settings, one open bounty and a funded wallet.
async fn test_env() -> TestEnv {
    let ledger = InMemoryLedger::new(NOW);
    let settings = SettingsRecord {
        githoney_address: generate_wallet(),
        creation_fee: 2_000_000,
        reward_fee: 500,
    };
    let script = generate_script_hash();
    let settings_ref = ledger.deploy_settings(&settings, &script).await.unwrap();
    let admin = generate_wallet();
    let record = BountyRecord::open(
        &settings,
        admin.clone(),
        generate_wallet(),
        NOW + HOUR,
        AssetBag::lovelace(1_000),
    );
    let bounty = ledger
        .lock_bounty(&script, &record, AssetBag::lovelace(1_000))
        .await
        .unwrap();
    let funder = generate_wallet();
    ledger.fund_wallet(&funder, AssetBag::lovelace(5_000)).await;

    let client = BountyClient::new(ledger, settings_ref, ClientConfig::default());
    TestEnv {
        state: AppState {
            client: Arc::new(client),
        },
        bounty,
        admin,
        funder,
    }
}

impl TestEnv {
    fn app(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Submit a plan returned by the API as `signer`; returns output 0.
    async fn submit(&self, signer: &Wallet, plan: &Value) -> UtxoRef {
        let plan: TxPlan = serde_json::from_value(plan.clone()).unwrap();
        let ledger = self.state.client.ledger();
        ledger.select_wallet(signer).await;
        let tx = self.state.client.submit(&plan).await.unwrap();
        UtxoRef::new(tx, 0)
    }
}

fn bounty_uri(r: &UtxoRef, action: &str) -> String {
    let base = format!("/bounty/{}/{}", r.tx_id, r.index);
    if action.is_empty() {
        base
    } else {
        format!("{base}/{action}")
    }
}

/// Send a POST request with JSON body, return (status, parsed JSON).
async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Send a GET request, return (status, parsed JSON).
async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn assign(env: &TestEnv, bounty: &UtxoRef, contributor: &Wallet) -> UtxoRef {
    let body = json!({ "contributor": contributor }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(bounty, "assign"), &body).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    env.submit(contributor, &json["plan"]).await
}

async fn merge(env: &TestEnv, bounty: &UtxoRef) -> UtxoRef {
    let (status, json) = post_json(env.app(), &bounty_uri(bounty, "merge"), "{}").await;
    assert_eq!(status, StatusCode::OK, "{json}");
    env.submit(&env.admin, &json["plan"]).await
}

// ─── Read endpoints ────────────────────────────────────────

#[tokio::test]
async fn get_settings() {
    let env = test_env().await;
    let (status, json) = get_json(env.app(), "/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["record"]["reward_fee"], 500);
    assert!(json["script"].is_string());
}

#[tokio::test]
async fn get_open_bounty() {
    let env = test_env().await;
    let (status, json) = get_json(env.app(), &bounty_uri(&env.bounty, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "open");
    assert_eq!(json["record"]["contributor"], Value::Null);
    assert_eq!(json["value"][0]["amount"], "1000");
    assert_eq!(json["utxo_ref"], env.bounty.to_string());
}

#[tokio::test]
async fn get_nonexistent() {
    let env = test_env().await;
    let uri = format!("/bounty/{}/0", "ab".repeat(32));
    let (status, json) = get_json(env.app(), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
}

#[tokio::test]
async fn get_bad_tx_id() {
    let env = test_env().await;
    let (status, json) = get_json(env.app(), "/bounty/not-hex/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "bad_request");
}

// ─── Rewards ───────────────────────────────────────────────

#[tokio::test]
async fn rewards_plan() {
    let env = test_env().await;
    let body = json!({ "funder": env.funder, "rewards": AssetBag::lovelace(50) }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&env.bounty, "rewards"), &body).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["outcome"]["redeemer"]["action"], "add_rewards");
    assert_eq!(json["outcome"]["continuing"][0]["amount"], "1050");
    assert_eq!(json["plan"]["validity"]["valid_to"], NOW + HOUR);

    let funded = env.submit(&env.funder, &json["plan"]).await;
    let (_, json) = get_json(env.app(), &bounty_uri(&funded, "")).await;
    assert_eq!(json["value"][0]["amount"], "1050");
}

#[tokio::test]
async fn rewards_empty_bag() {
    let env = test_env().await;
    let body = json!({ "funder": env.funder, "rewards": [] }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&env.bounty, "rewards"), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "bad_request");
}

#[tokio::test]
async fn rewards_after_deadline() {
    let env = test_env().await;
    env.state.client.ledger().set_time(NOW + 2 * HOUR).await;
    let body = json!({ "funder": env.funder, "rewards": AssetBag::lovelace(1) }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&env.bounty, "rewards"), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "deadline_passed");
}

#[tokio::test]
async fn rewards_insufficient_funds() {
    let env = test_env().await;
    let body =
        json!({ "funder": env.funder, "rewards": AssetBag::lovelace(5_001) }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&env.bounty, "rewards"), &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "insufficient_funds");
}

#[tokio::test]
async fn rewards_unknown_field_rejected() {
    let env = test_env().await;
    let body = json!({
        "funder": env.funder,
        "rewards": AssetBag::lovelace(1),
        "badge": true,
    })
    .to_string();
    let (status, _) = post_json(env.app(), &bounty_uri(&env.bounty, "rewards"), &body).await;
    assert!(status.is_client_error());
}

// ─── Assign / Merge / Close / Claim ────────────────────────

#[tokio::test]
async fn double_assign() {
    let env = test_env().await;
    let assigned = assign(&env, &env.bounty, &generate_wallet()).await;

    let body = json!({ "contributor": generate_wallet() }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&assigned, "assign"), &body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "contributor_already_assigned");
}

#[tokio::test]
async fn merge_unassigned() {
    let env = test_env().await;
    let (status, json) = post_json(env.app(), &bounty_uri(&env.bounty, "merge"), "{}").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "no_contributor_assigned");
}

#[tokio::test]
async fn merge_then_close_conflicts() {
    let env = test_env().await;
    let contributor = generate_wallet();
    let assigned = assign(&env, &env.bounty, &contributor).await;
    let payout = merge(&env, &assigned).await;

    let (_, json) = get_json(env.app(), &bounty_uri(&payout, "")).await;
    assert_eq!(json["state"], "merged");

    let (status, json) = post_json(env.app(), &bounty_uri(&payout, "close"), "{}").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "already_merged");
    assert_eq!(json["error"], "Bounty already merged");
}

#[tokio::test]
async fn close_open_bounty() {
    let env = test_env().await;
    let (status, json) = post_json(env.app(), &bounty_uri(&env.bounty, "close"), "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["redeemer"]["action"], "close");
    assert_eq!(json["outcome"]["continuing"], Value::Null);
    env.submit(&env.admin, &json["plan"]).await;

    let (status, json) = get_json(env.app(), &bounty_uri(&env.bounty, "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
}

#[tokio::test]
async fn claim_by_contributor() {
    let env = test_env().await;
    let contributor = generate_wallet();
    let assigned = assign(&env, &env.bounty, &contributor).await;
    let payout = merge(&env, &assigned).await;

    let body = json!({ "contributor": contributor }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&payout, "claim"), &body).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["outcome"]["payouts"][0]["value"][0]["amount"], "950");
}

#[tokio::test]
async fn claim_by_stranger() {
    let env = test_env().await;
    let assigned = assign(&env, &env.bounty, &generate_wallet()).await;
    let payout = merge(&env, &assigned).await;

    let body = json!({ "contributor": generate_wallet() }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&payout, "claim"), &body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["kind"], "not_authorized");
}

#[tokio::test]
async fn claim_before_merge() {
    let env = test_env().await;
    let contributor = generate_wallet();
    let assigned = assign(&env, &env.bounty, &contributor).await;

    let body = json!({ "contributor": contributor }).to_string();
    let (status, json) = post_json(env.app(), &bounty_uri(&assigned, "claim"), &body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "not_merged");
}

// ─── Status mapping ────────────────────────────────────────

#[test]
fn stale_ledger_state_is_conflict() {
    let spent = BountyError::Ledger(LedgerError::AlreadySpent(UtxoRef::new(
        githoney_escrow::sdk::TxId([0; 32]),
        0,
    )));
    assert_eq!(status_for(&spent), StatusCode::CONFLICT);
    let vanished = BountyError::Ledger(LedgerError::NotFound(UtxoRef::new(
        githoney_escrow::sdk::TxId([1; 32]),
        3,
    )));
    assert!(vanished.is_stale_state());
    assert_eq!(status_for(&vanished), StatusCode::CONFLICT);
    assert_eq!(
        status_for(&BountyError::Ledger(LedgerError::NoWallet)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_for(&BountyError::SettingsNotFound("gone".into())),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_for(&BountyError::Decode("bad".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
