//! REST API types and router for the bounty escrow SDK.
//!
//! Handlers build transaction plans only. Signing and submission belong to
//! the caller's wallet.

use crate::sdk::{
    AssetBag, BountyClient, BountyError, BountyRecord, BountyState, LedgerClient, LoadedSettings,
    PlannedTransition, TxId, UtxoRef, Wallet,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// ─── App State ───────────────────────────────────────────────

pub struct AppState<L> {
    pub client: Arc<BountyClient<L>>,
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

// ─── Request / Response DTOs ─────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RewardsReq {
    funder: Wallet,
    rewards: AssetBag,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AssignReq {
    contributor: Wallet,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ClaimReq {
    contributor: Wallet,
}

#[derive(Serialize)]
struct BountyResponse {
    utxo_ref: String,
    state: BountyState,
    record: BountyRecord,
    value: AssetBag,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

// ─── Error helpers ───────────────────────────────────────────

fn error_body(
    status: StatusCode,
    kind: &str,
    msg: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
            kind: kind.to_string(),
        }),
    )
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    error_body(StatusCode::BAD_REQUEST, "bad_request", msg)
}

/// HTTP status for a rejected transition.
pub fn status_for(err: &BountyError) -> StatusCode {
    match err {
        BountyError::NotFound(_) | BountyError::SettingsNotFound(_) => StatusCode::NOT_FOUND,
        BountyError::AlreadyMerged
        | BountyError::ContributorAlreadyAssigned
        | BountyError::NoContributorAssigned
        | BountyError::NotMerged => StatusCode::CONFLICT,
        BountyError::Ledger(_) if err.is_stale_state() => StatusCode::CONFLICT,
        BountyError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        BountyError::DeadlinePassed { .. }
        | BountyError::TooManyAssets { .. }
        | BountyError::InsufficientFunds { .. }
        | BountyError::InvalidFeeRate(_)
        | BountyError::InvalidTransaction(_) => StatusCode::BAD_REQUEST,
        BountyError::Decode(_)
        | BountyError::Encode(_)
        | BountyError::ValidatorNotFound
        | BountyError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rejected(err: BountyError) -> (StatusCode, Json<ErrorResponse>) {
    error_body(status_for(&err), err.kind(), err.to_string())
}

type ApiResult<T> = Result<(StatusCode, Json<T>), (StatusCode, Json<ErrorResponse>)>;

// ─── Helpers ─────────────────────────────────────────────────

fn parse_ref(tx_id: &str, index: u32) -> Result<UtxoRef, (StatusCode, Json<ErrorResponse>)> {
    let tx_id: TxId = tx_id
        .parse()
        .map_err(|e| bad_request(format!("invalid tx id: {e}")))?;
    Ok(UtxoRef::new(tx_id, index))
}

fn planned(result: Result<PlannedTransition, BountyError>) -> ApiResult<PlannedTransition> {
    result
        .map(|planned| (StatusCode::OK, Json(planned)))
        .map_err(rejected)
}

// ─── GET /settings ───────────────────────────────────────────

async fn get_settings<L: LedgerClient>(
    State(state): State<AppState<L>>,
) -> ApiResult<LoadedSettings> {
    let settings = state.client.load_settings().await.map_err(rejected)?;
    Ok((StatusCode::OK, Json(settings)))
}

// ─── GET /bounty/{tx_id}/{index} ─────────────────────────────

async fn get_bounty<L: LedgerClient>(
    State(state): State<AppState<L>>,
    Path((tx_id, index)): Path<(String, u32)>,
) -> ApiResult<BountyResponse> {
    let utxo_ref = parse_ref(&tx_id, index)?;
    let bounty = state.client.bounty(&utxo_ref).await.map_err(rejected)?;

    Ok((
        StatusCode::OK,
        Json(BountyResponse {
            utxo_ref: utxo_ref.to_string(),
            state: bounty.state(),
            value: bounty.value().clone(),
            record: bounty.record,
        }),
    ))
}

// ─── POST /bounty/{tx_id}/{index}/rewards ────────────────────

async fn add_rewards<L: LedgerClient>(
    State(state): State<AppState<L>>,
    Path((tx_id, index)): Path<(String, u32)>,
    Json(req): Json<RewardsReq>,
) -> ApiResult<PlannedTransition> {
    let utxo_ref = parse_ref(&tx_id, index)?;
    if req.rewards.is_empty() {
        return Err(bad_request("rewards must not be empty"));
    }
    info!(bounty = %utxo_ref, funder = %req.funder, rewards = %req.rewards, "add rewards requested");
    planned(
        state
            .client
            .add_rewards(&utxo_ref, &req.funder, &req.rewards)
            .await,
    )
}

// ─── POST /bounty/{tx_id}/{index}/assign ─────────────────────

async fn assign<L: LedgerClient>(
    State(state): State<AppState<L>>,
    Path((tx_id, index)): Path<(String, u32)>,
    Json(req): Json<AssignReq>,
) -> ApiResult<PlannedTransition> {
    let utxo_ref = parse_ref(&tx_id, index)?;
    planned(state.client.assign(&utxo_ref, &req.contributor).await)
}

// ─── POST /bounty/{tx_id}/{index}/merge ──────────────────────

async fn merge<L: LedgerClient>(
    State(state): State<AppState<L>>,
    Path((tx_id, index)): Path<(String, u32)>,
) -> ApiResult<PlannedTransition> {
    let utxo_ref = parse_ref(&tx_id, index)?;
    planned(state.client.merge(&utxo_ref).await)
}

// ─── POST /bounty/{tx_id}/{index}/close ──────────────────────

async fn close<L: LedgerClient>(
    State(state): State<AppState<L>>,
    Path((tx_id, index)): Path<(String, u32)>,
) -> ApiResult<PlannedTransition> {
    let utxo_ref = parse_ref(&tx_id, index)?;
    planned(state.client.close(&utxo_ref).await)
}

// ─── POST /bounty/{tx_id}/{index}/claim ──────────────────────

async fn claim<L: LedgerClient>(
    State(state): State<AppState<L>>,
    Path((tx_id, index)): Path<(String, u32)>,
    Json(req): Json<ClaimReq>,
) -> ApiResult<PlannedTransition> {
    let utxo_ref = parse_ref(&tx_id, index)?;
    planned(state.client.claim_for(&utxo_ref, &req.contributor).await)
}

// ─── Router builder ──────────────────────────────────────────

pub fn build_router<L: LedgerClient>(state: AppState<L>) -> Router {
    Router::new()
        .route("/settings", get(get_settings::<L>))
        .route("/bounty/{tx_id}/{index}", get(get_bounty::<L>))
        .route("/bounty/{tx_id}/{index}/rewards", post(add_rewards::<L>))
        .route("/bounty/{tx_id}/{index}/assign", post(assign::<L>))
        .route("/bounty/{tx_id}/{index}/merge", post(merge::<L>))
        .route("/bounty/{tx_id}/{index}/close", post(close::<L>))
        .route("/bounty/{tx_id}/{index}/claim", post(claim::<L>))
        .with_state(state)
}
