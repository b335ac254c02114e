//! Route handlers.
//!
//! Node-backed handlers answer 503 before touching a pipeline when no
//! transport was configured; otherwise the pipeline decides the outcome.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::request::json_body;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::operations::{
    self, AssetList, BalanceRequest, ChainInfo, CreateAddressRequest, CreatedAddress,
    SendTransactionRequest, SentTransaction, SharedElements, WalletBalance,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn require(state: &AppState) -> Result<SharedElements, ApiError> {
    state.elements.clone().ok_or(ApiError::Unavailable)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub services: Services,
}

#[derive(Debug, Serialize)]
pub struct Services {
    pub elements: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: timestamp(),
        services: Services {
            elements: state.elements.is_some(),
        },
    })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub timestamp: String,
    pub elements: NodeStatus,
}

#[derive(Debug, Serialize)]
pub struct NodeStatus {
    pub connected: bool,
    pub info: Option<ChainInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Connectivity report. Always 200; a failing node shows up as `connected: false`.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let elements = match state.elements.clone() {
        None => NodeStatus {
            connected: false,
            info: None,
            error: None,
        },
        Some(elements) => match operations::get_chain_info(Some(elements)).await {
            Ok(info) => NodeStatus {
                connected: true,
                info: Some(info),
                error: None,
            },
            Err(e) => NodeStatus {
                connected: false,
                info: None,
                error: Some(e.to_string()),
            },
        },
    };

    Json(StatusResponse {
        timestamp: timestamp(),
        elements,
    })
}

pub async fn node_info(State(state): State<AppState>) -> ApiResult<ChainInfo> {
    let elements = require(&state)?;
    Ok(Json(operations::get_chain_info(Some(elements)).await?))
}

pub async fn balance(
    State(state): State<AppState>,
    Query(request): Query<BalanceRequest>,
) -> ApiResult<WalletBalance> {
    let elements = require(&state)?;
    Ok(Json(operations::get_balance(Some(elements), request).await?))
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub liquid: Option<LiquidBalance>,
    /// On-chain and Lightning balances are not served by this gateway.
    pub bitcoin: Option<()>,
    pub lightning: Option<()>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LiquidBalance {
    Available { lbtc: f64, asset: String },
    Failed { error: String },
}

/// Base-asset balance per backend. Always 200; a failing node is reported in the body.
pub async fn balances(State(state): State<AppState>) -> Json<BalancesResponse> {
    let liquid = match state.elements.clone() {
        None => None,
        Some(elements) => Some(
            match operations::get_balance(Some(elements), BalanceRequest::default()).await {
                Ok(balance) => LiquidBalance::Available {
                    lbtc: balance.balance,
                    asset: balance.asset,
                },
                Err(e) => LiquidBalance::Failed { error: e.to_string() },
            },
        ),
    };

    Json(BalancesResponse {
        liquid,
        bitcoin: None,
        lightning: None,
    })
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub message: &'static str,
    pub latest_block: u64,
    pub chain: String,
}

/// Chain tip summary; wallet history is not indexed.
pub async fn transactions(State(state): State<AppState>) -> ApiResult<TransactionsResponse> {
    let elements = require(&state)?;
    let info = operations::get_chain_info(Some(elements)).await?;

    Ok(Json(TransactionsResponse {
        message: "Transaction history is not available",
        latest_block: info.blocks,
        chain: info.chain,
    }))
}

pub async fn assets(State(state): State<AppState>) -> ApiResult<AssetList> {
    let elements = require(&state)?;
    Ok(Json(operations::list_assets(Some(elements)).await?))
}

pub async fn create_address(State(state): State<AppState>, body: Bytes) -> ApiResult<CreatedAddress> {
    let elements = require(&state)?;
    let request: CreateAddressRequest = json_body(&body)?;
    Ok(Json(operations::create_address(Some(elements), request).await?))
}

pub async fn send(State(state): State<AppState>, body: Bytes) -> ApiResult<SentTransaction> {
    let elements = require(&state)?;
    let request: SendTransactionRequest = json_body(&body)?;

    tracing::info!(
        address = request.address.as_deref().unwrap_or("-"),
        tokens = request.tokens.unwrap_or(0),
        "Send requested"
    );

    Ok(Json(operations::send_transaction(Some(elements), request).await?))
}
