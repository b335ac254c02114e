//! Wallet balance for one asset.

use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::operations::types::WalletBalance;
use crate::operations::{
    connected, into_owned, non_empty, require_elements, Connected, SharedElements, FORMAT,
    VALIDATE,
};
use crate::pipeline::{PipelineError, PipelineResult, StepGraph, StepInput};
use crate::rpc::{RpcError, BASE_ASSET};

const GET_BALANCE: &str = "getBalance";
const GET_WALLET_INFO: &str = "getWalletInfo";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceRequest {
    /// Asset label or id; the base asset when absent.
    #[serde(default)]
    pub asset: Option<String>,
}

impl BalanceRequest {
    fn asset(&self) -> &str {
        non_empty(&self.asset).unwrap_or(BASE_ASSET)
    }
}

struct Context {
    elements: Option<SharedElements>,
    request: BalanceRequest,
}

/// Pick the requested asset out of a `getbalance` result.
///
/// Elements answers with an asset → amount object; plain Bitcoin-style nodes
/// answer with a bare number.
fn select_balance(result: &Value, asset: &str) -> Result<f64, RpcError> {
    match result {
        Value::Object(balances) => Ok(balances.get(asset).and_then(Value::as_f64).unwrap_or(0.0)),
        Value::Number(amount) => Ok(amount.as_f64().unwrap_or(0.0)),
        Value::Null => Ok(0.0),
        other => Err(RpcError::UnexpectedResponse(format!(
            "getbalance returned {}",
            other
        ))),
    }
}

async fn validate(input: StepInput<Context>) -> PipelineResult<Connected> {
    require_elements(&input.context().elements)
}

async fn balance(input: StepInput<Context>) -> PipelineResult<f64> {
    let elements = connected(&input)?;
    let remote = PipelineError::remote(GET_BALANCE, "FailedToGetElementsBalance");

    match elements.get_balance().await {
        Ok(result) => select_balance(&result, input.context().request.asset()).map_err(remote),
        Err(e) => Err(remote(e)),
    }
}

async fn wallet_info(input: StepInput<Context>) -> PipelineResult<Value> {
    connected(&input)?
        .get_wallet_info()
        .await
        .map_err(PipelineError::remote(GET_WALLET_INFO, "FailedToGetElementsWalletInfo"))
}

async fn format_result(input: StepInput<Context>) -> PipelineResult<WalletBalance> {
    let balance = *input.get::<f64>(GET_BALANCE)?;
    // Fetched alongside the balance; the result shape does not use it yet.
    input.get::<Value>(GET_WALLET_INFO)?;

    Ok(WalletBalance {
        balance,
        confirmed_balance: balance,
        unconfirmed_balance: 0.0,
        asset: input.context().request.asset().to_string(),
    })
}

fn graph() -> &'static StepGraph<Context> {
    static GRAPH: OnceLock<StepGraph<Context>> = OnceLock::new();
    GRAPH.get_or_init(|| {
        StepGraph::new("get_balance")
            .step(VALIDATE, &[], validate)
            .step(GET_BALANCE, &[VALIDATE], balance)
            .step(GET_WALLET_INFO, &[VALIDATE], wallet_info)
            .step(FORMAT, &[GET_BALANCE, GET_WALLET_INFO], format_result)
            .terminal(FORMAT)
    })
}

/// Read the wallet balance of `request.asset`.
pub async fn get_balance(
    elements: Option<SharedElements>,
    request: BalanceRequest,
) -> PipelineResult<WalletBalance> {
    graph()
        .run::<WalletBalance>(Context { elements, request })
        .await
        .map(into_owned)
}
