//! Send an asset to an address and report the resulting wallet transaction.
//!
//! # Data Flow
//! ```text
//! validate         transport, address and a non-zero amount
//!     → sendTransaction   sendtoaddress (conf target 6, CONSERVATIVE)
//!     → getTransaction    gettransaction <txid>
//!     → format            SentTransaction
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::amount::{native_to_tokens, tokens_to_native};
use crate::operations::types::SentTransaction;
use crate::operations::{into_owned, non_empty, require_elements, SharedElements, FORMAT, VALIDATE};
use crate::pipeline::{PipelineError, PipelineResult, StepGraph, StepInput};
use crate::rpc::{EstimateMode, RpcError, SendToAddressArgs, BASE_ASSET};

const SEND_TRANSACTION: &str = "sendTransaction";
const GET_TRANSACTION: &str = "getTransaction";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendTransactionRequest {
    #[serde(default)]
    pub address: Option<String>,
    /// Amount in smallest units. Zero counts as missing.
    #[serde(default, alias = "amount")]
    pub tokens: Option<u64>,
    /// Stored by the node as the wallet comment.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
}

impl SendTransactionRequest {
    fn asset(&self) -> &str {
        non_empty(&self.asset).unwrap_or(BASE_ASSET)
    }
}

struct Context {
    elements: Option<SharedElements>,
    request: SendTransactionRequest,
}

/// Validated send parameters.
struct Checked {
    elements: SharedElements,
    address: String,
    tokens: u64,
}

/// The subset of `gettransaction` the result is built from.
#[derive(Debug, Deserialize)]
struct WalletTransaction {
    #[serde(default)]
    amount: Value,
    #[serde(default)]
    confirmations: i64,
    #[serde(default)]
    blockheight: Option<u64>,
}

impl WalletTransaction {
    /// Native amount moved for `asset`.
    ///
    /// Elements keys the amount map by label, so a request naming the asset by
    /// id falls back to the only entry of a single-asset transaction.
    fn amount_of(&self, asset: &str) -> Result<f64, RpcError> {
        let amount = match &self.amount {
            Value::Object(amounts) => amounts.get(asset).or_else(|| {
                if amounts.len() == 1 {
                    amounts.values().next()
                } else {
                    None
                }
            }),
            other => Some(other),
        };

        amount.and_then(Value::as_f64).ok_or_else(|| {
            RpcError::UnexpectedResponse(format!(
                "gettransaction reports no amount for asset {}: {}",
                asset, self.amount
            ))
        })
    }
}

/// The looked-up transaction with its amount resolved for the sent asset.
struct Settled {
    native: f64,
    confirmations: i64,
    blockheight: Option<u64>,
}

async fn validate(input: StepInput<Context>) -> PipelineResult<Checked> {
    let ctx = input.context();
    let elements = require_elements(&ctx.elements)?.0;

    let address = non_empty(&ctx.request.address)
        .ok_or(PipelineError::invalid_input("ExpectedDestinationAddress"))?;

    let tokens = ctx
        .request
        .tokens
        .filter(|tokens| *tokens > 0)
        .ok_or(PipelineError::invalid_input("ExpectedTokensToSend"))?;

    Ok(Checked {
        elements,
        address: address.to_string(),
        tokens,
    })
}

async fn send(input: StepInput<Context>) -> PipelineResult<String> {
    let checked = input.get::<Checked>(VALIDATE)?;
    let request = &input.context().request;
    let remote = PipelineError::remote(SEND_TRANSACTION, "FailedToSendElementsTransaction");

    let mut args = SendToAddressArgs::new(&checked.address, tokens_to_native(checked.tokens));
    args.comment = request.description.clone().unwrap_or_default();
    args.estimate_mode = EstimateMode::Conservative;
    args.asset = request.asset().to_string();

    match checked.elements.send_to_address(args).await {
        Ok(Value::String(txid)) => Ok(txid),
        Ok(other) => Err(remote(RpcError::UnexpectedResponse(format!(
            "sendtoaddress returned {}",
            other
        )))),
        Err(e) => Err(remote(e)),
    }
}

async fn lookup(input: StepInput<Context>) -> PipelineResult<Settled> {
    let checked = input.get::<Checked>(VALIDATE)?;
    let txid = input.get::<String>(SEND_TRANSACTION)?;
    let remote = PipelineError::remote(GET_TRANSACTION, "FailedToGetElementsTransaction");

    let result = checked.elements.get_transaction(&txid, false).await.map_err(remote)?;
    let transaction: WalletTransaction = serde_json::from_value(result)
        .map_err(|e| remote(RpcError::UnexpectedResponse(e.to_string())))?;
    let native = transaction
        .amount_of(input.context().request.asset())
        .map_err(remote)?;

    Ok(Settled {
        native,
        confirmations: transaction.confirmations,
        blockheight: transaction.blockheight,
    })
}

async fn format_result(input: StepInput<Context>) -> PipelineResult<SentTransaction> {
    let txid = input.get::<String>(SEND_TRANSACTION)?;
    let settled = input.get::<Settled>(GET_TRANSACTION)?;

    Ok(SentTransaction {
        confirmation_height: settled.blockheight.filter(|height| *height > 0),
        id: txid.to_string(),
        is_confirmed: settled.confirmations > 0,
        is_outgoing: true,
        tokens: native_to_tokens(settled.native),
    })
}

fn graph() -> &'static StepGraph<Context> {
    static GRAPH: OnceLock<StepGraph<Context>> = OnceLock::new();
    GRAPH.get_or_init(|| {
        StepGraph::new("send_transaction")
            .step(VALIDATE, &[], validate)
            .step(SEND_TRANSACTION, &[VALIDATE], send)
            .step(GET_TRANSACTION, &[VALIDATE, SEND_TRANSACTION], lookup)
            .step(FORMAT, &[SEND_TRANSACTION, GET_TRANSACTION], format_result)
            .terminal(FORMAT)
    })
}

/// Send `request.tokens` of `request.asset` to `request.address`.
///
/// Nothing is retried: a failed lookup after a successful send still reports
/// failure even though funds have moved.
pub async fn send_transaction(
    elements: Option<SharedElements>,
    request: SendTransactionRequest,
) -> PipelineResult<SentTransaction> {
    graph()
        .run::<SentTransaction>(Context { elements, request })
        .await
        .map(into_owned)
}
