//! Wire envelope, argument types and error definitions for the node RPC.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Label the node uses for its native asset (L-BTC on Liquid).
pub const BASE_ASSET: &str = "bitcoin";

/// Default confirmation target for fee estimation, in blocks.
pub const DEFAULT_CONF_TARGET: u32 = 6;

/// Errors that can occur while talking to the Elements node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A required connection parameter was missing at construction.
    #[error("Invalid Elements RPC configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// The node answered with a non-2xx HTTP status.
    #[error("Elements RPC HTTP Error: {status} - {status_text}")]
    Transport { status: u16, status_text: String },

    /// The node answered 2xx but the envelope carried an `error` object.
    #[error("Elements RPC Error: {message}")]
    Protocol { code: Option<i64>, message: String },

    /// Connection-level failure (DNS, refused connection, timeout).
    #[error(transparent)]
    Connection(#[from] reqwest::Error),

    /// The body was not a JSON-RPC envelope, or a result had the wrong shape.
    #[error("Unexpected Elements RPC response: {0}")]
    UnexpectedResponse(String),
}

impl RpcError {
    /// True when the failure came from the per-call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Connection(e) if e.is_timeout())
    }
}

/// Result type for node RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// JSON-RPC request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a [Value],
    pub id: u64,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: &'a [Value], id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Fee estimation mode understood by `sendtoaddress`, `sendmany` and `estimatesmartfee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EstimateMode {
    Unset,
    Economical,
    #[default]
    Conservative,
}

impl EstimateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateMode::Unset => "UNSET",
            EstimateMode::Economical => "ECONOMICAL",
            EstimateMode::Conservative => "CONSERVATIVE",
        }
    }
}

/// Arguments for `sendtoaddress`.
///
/// The node expects all nine positions even when defaulted, so
/// [`SendToAddressArgs::into_params`] always emits the full list.
#[derive(Debug, Clone, PartialEq)]
pub struct SendToAddressArgs {
    pub address: String,
    /// Amount in the node's native unit.
    pub amount: f64,
    pub comment: String,
    pub comment_to: String,
    pub subtract_fee_from_amount: bool,
    pub replaceable: bool,
    pub conf_target: u32,
    pub estimate_mode: EstimateMode,
    pub asset: String,
}

impl SendToAddressArgs {
    pub fn new(address: impl Into<String>, amount: f64) -> Self {
        Self {
            address: address.into(),
            amount,
            comment: String::new(),
            comment_to: String::new(),
            subtract_fee_from_amount: false,
            replaceable: false,
            conf_target: DEFAULT_CONF_TARGET,
            estimate_mode: EstimateMode::Conservative,
            asset: BASE_ASSET.to_string(),
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        vec![
            Value::from(self.address),
            Value::from(self.amount),
            Value::from(self.comment),
            Value::from(self.comment_to),
            Value::from(self.subtract_fee_from_amount),
            Value::from(self.replaceable),
            Value::from(self.conf_target),
            Value::from(self.estimate_mode.as_str()),
            Value::from(self.asset),
        ]
    }
}

/// Arguments for `sendmany`. The leading dummy account is always `""`.
#[derive(Debug, Clone, PartialEq)]
pub struct SendManyArgs {
    /// Address → native amount.
    pub amounts: serde_json::Map<String, Value>,
    pub minconf: u32,
    pub comment: String,
    pub subtract_fee_from: Vec<String>,
    pub replaceable: bool,
    pub conf_target: u32,
    pub estimate_mode: EstimateMode,
}

impl SendManyArgs {
    pub fn new(amounts: serde_json::Map<String, Value>) -> Self {
        Self {
            amounts,
            minconf: 1,
            comment: String::new(),
            subtract_fee_from: Vec::new(),
            replaceable: false,
            conf_target: DEFAULT_CONF_TARGET,
            estimate_mode: EstimateMode::Conservative,
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        vec![
            Value::from(""),
            Value::Object(self.amounts),
            Value::from(self.minconf),
            Value::from(self.comment),
            Value::from(self.subtract_fee_from),
            Value::from(self.replaceable),
            Value::from(self.conf_target),
            Value::from(self.estimate_mode.as_str()),
        ]
    }
}
