//! Elements JSON-RPC client.
//!
//! # Responsibilities
//! - Hold the connection parameters of one node (immutable after construction)
//! - POST JSON-RPC envelopes to the node root with basic-auth credentials
//! - Separate HTTP failures from JSON-RPC protocol failures
//! - Enforce the per-call timeout

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::schema::ElementsConfig;
use crate::observability::metrics;
use crate::rpc::api::ElementsApi;
use crate::rpc::types::{RpcError, RpcRequest, RpcResponse, RpcResult};

/// Default per-call timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connection handle for one Elements node.
///
/// Cheap to share behind an `Arc`; every call is an independent HTTP round trip
/// over the pooled `reqwest` client.
pub struct ElementsRpc {
    client: Client,
    endpoint: url::Url,
    user: String,
    password: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl ElementsRpc {
    /// Create a client from explicit connection parameters.
    ///
    /// Fails with [`RpcError::InvalidConfiguration`] when host, port, user or
    /// password is empty. `timeout_ms` falls back to [`DEFAULT_TIMEOUT_MS`].
    pub fn new(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        timeout_ms: Option<u64>,
    ) -> RpcResult<Self> {
        if host.trim().is_empty() {
            return Err(RpcError::InvalidConfiguration("ExpectedElementsRpcHost"));
        }
        if port == 0 {
            return Err(RpcError::InvalidConfiguration("ExpectedElementsRpcPort"));
        }
        if user.is_empty() {
            return Err(RpcError::InvalidConfiguration("ExpectedElementsRpcUser"));
        }
        if password.is_empty() {
            return Err(RpcError::InvalidConfiguration("ExpectedElementsRpcPassword"));
        }

        let authority = match host.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{}]:{}", host, port),
            Err(_) => format!("{}:{}", host, port),
        };
        let endpoint: url::Url = format!("http://{}/", authority)
            .parse()
            .map_err(|_| RpcError::InvalidConfiguration("ExpectedElementsRpcHost"))?;

        let timeout = Duration::from_millis(match timeout_ms {
            Some(ms) if ms > 0 => ms,
            _ => DEFAULT_TIMEOUT_MS,
        });

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            user: user.to_string(),
            password: password.to_string(),
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a client from the `[elements]` configuration section.
    pub fn from_config(config: &ElementsConfig) -> RpcResult<Self> {
        Self::new(
            &config.host,
            config.port,
            &config.user,
            &config.password,
            Some(config.timeout_ms),
        )
    }

    /// Node endpoint, without credentials.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn round_trip(&self, method: &str, params: &[Value]) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id);

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.bytes().await?;
        let envelope: RpcResponse = serde_json::from_slice(&body)
            .map_err(|e| RpcError::UnexpectedResponse(format!("{} returned invalid JSON-RPC body: {}", method, e)))?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ElementsApi for ElementsRpc {
    async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let start = Instant::now();
        let result = self.round_trip(method, &params).await;

        match &result {
            Ok(_) => {
                tracing::debug!(
                    method,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Elements RPC call succeeded"
                );
            }
            Err(e) => {
                tracing::debug!(
                    method,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Elements RPC call failed"
                );
            }
        }
        metrics::record_rpc_call(method, result.is_ok(), start);

        result
    }
}

impl std::fmt::Debug for ElementsRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementsRpc")
            .field("endpoint", &self.endpoint.as_str())
            .field("user", &self.user)
            .field("timeout_ms", &(self.timeout.as_millis() as u64))
            .finish()
    }
}
