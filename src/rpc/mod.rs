//! Elements node RPC subsystem.
//!
//! # Data Flow
//! ```text
//! [elements] config section
//!     → client.rs (ElementsRpc: endpoint, credentials, timeout)
//!     → api.rs (ElementsApi catalog: positional params + defaults)
//!     → types.rs (JSON-RPC envelope, RpcError)
//! ```
//!
//! # Constraints
//! - One HTTP round trip per call, no retries
//! - Credentials never logged
//! - HTTP status failures and JSON-RPC `error` objects are distinct variants

pub mod api;
pub mod client;
pub mod types;

pub use api::ElementsApi;
pub use client::ElementsRpc;
pub use types::{EstimateMode, RpcError, RpcResult, SendManyArgs, SendToAddressArgs, BASE_ASSET};
