//! Elements/Liquid wallet gateway library.

pub mod amount;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod operations;
pub mod pipeline;
pub mod rpc;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rpc::{ElementsApi, ElementsRpc};
