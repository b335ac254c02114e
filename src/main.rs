//! Elements/Liquid wallet gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum router + middleware)
//!                        │
//!                        ▼
//!                     operations (create address, balance, assets, send, chain info)
//!                        │  each one a StepGraph run by pipeline
//!                        ▼
//!                     rpc (ElementsApi catalog → ElementsRpc JSON-RPC over HTTP)
//!                        │
//!                        ▼
//!                     elementsd
//!
//!     Cross-cutting: config, observability (tracing + prometheus), lifecycle
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use elements_gateway::config::load_config;
use elements_gateway::lifecycle::{wait_for_signal, Shutdown};
use elements_gateway::observability::{init_logging, init_metrics};
use elements_gateway::operations::SharedElements;
use elements_gateway::{ElementsRpc, HttpServer};

#[derive(Parser)]
#[command(name = "elements-gateway")]
#[command(about = "HTTP gateway for an Elements/Liquid wallet", long_about = None)]
struct Args {
    /// TOML config file. Defaults plus environment overrides apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind.to_string();
    }

    init_logging(&config.observability);
    tracing::info!("elements-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        elements_host = %config.elements.host,
        elements_port = config.elements.port,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated by load_config.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        }
    }

    // A gateway without a node still serves health and reports 503 elsewhere.
    let elements: Option<SharedElements> = match ElementsRpc::from_config(&config.elements) {
        Ok(rpc) => {
            tracing::info!(endpoint = %rpc.endpoint(), "Elements RPC client ready");
            Some(Arc::new(rpc))
        }
        Err(e) => {
            tracing::error!(error = %e, "Elements RPC client unavailable");
            None
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = HttpServer::new(config, elements);
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
