//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, limits, CORS, metrics)
//! - Serve until the shutdown coordinator fires

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::middleware::track_metrics;
use crate::http::request::{request_id, UuidRequestId};
use crate::lifecycle::Shutdown;
use crate::operations::SharedElements;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the node transport could not be built at startup.
    pub elements: Option<SharedElements>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, elements: Option<SharedElements>) -> Self {
        let router = Self::build_router(&config, AppState { elements });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/api/health", get(handlers::health))
            .route("/api/status", get(handlers::status))
            .route("/api/node/info", get(handlers::node_info))
            .route("/api/balances", get(handlers::balances))
            .route("/api/liquid/balance", get(handlers::balance))
            .route("/api/liquid/assets", get(handlers::assets))
            .route("/api/liquid/transactions", get(handlers::transactions))
            .route("/api/liquid/address", post(handlers::create_address))
            .route("/api/liquid/send", post(handlers::send))
            .with_state(state);

        // Layers wrap outward: the last one added sees the request first.
        let router = api
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(middleware::from_fn(track_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId));

        if config.security.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// The fully layered router, for serving elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` is triggered, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Draining HTTP connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
