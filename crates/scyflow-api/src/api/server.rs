//! API Server
//!
//! Wires the route tree together with the cross-cutting middleware stack
//! and owns the listener loop. Application state is assembled by the
//! caller (see `bin/server.rs`) since it requires live collaborators
//! (a database pool, HTTP clients) that this module has no business
//! constructing itself.

use std::net::SocketAddr;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::{middleware as mw, routes, state::AppState};
use crate::Result;

/// Where the server listens. Everything else about how it behaves lives
/// on [`crate::api::ServerConfig`], inside [`AppState`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
        }
    }
}

impl ApiConfig {
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }
}

/// A built server, ready to bind and serve.
pub struct ApiServer {
    config: ApiConfig,
    state: AppState,
    router: Router,
}

impl ApiServer {
    /// Builds a server around already-assembled application state.
    pub fn new(state: AppState, config: ApiConfig) -> Self {
        let router = Self::build_router(&state);
        Self { config, state, router }
    }

    /// Alias kept for symmetry with [`ApiServer::new`] call sites that read
    /// better as "attach this state".
    pub fn with_state(state: AppState, config: ApiConfig) -> Self {
        Self::new(state, config)
    }

    fn build_router(state: &AppState) -> Router {
        let api = routes::api_router(state.clone());

        // Applied bottom-to-top: request-id tagging first, then principal
        // extraction (every route past this point can assume an
        // `Extension<Principal>`), then CORS headers on the way out.
        let router = api
            .layer(middleware::from_fn_with_state(state.clone(), mw::cors_middleware))
            .layer(middleware::from_fn_with_state(state.clone(), mw::principal_middleware))
            .layer(middleware::from_fn(mw::request_id_middleware));

        #[cfg(feature = "metrics")]
        let router = router.layer(middleware::from_fn_with_state(state.clone(), mw::metrics_middleware));

        router.layer(RequestBodyLimitLayer::new(state.config.max_body_size))
    }

    pub fn addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Application state (for tests).
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The assembled router (for tests).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "scyflow API listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }

    /// Serves until `shutdown_signal` resolves, then drains in-flight
    /// requests before returning.
    pub async fn run_until<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "scyflow API listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;
        tracing::info!("scyflow API shut down");
        Ok(())
    }
}
