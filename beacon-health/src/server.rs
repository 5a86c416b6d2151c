//! Health check HTTP server

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use beacon_common::Signal;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::trace::TraceLayer;

use crate::{Health, HealthConfig, HealthError, Registry};

/// Path of the single route served
pub const HEALTH_PATH: &str = "/health";

/// Health check HTTP server
///
/// Serves `GET /health` from a bound listener until told to shut down.
pub struct HealthServer {
    listener: TcpListener,
    router: Router,
}

impl HealthServer {
    /// Bind the configured address
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the specified address fails.
    pub async fn bind(config: &HealthConfig, registry: Arc<Registry>) -> Result<Self, HealthError> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| HealthError::BindError {
                address: config.address().to_string(),
                source: e,
            })?;

        tracing::info!(
            address = %config.address(),
            "Health check server bound successfully"
        );

        Ok(Self {
            listener,
            router: router(registry),
        })
    }

    /// The address actually bound, with the real port if `0` was asked for
    ///
    /// # Errors
    ///
    /// Returns an error if the socket can no longer report its address.
    pub fn local_addr(&self) -> Result<SocketAddr, HealthError> {
        self.listener
            .local_addr()
            .map_err(|e| HealthError::ServerError(e.to_string()))
    }

    /// Run the health server until a shutdown signal is received
    ///
    /// Once the signal arrives no new connections are accepted, in-flight
    /// requests are completed, and the listener is closed before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a runtime error.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<Signal>) -> Result<(), HealthError> {
        tracing::info!("Health check server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                loop {
                    match shutdown.recv().await {
                        Ok(Signal::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                        Ok(Signal::Reload) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    }
                }
                tracing::info!("Health check server received shutdown signal");
            })
            .await
            .map_err(|e| HealthError::ServerError(e.to_string()))?;

        tracing::info!("Health check server stopped");
        Ok(())
    }
}

/// Router answering `GET /health` from `registry`
#[must_use]
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .with_state(registry)
        .layer(TraceLayer::new_for_http())
}

/// Every request re-queries every checker; nothing is cached.
async fn health_handler(State(registry): State<Arc<Registry>>) -> Health {
    registry.check()
}

impl IntoResponse for Health {
    fn into_response(self) -> Response {
        match self {
            Self::Healthy => (StatusCode::OK, "OK").into_response(),
            Self::Unhealthy(names) => (StatusCode::SERVICE_UNAVAILABLE, names).into_response(),
        }
    }
}
