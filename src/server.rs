// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP listener exposing Prometheus metrics and a liveness probe.

use crate::constants::{HEALTH_SERVER_PATH, METRICS_CONTENT_TYPE, METRICS_SERVER_PATH};
use crate::dns_errors::StartupError;
use crate::metrics::gather_metrics;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Routes served by the metrics listener.
pub fn router() -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route(HEALTH_SERVER_PATH, get(health_handler))
}

/// Bind the metrics listener.
///
/// Called before the reconciliation loop starts so an unusable address fails
/// startup instead of the background task.
///
/// # Errors
///
/// Returns [`StartupError::MetricsBind`] when the address cannot be bound.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, StartupError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::MetricsBind { addr, source })?;
    info!("Metrics server listening on {}", addr);
    Ok(listener)
}

/// Serve metrics on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener) {
    if let Err(e) = axum::serve(listener, router()).await {
        error!("Metrics server stopped: {}", e);
    }
}

pub(crate) async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub(crate) async fn health_handler() -> &'static str {
    "ok"
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
