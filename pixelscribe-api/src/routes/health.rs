/// Liveness and health endpoints
///
/// # Endpoints
///
/// ```text
/// GET /          -> "API Working"
/// GET /health    -> { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// ```
///
/// `/health` reports `degraded` instead of failing when the database is
/// unreachable, so load balancers can tell the process is alive.

use crate::app::AppState;
use axum::{extract::State, Json};
use pixelscribe_shared::db::pool;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

/// Plain-text liveness probe
pub async fn root() -> &'static str {
    "API Working"
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Database health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}
