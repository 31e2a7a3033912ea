//! Liveness and readiness probe handlers

use crate::health::{evaluate, Registry};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<Registry>,
}

impl HealthState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveResponse {
    pub alive: bool,
}

/// Answers as long as the process can serve requests. Runs no probes.
pub async fn handle_liveness() -> impl IntoResponse {
    debug!("Liveness probe");

    Json(AliveResponse { alive: true })
}

/// Runs every registered probe on each request; nothing is cached.
pub async fn handle_readiness(State(state): State<HealthState>) -> impl IntoResponse {
    let readiness = evaluate(state.registry.snapshot()).await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        warn!("Service not ready: {}", readiness.reasons.join(", "));
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}
