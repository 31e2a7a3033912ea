//! Route table for the health endpoints

use super::health::{handle_liveness, handle_readiness, HealthState};
use crate::config::RouteConfig;
use axum::{routing::get, Router};

/// # Panics
///
/// Panics if the two paths collide or are not absolute; see
/// [`RouteConfig::validate`].
pub fn create_routes(routes: &RouteConfig) -> Router<HealthState> {
    Router::new()
        .route(&routes.alive_path, get(handle_liveness))
        .route(&routes.ready_path, get(handle_readiness))
}
