//! HTTP handlers for the liveness and readiness routes

pub mod health;
pub mod routes;

pub use health::{handle_liveness, handle_readiness, AliveResponse, HealthState};
pub use routes::create_routes;
