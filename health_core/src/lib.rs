//! Liveness and readiness endpoints backed by user-registered dependency probes.
//!
//! A [`Checker`] owns a registry of named [`Probe`]s. `GET /alive` answers
//! while the process can serve HTTP; `GET /ready` runs every probe
//! concurrently and answers `503` with one reason per failing probe.

pub mod checker;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod server;

pub use checker::{Checker, DEFAULT_SHUTDOWN_TIMEOUT};
pub use config::HealthConfig;
pub use error::{HealthError, Result};
pub use handlers::create_routes;
pub use health::{
    async_probe_fn, evaluate, http_probe, probe_fn, sql_probe, state_probe, vault_probe,
    ConnectionStateReporter, Probe, ProbeError, ProbeResult, Readiness, Registry,
    VaultHealthReporter, VaultStatus,
};
pub use server::{shutdown_signal, ShutdownTrigger};
