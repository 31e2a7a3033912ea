//! The `Checker`: probe registration plus the HTTP router built on it

use crate::config::{HealthConfig, RouteConfig};
use crate::error::Result;
use crate::handlers::{create_routes, HealthState};
use crate::health::{evaluate, Probe, Readiness, Registry};
use crate::middleware::logging::with_request_tracing;
use crate::server::ServerSlot;
use axum::Router;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

/// Provides liveness and readiness endpoints for an application.
///
/// Register readiness probes with [`Checker::add_readiness_probe`] during
/// startup, then serve with [`Checker::serve`] or
/// [`Checker::serve_background`].
///
/// ```no_run
/// # async fn run() -> health_core::Result<()> {
/// use health_core::{probe_fn, Checker};
///
/// let checker = Checker::new();
/// checker.add_readiness_probe("db", probe_fn(|| Ok(())));
///
/// let shutdown = checker.serve_background("0.0.0.0:8080");
/// // ... run the application ...
/// shutdown.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Checker {
    pub(crate) registry: Arc<Registry>,
    pub(crate) routes: RouteConfig,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) server: Arc<Mutex<ServerSlot>>,
}

impl Default for Checker {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            routes: RouteConfig::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            server: Arc::new(Mutex::new(ServerSlot::default())),
        }
    }
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new()
            .with_routes(config.routes.clone())
            .with_shutdown_timeout(config.server.shutdown_timeout())
    }

    pub fn with_routes(mut self, routes: RouteConfig) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Adds a probe run on every readiness request.
    ///
    /// # Panics
    ///
    /// Panics if a probe is already registered under `service`.
    pub fn add_readiness_probe<P>(&self, service: impl Into<String>, probe: P)
    where
        P: Probe + 'static,
    {
        self.registry.register(service, Arc::new(probe));
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Evaluates the registered probes without going through HTTP.
    pub async fn readiness(&self) -> Readiness {
        evaluate(self.registry.snapshot()).await
    }

    /// Builds the health router. Fails if the configured paths are not
    /// absolute or collide.
    pub fn router(&self) -> Result<Router> {
        self.routes.validate()?;
        let router = create_routes(&self.routes).with_state(HealthState::new(self.registry.clone()));
        Ok(with_request_tracing(router))
    }
}
