//! The readiness probe contract

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Why a dependency is not ready. Rendered after the probe name in readiness
/// reasons, e.g. `db: connection refused`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProbeError(String);

impl ProbeError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self(message.to_string())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProbeError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ProbeError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

pub type ProbeResult = std::result::Result<(), ProbeError>;

/// A check for one dependency's availability.
///
/// Probes are invoked once per readiness request and must not hold state the
/// registry relies on. Blocking forever blocks the readiness request.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self) -> ProbeResult;
}

#[async_trait::async_trait]
impl<P: Probe + ?Sized> Probe for Arc<P> {
    async fn check(&self) -> ProbeResult {
        (**self).check().await
    }
}

#[async_trait::async_trait]
impl<P: Probe + ?Sized> Probe for Box<P> {
    async fn check(&self) -> ProbeResult {
        (**self).check().await
    }
}

/// Probe backed by a blocking closure, run on the blocking thread pool.
pub struct FnProbe<F> {
    check_fn: Arc<F>,
}

/// Wraps a blocking closure such as a synchronous client's ping.
pub fn probe_fn<F>(check_fn: F) -> FnProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync + 'static,
{
    FnProbe {
        check_fn: Arc::new(check_fn),
    }
}

#[async_trait::async_trait]
impl<F> Probe for FnProbe<F>
where
    F: Fn() -> ProbeResult + Send + Sync + 'static,
{
    async fn check(&self) -> ProbeResult {
        let check_fn = Arc::clone(&self.check_fn);
        match tokio::task::spawn_blocking(move || (*check_fn)()).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(ProbeError::new(err)),
        }
    }
}

/// Probe backed by a closure returning a future.
pub struct AsyncFnProbe<F> {
    check_fn: F,
}

pub fn async_probe_fn<F, Fut>(check_fn: F) -> AsyncFnProbe<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    AsyncFnProbe { check_fn }
}

#[async_trait::async_trait]
impl<F, Fut> Probe for AsyncFnProbe<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    async fn check(&self) -> ProbeResult {
        (self.check_fn)().await
    }
}
