//! Ready-made probes for common client types

use super::probe::{Probe, ProbeError, ProbeResult};
use sqlx::{Connection, SqlitePool};
use std::fmt::Debug;
use std::time::Duration;

/// A client exposing a connectivity state, like a gRPC channel or a message
/// bus connection.
pub trait ConnectionStateReporter: Send + Sync {
    type State: Debug + Send;

    fn state(&self) -> Self::State;

    fn is_ready(state: &Self::State) -> bool;
}

pub struct StateProbe<R> {
    kind: String,
    reporter: R,
}

/// Fails while the reporter's state is not ready. `kind` names the connection
/// in the failure message, e.g. `grpc` or `nats`.
pub fn state_probe<R: ConnectionStateReporter>(kind: impl Into<String>, reporter: R) -> StateProbe<R> {
    StateProbe {
        kind: kind.into(),
        reporter,
    }
}

#[async_trait::async_trait]
impl<R: ConnectionStateReporter> Probe for StateProbe<R> {
    async fn check(&self) -> ProbeResult {
        let state = self.reporter.state();
        if R::is_ready(&state) {
            return Ok(());
        }

        Err(ProbeError::new(format!(
            "{} connection is in unready state: {:?}",
            self.kind, state
        )))
    }
}

pub struct SqlProbe {
    pool: SqlitePool,
}

/// Acquires a pooled connection and pings it.
pub fn sql_probe(pool: SqlitePool) -> SqlProbe {
    SqlProbe { pool }
}

#[async_trait::async_trait]
impl Probe for SqlProbe {
    async fn check(&self) -> ProbeResult {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ProbeError::new(format!("database connection unavailable: {}", e)))?;

        conn.ping()
            .await
            .map_err(|e| ProbeError::new(format!("database ping failed: {}", e)))
    }
}

pub struct HttpProbe {
    client: reqwest::Client,
    endpoint: String,
}

/// GETs `endpoint` and expects a 2xx answer.
///
/// When checking another service that exposes these routes, point this at its
/// liveness route so readiness failures do not cascade between services.
pub fn http_probe(endpoint: impl Into<String>) -> HttpProbe {
    HttpProbe {
        client: reqwest::Client::new(),
        endpoint: endpoint.into(),
    }
}

impl HttpProbe {
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Replaces the client with one that gives up after `timeout`.
    pub fn with_request_timeout(self, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self.with_client(client))
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    async fn check(&self) -> ProbeResult {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| ProbeError::new(format!("endpoint could not be reached: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::new(format!("service is not ready: {}", status)))
        }
    }
}

/// Seal status as reported by a Vault health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultStatus {
    pub initialized: bool,
    pub sealed: bool,
    pub standby: bool,
}

/// A client able to fetch Vault's health status.
#[async_trait::async_trait]
pub trait VaultHealthReporter: Send + Sync {
    type Error: std::fmt::Display + Send;

    async fn health(&self) -> Result<VaultStatus, Self::Error>;
}

pub struct VaultProbe<R> {
    reporter: R,
}

/// Fails unless Vault is initialized, unsealed and active.
pub fn vault_probe<R: VaultHealthReporter>(reporter: R) -> VaultProbe<R> {
    VaultProbe { reporter }
}

#[async_trait::async_trait]
impl<R: VaultHealthReporter> Probe for VaultProbe<R> {
    async fn check(&self) -> ProbeResult {
        let status = self
            .reporter
            .health()
            .await
            .map_err(|e| ProbeError::new(format!("could not get vault health: {}", e)))?;

        if !status.initialized {
            return Err(ProbeError::new("vault is not initialized"));
        }
        if status.sealed {
            return Err(ProbeError::new("vault is sealed"));
        }
        if status.standby {
            return Err(ProbeError::new("vault is on standby"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum ChannelState {
        Connecting,
        Ready,
    }

    struct MockChannel {
        state: ChannelState,
    }

    impl ConnectionStateReporter for MockChannel {
        type State = ChannelState;

        fn state(&self) -> ChannelState {
            self.state
        }

        fn is_ready(state: &ChannelState) -> bool {
            *state == ChannelState::Ready
        }
    }

    #[tokio::test]
    async fn test_state_probe() {
        let probe = state_probe("grpc", MockChannel { state: ChannelState::Ready });
        assert!(probe.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_state_probe_unready() {
        let probe = state_probe("grpc", MockChannel { state: ChannelState::Connecting });
        let err = probe.check().await.unwrap_err();
        assert_eq!(err.message(), "grpc connection is in unready state: Connecting");
    }

    #[tokio::test]
    async fn test_sql_probe() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let probe = sql_probe(pool);
        assert!(probe.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_sql_probe_closed_pool() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        pool.close().await;

        let probe = sql_probe(pool);
        let err = probe.check().await.unwrap_err();
        assert!(err.message().starts_with("database connection unavailable"));
    }

    async fn spawn_endpoint(status: StatusCode) -> String {
        let app = Router::new().route("/", get(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_http_probe() {
        let endpoint = spawn_endpoint(StatusCode::OK).await;
        assert!(http_probe(endpoint).check().await.is_ok());
    }

    #[tokio::test]
    async fn test_http_probe_unready_status() {
        let endpoint = spawn_endpoint(StatusCode::SERVICE_UNAVAILABLE).await;
        let err = http_probe(endpoint).check().await.unwrap_err();
        assert_eq!(err.message(), "service is not ready: 503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_http_probe_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = http_probe(format!("http://{}/", addr))
            .with_request_timeout(Duration::from_secs(2))
            .unwrap();
        let err = probe.check().await.unwrap_err();
        assert!(err.message().starts_with("endpoint could not be reached"));
    }

    #[tokio::test]
    async fn test_http_probe_request_timeout() {
        let app = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let probe = http_probe(format!("http://{}/", addr))
            .with_request_timeout(Duration::from_millis(100))
            .unwrap();

        let start = std::time::Instant::now();
        let err = probe.check().await.unwrap_err();
        assert!(err.message().starts_with("endpoint could not be reached"));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    struct MockVault {
        status: Result<VaultStatus, String>,
    }

    #[async_trait::async_trait]
    impl VaultHealthReporter for MockVault {
        type Error = String;

        async fn health(&self) -> Result<VaultStatus, String> {
            self.status.clone()
        }
    }

    fn vault(initialized: bool, sealed: bool, standby: bool) -> VaultProbe<MockVault> {
        vault_probe(MockVault {
            status: Ok(VaultStatus {
                initialized,
                sealed,
                standby,
            }),
        })
    }

    #[tokio::test]
    async fn test_vault_probe() {
        assert!(vault(true, false, false).check().await.is_ok());
    }

    #[tokio::test]
    async fn test_vault_probe_unready_states() {
        let err = vault(false, false, false).check().await.unwrap_err();
        assert_eq!(err.message(), "vault is not initialized");

        let err = vault(true, true, false).check().await.unwrap_err();
        assert_eq!(err.message(), "vault is sealed");

        let err = vault(true, false, true).check().await.unwrap_err();
        assert_eq!(err.message(), "vault is on standby");
    }

    #[tokio::test]
    async fn test_vault_probe_unreachable() {
        let probe = vault_probe(MockVault {
            status: Err("connection refused".to_string()),
        });
        let err = probe.check().await.unwrap_err();
        assert_eq!(err.message(), "could not get vault health: connection refused");
    }
}
