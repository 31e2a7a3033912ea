//! Listener lifecycle: foreground serve, background serve and graceful shutdown

use crate::checker::Checker;
use crate::error::{HealthError, Result};
use axum::Router;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// At most one server per `Checker`. `next_id` tells a finished serve loop
/// whether the slot still belongs to it.
#[derive(Default)]
pub(crate) struct ServerSlot {
    next_id: u64,
    active: Option<ActiveServer>,
}

struct ActiveServer {
    id: u64,
    addr: String,
    local_addr: Option<SocketAddr>,
    stop_tx: oneshot::Sender<()>,
    done_rx: oneshot::Receiver<()>,
}

struct Claim {
    id: u64,
    addr: String,
    stop_rx: oneshot::Receiver<()>,
    done_tx: oneshot::Sender<()>,
}

impl ServerSlot {
    fn claim(&mut self, addr: &str) -> Result<Claim> {
        if let Some(active) = &self.active {
            return Err(HealthError::AlreadyServing {
                addr: active.addr.clone(),
            });
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let id = self.next_id;
        self.next_id += 1;

        self.active = Some(ActiveServer {
            id,
            addr: addr.to_string(),
            local_addr: None,
            stop_tx,
            done_rx,
        });

        Ok(Claim {
            id,
            addr: addr.to_string(),
            stop_rx,
            done_tx,
        })
    }

    fn release(&mut self, id: u64) {
        if self.active.as_ref().is_some_and(|active| active.id == id) {
            self.active = None;
        }
    }
}

/// Frees the slot when a serve run ends, including when its future is dropped.
struct SlotGuard {
    server: Arc<Mutex<ServerSlot>>,
    id: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.server.lock().release(self.id);
    }
}

impl Checker {
    /// Serves the health routes on `addr` until [`Checker::shutdown`] is called.
    ///
    /// Fails if the configured routes are invalid, if this checker is already
    /// serving, if `addr` cannot be bound, or if accepting connections fails.
    /// Returns `Ok(())` after a graceful shutdown. Dropping the returned future
    /// closes the listener and leaves the checker idle.
    pub async fn serve(&self, addr: &str) -> Result<()> {
        let router = self.router()?;
        let claim = self.server.lock().claim(addr)?;
        run_claimed(self.server.clone(), router, claim).await
    }

    /// Serves on a background task and returns the trigger that stops it.
    ///
    /// A health server that silently fails to start would never report
    /// unreadiness, so any startup failure terminates the process. Must be
    /// called from within a tokio runtime.
    pub fn serve_background(&self, addr: &str) -> ShutdownTrigger {
        let started = self
            .router()
            .and_then(|router| Ok((router, self.server.lock().claim(addr)?)));
        let (router, claim) = match started {
            Ok(started) => started,
            Err(err) => {
                error!("failed to start health server: {}", err);
                std::process::exit(1);
            }
        };

        let server = self.server.clone();
        tokio::spawn(async move {
            if let Err(err) = run_claimed(server, router, claim).await {
                error!("failed to start health server: {}", err);
                std::process::exit(1);
            }
        });

        ShutdownTrigger {
            server: self.server.clone(),
            timeout: self.shutdown_timeout,
        }
    }

    /// Stops accepting connections and waits for in-flight requests to drain.
    ///
    /// Draining longer than the shutdown timeout is an error. Calling this on
    /// a checker that is not serving does nothing.
    pub async fn shutdown(&self) -> Result<()> {
        stop_server(&self.server, self.shutdown_timeout).await
    }

    pub fn is_serving(&self) -> bool {
        self.server.lock().active.is_some()
    }

    /// Address the active server is bound to, once the listener is up.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server
            .lock()
            .active
            .as_ref()
            .and_then(|active| active.local_addr)
    }
}

/// Stops a server started with [`Checker::serve_background`].
#[must_use = "dropping the trigger leaves the health server running"]
pub struct ShutdownTrigger {
    server: Arc<Mutex<ServerSlot>>,
    timeout: Duration,
}

impl ShutdownTrigger {
    /// Gracefully shuts the server down. Terminates the process if the drain
    /// does not finish in time.
    pub async fn shutdown(self) {
        if let Err(err) = stop_server(&self.server, self.timeout).await {
            error!("failed to shutdown health server: {}", err);
            std::process::exit(1);
        }
    }
}

async fn run_claimed(server: Arc<Mutex<ServerSlot>>, router: Router, claim: Claim) -> Result<()> {
    let Claim {
        id,
        addr,
        stop_rx,
        done_tx,
    } = claim;
    let _guard = SlotGuard {
        server: server.clone(),
        id,
    };

    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|source| HealthError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let local_addr = listener.local_addr().ok();
    if let Some(active) = server.lock().active.as_mut().filter(|active| active.id == id) {
        active.local_addr = local_addr;
    }

    info!(
        "Health server listening on {}",
        local_addr.map_or_else(|| addr.clone(), |a| a.to_string())
    );

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
            debug!("Health server received shutdown request");
        })
        .await;

    server.lock().release(id);
    let _ = done_tx.send(());

    match result {
        Ok(()) => {
            info!("Health server on {} stopped", addr);
            Ok(())
        }
        Err(err) => Err(HealthError::Serve(err)),
    }
}

async fn stop_server(server: &Mutex<ServerSlot>, timeout: Duration) -> Result<()> {
    let active = server.lock().active.take();
    let Some(active) = active else {
        debug!("Shutdown requested but no health server is running");
        return Ok(());
    };

    info!("Shutting down health server on {}", active.addr);
    let _ = active.stop_tx.send(());

    match tokio::time::timeout(timeout, active.done_rx).await {
        Ok(_) => Ok(()),
        Err(_) => Err(HealthError::ShutdownTimeout(timeout)),
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
