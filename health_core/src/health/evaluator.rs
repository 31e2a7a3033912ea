//! Concurrent fan-out evaluation of readiness probes

use super::registry::ProbeEntry;
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome of one readiness evaluation. `reasons` holds one
/// `"<name>: <message>"` entry per failing probe, in no particular order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl Readiness {
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            ready: reasons.is_empty(),
            reasons,
        }
    }
}

/// Runs every probe once on its own task and waits for all of them.
///
/// There is no per-probe timeout and no early exit, so the call takes as long
/// as the slowest probe. A probe that panics is reported as a failure instead
/// of tearing down the request.
pub async fn evaluate(probes: Vec<ProbeEntry>) -> Readiness {
    let start = Instant::now();
    let probe_count = probes.len();
    let reasons = Arc::new(Mutex::new(Vec::new()));

    let tasks = probes.into_iter().map(|(name, probe)| {
        let reasons = Arc::clone(&reasons);
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = probe.check().await {
                warn!("Readiness probe '{}' failed: {}", task_name, err);
                reasons.lock().push(format!("{}: {}", task_name, err));
            }
        });
        async move { (name, handle.await) }
    });

    for (name, joined) in join_all(tasks).await {
        if let Err(err) = joined {
            let message = if err.is_panic() {
                format!("probe panicked: {}", panic_message(err.into_panic()))
            } else {
                "probe was cancelled".to_string()
            };
            warn!("Readiness probe '{}' failed: {}", name, message);
            reasons.lock().push(format!("{}: {}", name, message));
        }
    }

    let reasons = std::mem::take(&mut *reasons.lock());
    let readiness = Readiness::from_reasons(reasons);

    debug!(
        probes = probe_count,
        failures = readiness.reasons.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Readiness evaluation completed - ready: {}",
        readiness.ready
    );

    readiness
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
