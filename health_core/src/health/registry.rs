//! Name-to-probe registry

use super::probe::Probe;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub type ProbeEntry = (String, Arc<dyn Probe>);

/// Readiness probes keyed by a unique service name.
///
/// Registration is expected to finish before serving starts. Registering
/// while a readiness request is in flight is unsupported; the lock only keeps
/// it memory safe.
#[derive(Default)]
pub struct Registry {
    probes: RwLock<HashMap<String, Arc<dyn Probe>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a probe under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered. A duplicate name is a wiring
    /// bug and the first registration is left in place.
    pub fn register(&self, name: impl Into<String>, probe: Arc<dyn Probe>) {
        let name = name.into();
        let mut probes = self.probes.write();

        if probes.contains_key(&name) {
            drop(probes);
            panic!("a health probe should have a unique identifier: '{}' is already registered", name);
        }

        debug!("Registered readiness probe '{}'", name);
        probes.insert(name, probe);
    }

    pub fn snapshot(&self) -> Vec<ProbeEntry> {
        self.probes
            .read()
            .iter()
            .map(|(name, probe)| (name.clone(), Arc::clone(probe)))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.probes.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.probes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.read().is_empty()
    }
}
