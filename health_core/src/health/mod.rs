pub mod adapters;
pub mod evaluator;
pub mod probe;
pub mod registry;


pub use adapters::{
    http_probe, sql_probe, state_probe, vault_probe, ConnectionStateReporter, HttpProbe, SqlProbe,
    StateProbe, VaultHealthReporter, VaultProbe, VaultStatus,
};
pub use evaluator::{evaluate, Readiness};
pub use probe::{async_probe_fn, probe_fn, AsyncFnProbe, FnProbe, Probe, ProbeError, ProbeResult};
pub use registry::{ProbeEntry, Registry};
