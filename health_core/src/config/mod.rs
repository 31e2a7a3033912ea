pub mod settings;

pub use settings::{DatabaseConfig, HealthConfig, RouteConfig, ServerConfig};
