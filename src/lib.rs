pub mod category;
pub mod config;
pub mod database;
pub mod errors;
pub mod services;

pub use category::{CategoryLabel, EdgeClusterLabels, Selector};
pub use config::EngineConfig;
pub use errors::{ScopeError, ScopeResult};
pub use services::{EntityService, ProjectService};

/// Initialise tracing with an env-filter, for binaries and test harnesses
/// that embed this crate. Safe to call more than once.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
