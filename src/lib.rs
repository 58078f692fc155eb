pub mod chat;
pub mod clinical;
pub mod config;
pub mod core_state;
pub mod dashboards;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod psychosocial;
pub mod triage;

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Honors `RUST_LOG`, falling back to
/// `config::default_log_filter()`. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!(version = config::APP_VERSION, "Lia starting");
}
