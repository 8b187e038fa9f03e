use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shared_config::AppConfig;

const DEFAULT_FILTER: &str = "info,doctor_cell=debug,appointment_cell=debug,billing_cell=debug";

/// Load `.env`, install the global tracing subscriber and read the config.
///
/// Safe to call more than once; only the first subscriber is installed.
pub fn bootstrap() -> AppConfig {
    dotenv().ok();
    init_tracing();
    AppConfig::from_env()
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Subscriber for tests: output captured by the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
