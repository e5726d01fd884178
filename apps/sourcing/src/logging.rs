use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::SourcingConfig;

/// Installs the global structured-logging subscriber.
///
/// `RUST_LOG` wins when set; otherwise this crate logs at `config.rust_log`.
/// Call once from the orchestrating binary, after loading configuration.
pub fn init_tracing(config: &SourcingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config));

    // try_init so a second call (tests, embedding hosts) leaves the first subscriber in place
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn default_filter(config: &SourcingConfig) -> EnvFilter {
    EnvFilter::new(format!(
        "{}={}",
        env!("CARGO_PKG_NAME").replace('-', "_"),
        &config.rust_log
    ))
}
