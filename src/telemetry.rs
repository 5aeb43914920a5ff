//! Tracing initialization.
//!
//! The subscriber is constructed once per process invocation in `main`;
//! components emit through the `tracing` macros.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the console subscriber with an env-driven filter.
///
/// `RUST_LOG` overrides the default `INFO` level.
pub fn init_telemetry() {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
