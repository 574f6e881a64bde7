use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install a stdout subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once. If another subscriber is already installed
/// the call leaves it in place.
pub fn setup_telemetry() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let stdout_layer = fmt::Layer::new().with_writer(std::io::stdout).with_target(true);

        if let Err(e) = tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .try_init()
        {
            eprintln!("Warning: tracing subscriber already installed: {e}");
        }
    });
}
