//! Logging setup for the `xvsa-gather` binary.

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber once. `RUST_LOG` wins when set; otherwise
/// `info`, or `debug` with `--verbose`.
pub fn init(verbose: bool) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if verbose { "debug" } else { "info" };
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(level)
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(verbose).with_writer(std::io::stderr))
            .init();
    });
}
