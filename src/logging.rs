use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

static INIT: Once = Once::new();

/// Installs the global subscriber.
///
/// Verbosity follows `RUST_LOG` and defaults to `info`.
pub fn setup_logger() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt::Subscriber::builder()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .finish()
            .init();
    });
}
