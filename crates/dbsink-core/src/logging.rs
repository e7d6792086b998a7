//! Process-wide `tracing` subscriber setup.
//!
//! The sinks log through `tracing` macros. Binaries call one of these once at
//! startup; library code never installs a subscriber.

use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Initialize the global tracing subscriber with stderr output only.
///
/// `RUST_LOG` takes precedence over `level`. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

/// Initialize the global subscriber with stderr output plus an extra layer
/// (typically the database sink layer).
///
/// The extra layer sits directly on the registry so it sees span data; the
/// env filter applies to both outputs.
pub fn init_subscriber_with_layer<L>(level: &str, layer: L)
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_does_not_panic() {
        init_subscriber("warn");
        init_subscriber("debug");
    }
}
