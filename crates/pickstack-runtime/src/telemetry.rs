//! Tracing initialisation.
//!
//! Call [`init_tracing`] once at process startup to wire up the `tracing`
//! console subscriber.  Filtering follows `RUST_LOG` when set and defaults
//! to `info` otherwise.
//!
//! # Example
//!
//! ```rust
//! pickstack_runtime::telemetry::init_tracing();
//! tracing::info!("perception stack starting");
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the global `tracing` subscriber with a compact console
/// formatter.
///
/// Safe to call more than once: subsequent calls are no-ops, which keeps
/// test binaries that initialise eagerly from panicking.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing();
        init_tracing();
        tracing::info!("telemetry smoke test");
    }
}
