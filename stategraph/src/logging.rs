//! Diagnostic tracing for the engine and CLI.
//!
//! Tracing is for debugging the engine itself: which leaf path is being
//! described, which command ran, why a case failed. It goes to stderr and is
//! never persisted. The JSON report written by `stategraph run` is the product
//! output and does not depend on the log level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var checked before `RUST_LOG`, so the runner's verbosity can be set
/// without affecting commands it spawns.
pub const LOG_ENV: &str = "STATEGRAPH_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the stderr subscriber.
///
/// Filter source, first match wins: `STATEGRAPH_LOG`, `RUST_LOG`, `warn`.
///
/// # Example
/// ```bash
/// STATEGRAPH_LOG=stategraph=debug stategraph run states.toml
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}
