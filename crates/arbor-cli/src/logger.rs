//! Logging setup using the `tracing` ecosystem.
//!
//! Verbosity is resolved in this order: `--verbose` (debug for arbor
//! crates), `--quiet` (errors only), `RUST_LOG`, then info by default.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("arbor_core=debug,arbor_cli=debug,arbor=debug")
    } else if quiet {
        EnvFilter::new("arbor_core=error,arbor_cli=error,arbor=error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("arbor_core=info,arbor_cli=info,arbor=info"))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
