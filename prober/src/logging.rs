//! Diagnostic tracing for the prober.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: progress and diagnostics via `RUST_LOG`,
//!   output to stderr.
//! - **Product output (`report`, `io/results`)**: the summary and result
//!   dump, printed to stdout or written to `--output`. Unaffected by
//!   `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "check_node=info,prober=info";

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `info` for this crate if unset.
///
/// # Example
/// ```bash
/// RUST_LOG=prober=debug check-node -f nodes.txt
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
