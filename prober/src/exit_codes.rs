//! Stable exit codes for `check-node`.

/// Run completed, or stopped gracefully on a shutdown signal.
pub const OK: i32 = 0;
/// Setup failed (bad config, missing input file, invalid arguments), or the
/// process was forced down after the shutdown grace period.
pub const INVALID: i32 = 1;
