//! Marketplace node prober.
//!
//! Runs a benchmark command on compute-marketplace providers, either until
//! every name on a whitelist has been checked or until a fixed number of
//! previously unseen providers has been probed. Offers are filtered by
//! price limits and a cost estimate, ranked by score, and every finished
//! task lands in a result log.
//!
//! - **[`core`]**: Pure, deterministic logic (cost model, filter, scoring,
//!   name lists, quotas). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, input files, the
//!   marketplace seam, output, signals).
//!
//! Orchestration modules ([`round`], [`looping`], [`report`]) coordinate the
//! shared [`state`] with a [`io::market::Marketplace`] backend.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod report;
pub mod round;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
