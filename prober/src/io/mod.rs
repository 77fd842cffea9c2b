//! Side-effecting operations: config and input files, the marketplace seam,
//! result output, and signal handling.

pub mod config;
pub mod local_market;
pub mod market;
pub mod names_file;
pub mod results;
pub mod signals;
