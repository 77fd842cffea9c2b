//! Deterministic, pure logic shared by the prober.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod bench;
pub mod classifier;
pub mod cost;
pub mod error;
pub mod filter;
pub mod names;
pub mod quota;
pub mod scoring;
pub mod stats;
pub mod types;
