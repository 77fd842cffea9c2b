//! Extraction of stress-ng metrics from benchmark output.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static HOGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)hogs:\s*(\d+)\s*matrix").expect("valid hogs regex")
});

// `[pid] <stressor> <bogo ops> <real s> <usr s> <sys s> ...`
static METRICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]\s+[A-Za-z][\w-]*\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)")
        .expect("valid metrics regex")
});

/// Metrics derived from a `stress-ng --metrics-brief` run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchResults {
    /// Number of stressor instances (`hogs`), when reported.
    pub threads: Option<u32>,
    pub ops: f64,
    /// User plus system CPU seconds.
    pub usage: f64,
    /// CPU seconds per wall-clock second.
    pub equiv_threads: f64,
    pub ops_per_thread: f64,
}

/// Parse stress-ng output. Returns `None` unless `stdout` starts with
/// `stress-ng` and contains a metrics line.
pub fn parse_stress_ng(stdout: &str) -> Option<BenchResults> {
    if !stdout.starts_with("stress-ng") {
        return None;
    }

    let threads = HOGS
        .captures(stdout)
        .and_then(|caps| caps[1].parse::<u32>().ok());

    let caps = METRICS.captures_iter(stdout).last()?;
    let field = |i: usize| caps[i].parse::<f64>().ok();
    let ops = field(1)?;
    let real = field(2)?;
    let usage = field(3)? + field(4)?;

    let equiv_threads = if real > 0.0 {
        round_to(usage / real, 1)
    } else {
        0.0
    };
    let ops_per_thread = if equiv_threads > 0.0 {
        round_to(ops / equiv_threads, 1)
    } else {
        0.0
    };

    Some(BenchResults {
        threads,
        ops: round_to(ops, 0),
        usage: round_to(usage, 1),
        equiv_threads,
        ops_per_thread,
    })
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
