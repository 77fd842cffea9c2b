//! Task cost estimate for an offer.

use crate::core::types::{Offer, Workload};

/// Seconds of the idle step that follows the benchmark command.
pub const IDLE_TAIL_SECS: f64 = 5.0;
/// Fixed per-provider overhead (image deployment, agreement, teardown).
pub const PROVIDER_OVERHEAD_SECS: f64 = 15.0;
/// Flat CPU-seconds allowance for the overhead phase.
pub const OVERHEAD_CPU_SECS: f64 = 0.5;

/// Benchmark duration adjusted to the offered thread count.
///
/// Assumes the workload parallelizes perfectly: an offer with twice the
/// configured threads finishes in half the time. An offer without a thread
/// count, or a workload without a reference thread count, is not scaled.
pub fn scaled_duration(offered_threads: Option<u32>, workload: &Workload) -> f64 {
    match offered_threads {
        Some(offered) if offered > 0 && workload.threads > 0 => {
            workload.duration * f64::from(workload.threads) / f64::from(offered)
        }
        _ => workload.duration,
    }
}

/// Estimate what one probe task costs on `offer`.
///
/// The task is modeled in two phases: the benchmark, which keeps every
/// offered thread busy, and the idle step, which uses no CPU. Environment
/// time covers both phases plus the provider overhead.
pub fn estimate_cost(offer: &Offer, workload: &Workload) -> f64 {
    let threads = f64::from(offer.threads.unwrap_or(0));
    let benchmark_secs = scaled_duration(offer.threads, workload);
    let total_secs = benchmark_secs + IDLE_TAIL_SECS + PROVIDER_OVERHEAD_SECS;

    let benchmark_cpu = benchmark_secs * threads;
    let idle_cpu = 0.0 * IDLE_TAIL_SECS * threads;
    let cpu_secs = benchmark_cpu + idle_cpu + OVERHEAD_CPU_SECS;

    let pricing = &offer.pricing;
    pricing.start + pricing.env_per_sec * total_secs + pricing.cpu_per_sec * cpu_secs
}
