//! Shared deterministic types for the prober core.
//!
//! These types define stable contracts between the core components and the
//! marketplace seam. They hold no I/O handles and serialize to the JSON shape
//! written by `--output`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::bench::BenchResults;

/// Identity of a marketplace provider.
///
/// `name` is the operator-chosen label used for whitelist/blacklist membership.
/// `id` is the stable marketplace identifier; scores and cached proposals are
/// always keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub id: String,
    pub name: String,
}

/// Linear pricing model advertised by an offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub start: f64,
    pub cpu_per_sec: f64,
    pub env_per_sec: f64,
}

/// Snapshot of a provider offer received during negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub provider: ProviderIdentity,
    /// Payment address of the provider.
    #[serde(default)]
    pub wallet: String,
    /// Advertised CPU thread count. `None` or `0` disables duration scaling.
    #[serde(default)]
    pub threads: Option<u32>,
    /// Order of the usage counters the pricing coefficients apply to.
    #[serde(default)]
    pub usage_vector: Vec<String>,
    pub pricing: Pricing,
}

/// The part of an accepted offer kept after negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedProposal {
    pub wallet: String,
    pub usage_vector: Vec<String>,
    pub pricing: Pricing,
}

impl From<&Offer> for CachedProposal {
    fn from(offer: &Offer) -> Self {
        Self {
            wallet: offer.wallet.clone(),
            usage_vector: offer.usage_vector.clone(),
            pricing: offer.pricing,
        }
    }
}

/// Output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub index: usize,
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// One entry of the result log, appended once per successful task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub id: String,
    pub score: Option<f64>,
    pub result: CommandResult,
    pub proposal: Option<CachedProposal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench: Option<BenchResults>,
    pub finished_at: DateTime<Utc>,
}

/// How the run decides which providers are still to be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// Only whitelisted providers are eligible; each success shrinks the whitelist.
    Whitelist,
    /// Any non-blacklisted provider is eligible until `tasks` tasks have run.
    BlacklistCount { tasks: u32 },
}

/// Shape of the benchmark workload, used to scale the cost estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workload {
    /// Expected wall-clock seconds of the benchmark at `threads` threads.
    pub duration: f64,
    /// Thread count `duration` was measured with. `0` disables scaling.
    pub threads: u32,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            duration: 120.0,
            threads: 1,
        }
    }
}

/// Price ceilings applied by the proposal filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceLimits {
    pub start: f64,
    pub cpu_per_sec: f64,
    pub env_per_sec: f64,
    /// Ceiling on the estimated cost of one task.
    pub estimate: f64,
}

impl Default for PriceLimits {
    fn default() -> Self {
        Self {
            start: 1.0,
            cpu_per_sec: 0.001,
            env_per_sec: 0.001,
            estimate: 0.0001,
        }
    }
}
