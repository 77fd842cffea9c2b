//! Probe configuration loaded from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::{PriceLimits, Workload};

/// Probe configuration (TOML).
///
/// Missing fields default to the values the tool has always shipped with.
/// The configuration is immutable once CLI overrides are applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Concurrency ceiling per round.
    pub tasks_per_loop: u32,
    /// Benchmark command run on each provider.
    pub command: String,
    /// Expected benchmark duration in seconds at `threads` threads.
    pub duration: f64,
    /// Thread count `duration` refers to. `0` disables scaling.
    pub threads: u32,
    pub limits: PriceLimits,
    pub market: MarketConfig,
    pub pacing: Pacing,
}

/// Parameters forwarded to the marketplace backend. The core does not
/// interpret them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    pub payment_network: String,
    /// Image the provider runs the benchmark in.
    pub package: String,
    pub min_cpu_cores: u32,
    pub min_mem_gib: f64,
    pub min_storage_gib: f64,
    pub min_cpu_threads: u32,
    pub capabilities: Vec<String>,
    pub network_ip: Option<String>,
    pub api_key: Option<String>,
    /// Seconds to wait for the first agreement.
    pub startup_timeout_secs: u64,
    /// Seconds one task (negotiation excluded) may take.
    pub task_timeout_secs: u64,
    /// Funding budget for one session.
    pub budget: f64,
    pub exit_on_no_proposals: bool,
    /// JSON file with offers served by the local marketplace backend.
    pub offers_path: Option<PathBuf>,
}

/// Timing of the synthetic idle step and the driver loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Pacing {
    /// Length of the idle step run after the benchmark command.
    pub idle_secs: u64,
    /// Wait between rounds.
    pub backoff_secs: u64,
    /// After a shutdown signal, exit forcefully if still running after this long.
    pub shutdown_grace_secs: u64,
    /// Stop after this many rounds even if work remains. Unlimited when unset.
    pub max_rounds: Option<u32>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let workload = Workload::default();
        Self {
            tasks_per_loop: 1,
            command: "octave --version".to_string(),
            duration: workload.duration,
            threads: workload.threads,
            limits: PriceLimits::default(),
            market: MarketConfig::default(),
            pacing: Pacing::default(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            payment_network: "polygon".to_string(),
            package: "24bab3823c46aeef0bd9991fdb13abc43152ffda3b32f3c2455abc8b".to_string(),
            min_cpu_cores: 1,
            min_mem_gib: 1.0,
            min_storage_gib: 1.0,
            min_cpu_threads: 1,
            capabilities: Vec::new(),
            network_ip: None,
            api_key: None,
            startup_timeout_secs: 60,
            task_timeout_secs: 300,
            budget: 10.0,
            exit_on_no_proposals: true,
            offers_path: None,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            idle_secs: 5,
            backoff_secs: 5,
            shutdown_grace_secs: 30,
            max_rounds: None,
        }
    }
}

/// Values from the command line that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub tasks_per_loop: Option<u32>,
    pub estimate_limit: Option<f64>,
    pub duration: Option<f64>,
    pub offers_path: Option<PathBuf>,
}

impl ProbeConfig {
    pub fn workload(&self) -> Workload {
        Workload {
            duration: self.duration,
            threads: self.threads,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tasks_per_loop == 0 {
            return Err(anyhow!("tasks_per_loop must be > 0"));
        }
        if self.command.trim().is_empty() {
            return Err(anyhow!("command must be non-empty"));
        }
        if !is_non_negative(self.duration) {
            return Err(anyhow!("duration must be a non-negative number"));
        }
        for (field, value) in [
            ("limits.start", self.limits.start),
            ("limits.cpu_per_sec", self.limits.cpu_per_sec),
            ("limits.env_per_sec", self.limits.env_per_sec),
            ("limits.estimate", self.limits.estimate),
        ] {
            if !is_non_negative(value) {
                return Err(anyhow!("{field} must be a non-negative number"));
            }
        }
        if self.market.task_timeout_secs == 0 {
            return Err(anyhow!("market.task_timeout_secs must be > 0"));
        }
        if self.pacing.max_rounds == Some(0) {
            return Err(anyhow!("pacing.max_rounds must be > 0 when set"));
        }
        if self.market.startup_timeout_secs == 0 {
            return Err(anyhow!("market.startup_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Apply command-line overrides to the base config and re-validate.
pub fn apply_overrides(mut base: ProbeConfig, overrides: &CliOverrides) -> Result<ProbeConfig> {
    if let Some(tasks) = overrides.tasks_per_loop {
        base.tasks_per_loop = tasks;
    }
    if let Some(limit) = overrides.estimate_limit {
        base.limits.estimate = limit;
    }
    if let Some(duration) = overrides.duration {
        base.duration = duration;
    }
    if let Some(path) = &overrides.offers_path {
        base.market.offers_path = Some(path.clone());
    }
    base.validate()?;
    Ok(base)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ProbeConfig::default()`.
pub fn load_config(path: &Path) -> Result<ProbeConfig> {
    if !path.exists() {
        let cfg = ProbeConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ProbeConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("check-node.toml");
        fs::write(
            &path,
            "command = \"stress-ng --matrix 0 -t 60s --metrics-brief\"\n\
             [limits]\n\
             estimate = 0.5\n\
             [pacing]\n\
             idle_secs = 0\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.command, "stress-ng --matrix 0 -t 60s --metrics-brief");
        assert_eq!(cfg.limits.estimate, 0.5);
        assert_eq!(cfg.limits.cpu_per_sec, 0.001);
        assert_eq!(cfg.pacing.idle_secs, 0);
        assert_eq!(cfg.pacing.backoff_secs, 5);
        assert_eq!(cfg.market.payment_network, "polygon");
    }

    #[test]
    fn serialized_default_parses_back() {
        let text = toml::to_string_pretty(&ProbeConfig::default()).expect("serialize");
        let parsed: ProbeConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, ProbeConfig::default());
    }

    #[test]
    fn rejects_zero_tasks_and_negative_limits() {
        let cfg = ProbeConfig {
            tasks_per_loop: 0,
            ..ProbeConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = ProbeConfig::default();
        cfg.limits.estimate = -1.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("limits.estimate"));
    }

    #[test]
    fn overrides_take_precedence() {
        let overrides = CliOverrides {
            tasks_per_loop: Some(4),
            estimate_limit: Some(0.25),
            duration: Some(30.0),
            offers_path: Some(PathBuf::from("offers.json")),
        };
        let cfg = apply_overrides(ProbeConfig::default(), &overrides).expect("apply");
        assert_eq!(cfg.tasks_per_loop, 4);
        assert_eq!(cfg.limits.estimate, 0.25);
        assert_eq!(cfg.workload().duration, 30.0);
        assert_eq!(cfg.market.offers_path, Some(PathBuf::from("offers.json")));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let overrides = CliOverrides {
            tasks_per_loop: Some(0),
            ..CliOverrides::default()
        };
        assert!(apply_overrides(ProbeConfig::default(), &overrides).is_err());
    }
}
