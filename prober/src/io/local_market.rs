//! Marketplace backend that runs batches on the local machine.
//!
//! Offers are read from a JSON array; each entry is a full [`Offer`] plus an
//! optional `fail` flag that makes the provider reject every activity. Leased
//! batches run through `sh -c`, one command at a time, each bounded by
//! `task_timeout_secs`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::core::error::ProbeError;
use crate::core::types::{CommandResult, Offer, ProviderIdentity};
use crate::io::market::{Marketplace, Session, SessionConfig, TaskRun, negotiate};

#[derive(Debug, Clone, Deserialize)]
struct LocalOffer {
    #[serde(flatten)]
    offer: Offer,
    #[serde(default)]
    fail: bool,
}

/// Offer set shared by every session opened on this marketplace.
#[derive(Debug, Clone, Default)]
pub struct LocalMarketplace {
    offers: Arc<Vec<Offer>>,
    failing: Arc<HashSet<String>>,
}

impl LocalMarketplace {
    /// Load offers from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read offers file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse offers file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: Vec<LocalOffer> = serde_json::from_str(raw).context("parse offers json")?;
        let failing = entries
            .iter()
            .filter(|entry| entry.fail)
            .map(|entry| entry.offer.provider.id.clone())
            .collect();
        Ok(Self {
            offers: Arc::new(entries.into_iter().map(|entry| entry.offer).collect()),
            failing: Arc::new(failing),
        })
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }
}

#[async_trait]
impl Marketplace for LocalMarketplace {
    #[instrument(skip_all, fields(offers = self.offers.len()))]
    async fn open(&self, config: SessionConfig) -> Result<Box<dyn Session>, ProbeError> {
        if self.offers.is_empty() && config.market.exit_on_no_proposals {
            return Err(ProbeError::from(anyhow!("no offers on the market")));
        }
        debug!(
            max_parallel_tasks = config.max_parallel_tasks,
            "opened local session"
        );
        let permits = usize::try_from(config.max_parallel_tasks.max(1)).unwrap_or(1);
        Ok(Box::new(LocalSession {
            market: self.clone(),
            timeout: Duration::from_secs(config.market.task_timeout_secs),
            config,
            leased: Mutex::new(HashSet::new()),
            permits: Semaphore::new(permits),
        }))
    }
}

struct LocalSession {
    market: LocalMarketplace,
    config: SessionConfig,
    timeout: Duration,
    leased: Mutex<HashSet<String>>,
    permits: Semaphore,
}

#[async_trait]
impl Session for LocalSession {
    async fn run(&self, batch: &[String]) -> Result<Option<TaskRun>, ProbeError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|err| ProbeError::from(anyhow!(err).context("acquire task slot")))?;

        let provider = {
            let mut leased = self.leased.lock();
            negotiate(&self.market.offers, &mut leased, &self.config)
                .map(|offer| offer.provider.clone())
        };
        let Some(provider) = provider else {
            return Err(ProbeError::market("no offers accepted", None));
        };
        info!(name = %provider.name, id = %provider.id, "leased provider");

        if self.market.failing.contains(&provider.id) {
            return Err(ProbeError::market(
                "provider rejected the activity",
                Some(provider),
            ));
        }

        let mut results = Vec::with_capacity(batch.len());
        for (index, command) in batch.iter().enumerate() {
            results.push(run_command(&provider, index, command, self.timeout).await?);
        }
        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(TaskRun { provider, results }))
    }

    async fn release(self: Box<Self>) -> Result<(), ProbeError> {
        let leased = self.leased.lock().len();
        info!(leased, "released local session");
        Ok(())
    }
}

#[instrument(skip_all, fields(name = %provider.name, index))]
async fn run_command(
    provider: &ProviderIdentity,
    index: usize,
    command: &str,
    timeout: Duration,
) -> Result<CommandResult, ProbeError> {
    debug!(command, "running command");
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(output) => output
            .with_context(|| format!("spawn `{command}`"))
            .map_err(ProbeError::from)?,
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
            return Err(ProbeError::market(
                format!("command `{command}` timed out after {}s", timeout.as_secs()),
                Some(provider.clone()),
            ));
        }
    };

    let result = CommandResult {
        index,
        command: command.to_string(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !output.status.success() {
        return Err(ProbeError::market(
            format!(
                "command `{command}` exited with {:?}: {}",
                result.exit_code,
                result.stderr.trim()
            ),
            Some(provider.clone()),
        ));
    }
    Ok(result)
}
