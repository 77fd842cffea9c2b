//! Test-only helpers: offer builders and a scripted marketplace.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::error::ProbeError;
use crate::core::types::{CommandResult, Offer, Pricing, ProviderIdentity};
use crate::io::market::{Marketplace, Session, SessionConfig, TaskRun, negotiate};

pub fn provider(id: &str, name: &str) -> ProviderIdentity {
    ProviderIdentity {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// Single-thread offer with the given linear prices.
pub fn offer(id: &str, name: &str, start: f64, cpu_per_sec: f64, env_per_sec: f64) -> Offer {
    Offer {
        provider: provider(id, name),
        wallet: format!("wallet-{id}"),
        threads: Some(1),
        usage_vector: vec![
            "golem.usage.cpu_sec".to_string(),
            "golem.usage.duration_sec".to_string(),
        ],
        pricing: Pricing {
            start,
            cpu_per_sec,
            env_per_sec,
        },
    }
}

pub fn command_result(stdout: &str) -> CommandResult {
    CommandResult {
        index: 0,
        command: "octave --version".to_string(),
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// What a scripted provider does when leased.
#[derive(Debug, Clone)]
pub enum Scripted {
    Output(String),
    NoOutput,
    /// Market error attributed to the leased provider.
    ProviderFault(String),
    /// Market error with no provider attached.
    Unattributed(String),
    Generic(String),
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    released: AtomicUsize,
    runs: AtomicUsize,
}

/// Marketplace double serving a fixed offer set.
///
/// Each provider name maps to a queue of scripted behaviors; an exhausted or
/// missing queue answers with `Output("ok")`.
#[derive(Clone, Default)]
pub struct ScriptedMarketplace {
    offers: Vec<Offer>,
    scripts: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    fail_open: bool,
    counters: Arc<Counters>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    configs: Arc<Mutex<Vec<SessionConfig>>>,
}

impl ScriptedMarketplace {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self {
            offers,
            ..Self::default()
        }
    }

    pub fn script(self, name: &str, steps: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .insert(name.to_string(), steps.into_iter().collect());
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.counters.runs.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    pub fn session_configs(&self) -> Vec<SessionConfig> {
        self.configs.lock().clone()
    }

    fn next_step(&self, name: &str) -> Scripted {
        self.scripts
            .lock()
            .get_mut(name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Scripted::Output("ok".to_string()))
    }
}

#[async_trait]
impl Marketplace for ScriptedMarketplace {
    async fn open(&self, config: SessionConfig) -> Result<Box<dyn Session>, ProbeError> {
        if self.fail_open {
            return Err(ProbeError::from(anyhow!("yagna daemon unreachable")));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().push(config.clone());
        Ok(Box::new(ScriptedSession {
            market: self.clone(),
            config,
            leased: Mutex::new(HashSet::new()),
        }))
    }
}

struct ScriptedSession {
    market: ScriptedMarketplace,
    config: SessionConfig,
    leased: Mutex<HashSet<String>>,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn run(&self, batch: &[String]) -> Result<Option<TaskRun>, ProbeError> {
        self.market.counters.runs.fetch_add(1, Ordering::SeqCst);
        self.market.batches.lock().push(batch.to_vec());
        let chosen = {
            let mut leased = self.leased.lock();
            negotiate(&self.market.offers, &mut leased, &self.config).cloned()
        };
        let Some(offer) = chosen else {
            return Err(ProbeError::market("no offers accepted", None));
        };
        // Yield so sibling tasks interleave like real negotiations do.
        tokio::task::yield_now().await;
        match self.market.next_step(&offer.provider.name) {
            Scripted::Output(stdout) => Ok(Some(TaskRun {
                provider: offer.provider.clone(),
                results: batch
                    .iter()
                    .enumerate()
                    .map(|(index, command)| CommandResult {
                        index,
                        command: command.clone(),
                        exit_code: Some(0),
                        stdout: if index == 0 {
                            stdout.clone()
                        } else {
                            String::new()
                        },
                        stderr: String::new(),
                    })
                    .collect(),
            })),
            Scripted::NoOutput => Ok(None),
            Scripted::ProviderFault(message) => {
                Err(ProbeError::market(message, Some(offer.provider.clone())))
            }
            Scripted::Unattributed(message) => Err(ProbeError::market(message, None)),
            Scripted::Generic(message) => Err(ProbeError::from(anyhow!(message))),
        }
    }

    async fn release(self: Box<Self>) -> Result<(), ProbeError> {
        self.market.counters.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
