//! Marketplace abstraction.
//!
//! The [`Marketplace`] trait decouples round orchestration from the platform
//! that negotiates leases and runs remote commands. A session is opened per
//! round with a [`SessionConfig`] that carries the offer filter and selector
//! hooks; tests use scripted marketplaces that return predetermined runs.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::error::ProbeError;
use crate::core::types::{CommandResult, Offer, ProviderIdentity};
use crate::io::config::MarketConfig;

/// Hook invoked once per incoming offer.
pub trait OfferFilter: Send + Sync {
    fn accept(&self, offer: &Offer) -> bool;
}

/// Hook that picks one of the accepted offers. Returns an index into `candidates`.
pub trait OfferSelector: Send + Sync {
    fn select(&self, candidates: &[Offer]) -> Option<usize>;
}

/// Per-round session configuration.
///
/// Built fresh for every round from the base [`MarketConfig`] plus round
/// overrides, and never mutated afterwards.
#[derive(Clone)]
pub struct SessionConfig {
    pub market: MarketConfig,
    pub max_parallel_tasks: u32,
    pub max_task_retries: u32,
    pub filter: Arc<dyn OfferFilter>,
    pub selector: Arc<dyn OfferSelector>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("market", &self.market)
            .field("max_parallel_tasks", &self.max_parallel_tasks)
            .field("max_task_retries", &self.max_task_retries)
            .finish_non_exhaustive()
    }
}

/// Outputs of one batch run on a leased provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRun {
    pub provider: ProviderIdentity,
    /// One entry per batch command, in batch order.
    pub results: Vec<CommandResult>,
}

/// Abstraction over marketplace backends.
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Open a session for one round.
    async fn open(&self, config: SessionConfig) -> Result<Box<dyn Session>, ProbeError>;
}

/// A leased execution context shared by the tasks of one round.
#[async_trait]
pub trait Session: Send + Sync {
    /// Lease a provider through the session's filter and selector, then run
    /// `batch` on it. `Ok(None)` means the batch finished without output.
    async fn run(&self, batch: &[String]) -> Result<Option<TaskRun>, ProbeError>;

    /// Release all leases held by the session. Consumes the session.
    async fn release(self: Box<Self>) -> Result<(), ProbeError>;
}

/// Negotiate one lease from `offers`.
///
/// Offers from providers already in `leased` are skipped. Every other offer
/// goes through the filter; the selector picks among the accepted ones and
/// the winner's provider id is added to `leased`.
pub fn negotiate<'a>(
    offers: &'a [Offer],
    leased: &mut HashSet<String>,
    config: &SessionConfig,
) -> Option<&'a Offer> {
    let candidates: Vec<&Offer> = offers
        .iter()
        .filter(|offer| !leased.contains(&offer.provider.id))
        .filter(|offer| config.filter.accept(offer))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let owned: Vec<Offer> = candidates.iter().map(|offer| (*offer).clone()).collect();
    let chosen = candidates.get(config.selector.select(&owned)?)?;
    leased.insert(chosen.provider.id.clone());
    Some(*chosen)
}
