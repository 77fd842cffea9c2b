//! Shared probe state: name lists, scores, proposal cache, result and failure logs.
//!
//! A single [`ProbeState`] is shared by every task of every round. All
//! mutation goes through one mutex so concurrent completions cannot lose
//! updates; the lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::core::bench::parse_stress_ng;
use crate::core::classifier::{ErrorClass, classify_error};
use crate::core::error::ProbeError;
use crate::core::filter::{FilterContext, FilterDecision, evaluate_offer};
use crate::core::names::NameLists;
use crate::core::scoring::{ScoreMap, select_best};
use crate::core::types::{
    CachedProposal, CommandResult, Offer, PriceLimits, ProviderIdentity, TaskRecord, Workload,
};

#[derive(Debug, Default)]
struct Inner {
    names: NameLists,
    scores: ScoreMap,
    proposals: HashMap<String, CachedProposal>,
    results: Vec<TaskRecord>,
    failed: Vec<String>,
}

/// Cloneable handle to the shared state.
#[derive(Debug, Clone, Default)]
pub struct ProbeState {
    inner: Arc<Mutex<Inner>>,
}

/// Point-in-time copy of the state, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub names: NameLists,
    pub results: Vec<TaskRecord>,
    pub failed: Vec<String>,
}

impl ProbeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only offers from `names` from now on.
    pub fn add_whitelist(&self, names: &[String]) {
        let mut inner = self.inner.lock();
        inner.names.add_whitelist(names.iter().cloned());
        info!(whitelist = ?inner.names.whitelist(), "will accept only proposals from whitelist");
    }

    pub fn add_blacklist(&self, names: &[String]) {
        let mut inner = self.inner.lock();
        inner.names.add_blacklist(names.iter().cloned());
        if names.len() > 1 {
            info!(blacklist = ?inner.names.blacklist(), "will not accept proposals from blacklist");
        } else {
            debug!(names = ?names, "blacklisted");
        }
    }

    pub fn remove_from_whitelist(&self, name: &str) -> bool {
        let removed = self.inner.lock().names.remove_from_whitelist(name);
        if removed {
            info!(name, "removed from whitelist");
        }
        removed
    }

    pub fn remove_from_blacklist(&self, name: &str) -> bool {
        let removed = self.inner.lock().names.remove_from_blacklist(name);
        if removed {
            info!(name, "removed from blacklist");
        }
        removed
    }

    pub fn whitelist_len(&self) -> usize {
        self.inner.lock().names.whitelist_len()
    }

    pub fn blacklist_len(&self) -> usize {
        self.inner.lock().names.blacklist_len()
    }

    pub fn whitelist_used(&self) -> bool {
        self.inner.lock().names.whitelist_used()
    }

    pub fn score_of(&self, provider_id: &str) -> Option<f64> {
        self.inner.lock().scores.get(provider_id).copied()
    }

    pub fn proposal_of(&self, provider_id: &str) -> Option<CachedProposal> {
        self.inner.lock().proposals.get(provider_id).cloned()
    }

    /// Evaluate `offer` against the current lists and record an acceptance.
    ///
    /// On accept the provider's score and cached proposal are overwritten.
    /// Evaluation and recording happen under one lock acquisition.
    pub fn filter_offer(
        &self,
        offer: &Offer,
        limits: &PriceLimits,
        workload: &Workload,
    ) -> FilterDecision {
        let mut inner = self.inner.lock();
        let decision = evaluate_offer(
            &FilterContext {
                names: &inner.names,
                limits,
                workload,
            },
            offer,
        );
        match decision {
            FilterDecision::Accept { estimate, score } => {
                let id = offer.provider.id.clone();
                inner.scores.insert(id.clone(), score);
                inner.proposals.insert(id, CachedProposal::from(offer));
                debug!(name = %offer.provider.name, estimate, score, "offer accepted");
            }
            FilterDecision::Reject(reason) => {
                debug!(name = %offer.provider.name, ?reason, "offer rejected");
            }
        }
        decision
    }

    /// Index of the lowest-scored candidate.
    pub fn select_offer(&self, candidates: &[Offer]) -> Option<usize> {
        let inner = self.inner.lock();
        let ids: Vec<&str> = candidates.iter().map(|o| o.provider.id.as_str()).collect();
        select_best(&inner.scores, &ids)
    }

    /// Record a completed task and mark the provider as handled.
    ///
    /// In whitelist mode the provider leaves the whitelist; otherwise it is
    /// blacklisted so it is not selected again.
    pub fn record_success(&self, provider: &ProviderIdentity, result: CommandResult) -> TaskRecord {
        let mut inner = self.inner.lock();
        if inner.names.whitelist_used() {
            if inner.names.remove_from_whitelist(&provider.name) {
                info!(name = %provider.name, "removed from whitelist");
            }
        } else {
            inner.names.add_blacklist([provider.name.clone()]);
        }

        let record = TaskRecord {
            name: provider.name.clone(),
            id: provider.id.clone(),
            score: inner.scores.get(&provider.id).copied(),
            bench: parse_stress_ng(&result.stdout),
            proposal: inner.proposals.get(&provider.id).cloned(),
            result,
            finished_at: Utc::now(),
        };
        inner.results.push(record.clone());
        record
    }

    /// Route an error into the lists. Never fails.
    ///
    /// A marketplace error naming a provider blacklists it, removes it from
    /// the whitelist in whitelist mode, and appends it to the failed log.
    /// Other errors are only logged.
    pub fn handle_error(&self, err: &ProbeError, task: Option<u32>) -> ErrorClass {
        let class = classify_error(err);
        match &class {
            ErrorClass::ProviderFault { provider_name } => {
                warn!(task = ?task, err = %err, "market error");
                info!(name = %provider_name, "provider caused error, blacklisting");
                let mut inner = self.inner.lock();
                inner.names.add_blacklist([provider_name.clone()]);
                if inner.names.whitelist_used() && inner.names.remove_from_whitelist(provider_name)
                {
                    info!(name = %provider_name, "removed from whitelist");
                }
                inner.failed.push(provider_name.clone());
            }
            ErrorClass::Unattributed => {
                warn!(task = ?task, err = %err, "market error");
            }
            ErrorClass::Generic => {
                error!(task = ?task, "generic error: {err:#}");
            }
        }
        class
    }

    pub fn results(&self) -> Vec<TaskRecord> {
        self.inner.lock().results.clone()
    }

    pub fn failed(&self) -> Vec<String> {
        self.inner.lock().failed.clone()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.inner.lock();
        StateSnapshot {
            names: inner.names.clone(),
            results: inner.results.clone(),
            failed: inner.failed.clone(),
        }
    }
}
