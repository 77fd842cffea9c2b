//! One bounded round of concurrent probe tasks.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::core::quota::tasks_for_round;
use crate::core::types::{Offer, PriceLimits, Workload};
use crate::io::config::ProbeConfig;
use crate::io::market::{Marketplace, OfferFilter, OfferSelector, Session, SessionConfig};
use crate::state::ProbeState;

/// Offer filter backed by the shared state.
pub struct StateFilter {
    state: ProbeState,
    limits: PriceLimits,
    workload: Workload,
}

impl OfferFilter for StateFilter {
    fn accept(&self, offer: &Offer) -> bool {
        self.state
            .filter_offer(offer, &self.limits, &self.workload)
            .is_accept()
    }
}

/// Offer selector preferring the lowest recorded score.
pub struct ScoreSelector {
    state: ProbeState,
}

impl OfferSelector for ScoreSelector {
    fn select(&self, candidates: &[Offer]) -> Option<usize> {
        self.state.select_offer(candidates)
    }
}

/// Build the session configuration for one round.
///
/// The base config is left untouched; round-specific values (concurrency
/// ceiling, hooks, no retries) exist only in the returned value.
pub fn session_config(config: &ProbeConfig, state: &ProbeState) -> SessionConfig {
    SessionConfig {
        market: config.market.clone(),
        max_parallel_tasks: config.tasks_per_loop,
        max_task_retries: 0,
        filter: Arc::new(StateFilter {
            state: state.clone(),
            limits: config.limits,
            workload: config.workload(),
        }),
        selector: Arc::new(ScoreSelector {
            state: state.clone(),
        }),
    }
}

/// Commands run on each leased provider: the benchmark, then the idle step.
pub fn task_batch(config: &ProbeConfig) -> Vec<String> {
    vec![
        config.command.clone(),
        format!("sleep {}s", config.pacing.idle_secs),
    ]
}

/// How a single task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    NoOutput,
    Failed,
}

/// Summary of one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    pub dispatched: u32,
    pub succeeded: u32,
    pub no_output: u32,
    pub failed: u32,
    /// The session could not be opened; no task ran.
    pub setup_failed: bool,
}

/// Run one round of at most `min(tasks_per_loop, max_tasks)` concurrent tasks.
///
/// Task failures are classified into the shared state and never abort
/// sibling tasks. The session is released exactly once whenever it was
/// opened, including when no task is dispatched.
#[instrument(skip_all, fields(max_tasks = max_tasks))]
pub async fn run_round<M: Marketplace + ?Sized>(
    market: &M,
    state: &ProbeState,
    config: &ProbeConfig,
    max_tasks: u32,
) -> RoundOutcome {
    let tasks = tasks_for_round(config.tasks_per_loop, max_tasks);

    let session = match market.open(session_config(config, state)).await {
        Ok(session) => session,
        Err(err) => {
            state.handle_error(&err, None);
            return RoundOutcome {
                setup_failed: true,
                ..RoundOutcome::default()
            };
        }
    };

    info!(tasks, "initiating tasks");
    let batch = task_batch(config);
    let statuses = join_all(
        (1..=tasks).map(|task| run_task(session.as_ref(), state, &batch, task)),
    )
    .await;

    if let Err(err) = session.release().await {
        state.handle_error(&err, None);
    }

    let mut outcome = RoundOutcome {
        dispatched: tasks,
        ..RoundOutcome::default()
    };
    for status in statuses {
        match status {
            TaskStatus::Succeeded => outcome.succeeded += 1,
            TaskStatus::NoOutput => outcome.no_output += 1,
            TaskStatus::Failed => outcome.failed += 1,
        }
    }
    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        no_output = outcome.no_output,
        "completed task loop"
    );
    outcome
}

async fn run_task(
    session: &dyn Session,
    state: &ProbeState,
    batch: &[String],
    task: u32,
) -> TaskStatus {
    debug!(task, "starting task");
    match session.run(batch).await {
        Ok(Some(run)) => {
            let Some(first) = run.results.into_iter().next() else {
                warn!(task, name = %run.provider.name, "task returned an empty batch result");
                return TaskStatus::NoOutput;
            };
            let record = state.record_success(&run.provider, first);
            info!(task, name = %record.name, score = ?record.score, "task finished");
            TaskStatus::Succeeded
        }
        Ok(None) => {
            info!(task, "task ended without providing result");
            TaskStatus::NoOutput
        }
        Err(err) => {
            state.handle_error(&err, Some(task));
            TaskStatus::Failed
        }
    }
}
