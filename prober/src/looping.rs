//! Multi-round driver for `check-node`.

use std::time::Duration;

use tracing::info;

use crate::core::quota::{initial_remaining, remaining_after_round};
use crate::core::types::ProbeMode;
use crate::io::config::ProbeConfig;
use crate::io::market::Marketplace;
use crate::io::signals::Shutdown;
use crate::round::{RoundOutcome, run_round};
use crate::state::ProbeState;

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// No work remains (whitelist drained or blacklist quota met).
    Complete,
    /// A shutdown signal arrived between rounds.
    Interrupted { remaining: u32 },
    /// The configured `pacing.max_rounds` was reached with work remaining.
    MaxRoundsExceeded { remaining: u32, max_rounds: u32 },
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub rounds: u32,
    pub stop: LoopStop,
}

/// Run rounds until no work remains, a shutdown is requested, or the round
/// limit is reached.
///
/// Shutdown is only sampled between rounds: after a round completes and
/// again after the backoff wait. The backoff itself ends early on shutdown.
pub async fn run_loop<M, F>(
    market: &M,
    state: &ProbeState,
    config: &ProbeConfig,
    mode: ProbeMode,
    shutdown: &Shutdown,
    mut on_round: F,
) -> LoopOutcome
where
    M: Marketplace + ?Sized,
    F: FnMut(u32, &RoundOutcome),
{
    let backoff = Duration::from_secs(config.pacing.backoff_secs);
    let mut remaining = initial_remaining(mode, state.whitelist_len());
    let mut rounds = 0u32;

    loop {
        let round = run_round(market, state, config, remaining).await;
        rounds += 1;
        on_round(rounds, &round);

        remaining =
            remaining_after_round(mode, remaining, config.tasks_per_loop, state.whitelist_len());
        info!(blacklisted = state.blacklist_len(), "nodes blacklisted");

        if remaining == 0 {
            return LoopOutcome {
                rounds,
                stop: LoopStop::Complete,
            };
        }
        info!(remaining, "tasks still to do");

        if shutdown.is_requested() {
            return LoopOutcome {
                rounds,
                stop: LoopStop::Interrupted { remaining },
            };
        }
        if let Some(max_rounds) = config.pacing.max_rounds {
            if rounds >= max_rounds {
                return LoopOutcome {
                    rounds,
                    stop: LoopStop::MaxRoundsExceeded {
                        remaining,
                        max_rounds,
                    },
                };
            }
        }

        info!(backoff_secs = backoff.as_secs(), "more nodes to check, waiting");
        let mut waiter = shutdown.clone();
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            _ = waiter.requested() => {}
        }
        if shutdown.is_requested() {
            return LoopOutcome {
                rounds,
                stop: LoopStop::Interrupted { remaining },
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PriceLimits;
    use crate::io::signals::shutdown_channel;
    use crate::test_support::{Scripted, ScriptedMarketplace, offer};

    fn config(tasks_per_loop: u32) -> ProbeConfig {
        let mut cfg = ProbeConfig {
            tasks_per_loop,
            ..ProbeConfig::default()
        };
        cfg.limits = PriceLimits {
            start: 10.0,
            cpu_per_sec: 1.0,
            env_per_sec: 1.0,
            estimate: 100.0,
        };
        cfg
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn whitelist_of_two_converges_in_two_rounds() {
        let market = ScriptedMarketplace::new(vec![
            offer("0x01", "nodeA", 0.0, 0.0, 0.0),
            offer("0x02", "nodeB", 0.1, 0.0, 0.0),
        ]);
        let state = ProbeState::new();
        state.add_whitelist(&names(&["nodeA", "nodeB"]));
        let (_trigger, shutdown) = shutdown_channel();

        let mut after_round = Vec::new();
        let outcome = run_loop(
            &market,
            &state,
            &config(1),
            ProbeMode::Whitelist,
            &shutdown,
            |_, _| {
                let whitelist = state.snapshot().names.whitelist().to_vec();
                after_round.push((whitelist, state.results().len()));
            },
        )
        .await;

        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.stop, LoopStop::Complete);
        assert_eq!(
            after_round,
            vec![(names(&["nodeB"]), 1), (Vec::<String>::new(), 2)]
        );
        assert_eq!(market.opened(), 2);
        assert_eq!(market.released(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn blacklist_count_mode_runs_quota() {
        let market = ScriptedMarketplace::new(vec![
            offer("0x01", "nodeA", 0.0, 0.0, 0.0),
            offer("0x02", "nodeB", 0.0, 0.0, 0.0),
            offer("0x03", "nodeC", 0.0, 0.0, 0.0),
            offer("0x04", "nodeD", 0.0, 0.0, 0.0),
        ]);
        let state = ProbeState::new();
        state.add_blacklist(&names(&["nodeA"]));
        let (_trigger, shutdown) = shutdown_channel();

        let outcome = run_loop(
            &market,
            &state,
            &config(2),
            ProbeMode::BlacklistCount { tasks: 3 },
            &shutdown,
            |_, _| {},
        )
        .await;

        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.stop, LoopStop::Complete);
        assert_eq!(state.results().len(), 3);
        assert_eq!(state.snapshot().names.unique_blacklist().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_provider_is_not_retried() {
        let market = ScriptedMarketplace::new(vec![offer("0x01", "nodeA", 0.0, 0.0, 0.0)])
            .script("nodeA", vec![Scripted::ProviderFault("deploy failed".to_string())]);
        let state = ProbeState::new();
        state.add_whitelist(&names(&["nodeA"]));
        let (_trigger, shutdown) = shutdown_channel();

        let outcome = run_loop(
            &market,
            &state,
            &config(1),
            ProbeMode::Whitelist,
            &shutdown,
            |_, _| {},
        )
        .await;

        assert_eq!(outcome.stop, LoopStop::Complete);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(state.failed(), vec!["nodeA"]);
        assert!(state.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_after_current_round() {
        let market = ScriptedMarketplace::new(vec![
            offer("0x01", "nodeA", 0.0, 0.0, 0.0),
            offer("0x02", "nodeB", 0.1, 0.0, 0.0),
        ]);
        let state = ProbeState::new();
        state.add_whitelist(&names(&["nodeA", "nodeB"]));
        let (trigger, shutdown) = shutdown_channel();

        let outcome = run_loop(
            &market,
            &state,
            &config(1),
            ProbeMode::Whitelist,
            &shutdown,
            |_, _| trigger.trigger(),
        )
        .await;

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.stop, LoopStop::Interrupted { remaining: 1 });
        assert_eq!(market.released(), 1);
        assert_eq!(state.results().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn max_rounds_bounds_a_stalled_whitelist() {
        let market = ScriptedMarketplace::new(Vec::new());
        let state = ProbeState::new();
        state.add_whitelist(&names(&["ghost"]));
        let (_trigger, shutdown) = shutdown_channel();
        let mut cfg = config(1);
        cfg.pacing.max_rounds = Some(3);

        let outcome = run_loop(
            &market,
            &state,
            &cfg,
            ProbeMode::Whitelist,
            &shutdown,
            |_, _| {},
        )
        .await;

        assert_eq!(outcome.rounds, 3);
        assert_eq!(
            outcome.stop,
            LoopStop::MaxRoundsExceeded {
                remaining: 1,
                max_rounds: 3
            }
        );
    }
}
