//! End-of-run console summary.

use crate::core::stats::{ScoreStats, score_stats};
use crate::core::types::ProbeMode;
use crate::state::StateSnapshot;

/// Counts for the mode-specific summary block.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeSummary {
    Whitelist {
        planned: usize,
        not_completed: usize,
        missed: Vec<String>,
    },
    BlacklistCount {
        initially_blacklisted: usize,
        tasks: u32,
        /// Distinct names blacklisted during the run.
        checked: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub mode: ModeSummary,
    pub failed: Vec<String>,
    pub results: usize,
    pub scores: Option<ScoreStats>,
}

/// Build the summary from the final state.
///
/// `input_names` is the number of names read from the target argument.
pub fn build_report(mode: ProbeMode, input_names: usize, snapshot: &StateSnapshot) -> Report {
    let mode = match mode {
        ProbeMode::Whitelist => ModeSummary::Whitelist {
            planned: input_names,
            not_completed: snapshot.names.whitelist_len(),
            missed: snapshot.names.whitelist().to_vec(),
        },
        ProbeMode::BlacklistCount { tasks } => ModeSummary::BlacklistCount {
            initially_blacklisted: input_names,
            tasks,
            checked: snapshot
                .names
                .unique_blacklist()
                .len()
                .saturating_sub(input_names),
        },
    };
    let scores: Vec<f64> = snapshot.results.iter().filter_map(|r| r.score).collect();
    Report {
        mode,
        failed: snapshot.failed.clone(),
        results: snapshot.results.len(),
        scores: score_stats(&scores),
    }
}

impl Report {
    /// Render the summary as console lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.mode {
            ModeSummary::Whitelist {
                planned,
                not_completed,
                missed,
            } => {
                lines.push(format!("Planned work on {planned} nodes:"));
                lines.push(format!("Not completed: {not_completed}"));
                lines.push(format!("Failed       : {}", self.failed.len()));
                lines.push(format!("Results      : {}", self.results));
                lines.extend(missed.iter().map(|name| format!("Missed node  : {name}")));
            }
            ModeSummary::BlacklistCount {
                initially_blacklisted,
                tasks,
                checked,
            } => {
                lines.push(format!("Initially blacklisted: {initially_blacklisted}"));
                lines.push(format!("Tasks to run         : {tasks}"));
                lines.push(format!("Failed               : {}", self.failed.len()));
                lines.push(format!("Checked              : {checked}"));
                lines.push(format!("Results              : {}", self.results));
            }
        }
        lines.extend(self.failed.iter().map(|name| format!("Failed node  : {name}")));

        let stat = |pick: fn(&ScoreStats) -> f64| {
            self.scores
                .as_ref()
                .map_or_else(|| "n/a".to_string(), |s| pick(s).to_string())
        };
        lines.push(format!("Average score: {}", stat(|s| s.mean)));
        lines.push(format!("Maximum score: {}", stat(|s| s.max)));
        lines.push(format!("Minimum score: {}", stat(|s| s.min)));
        lines.push(format!("Cumulative score: {}", stat(|s| s.sum)));
        lines.push(format!("Std deviation: {}", stat(|s| s.std_dev)));
        lines
    }
}
