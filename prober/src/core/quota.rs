//! Remaining-work arithmetic for the round driver.

use crate::core::types::ProbeMode;

/// Work left before the first round.
pub fn initial_remaining(mode: ProbeMode, whitelist_len: usize) -> u32 {
    match mode {
        ProbeMode::Whitelist => saturating_u32(whitelist_len),
        ProbeMode::BlacklistCount { tasks } => tasks,
    }
}

/// Number of tasks to dispatch in the next round.
pub fn tasks_for_round(tasks_per_loop: u32, remaining: u32) -> u32 {
    tasks_per_loop.min(remaining)
}

/// Work left after a round.
///
/// Whitelist mode re-reads the whitelist, so failed and skipped providers
/// are accounted for by the lists themselves. Blacklist-count mode assumes a
/// full round ran and clamps at zero.
pub fn remaining_after_round(
    mode: ProbeMode,
    remaining: u32,
    tasks_per_loop: u32,
    whitelist_len: usize,
) -> u32 {
    match mode {
        ProbeMode::Whitelist => saturating_u32(whitelist_len),
        ProbeMode::BlacklistCount { .. } => remaining.saturating_sub(tasks_per_loop),
    }
}

fn saturating_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
