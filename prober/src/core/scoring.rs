//! Provider scoring and offer ranking.
//!
//! Scores map an estimated cost into `[0, 1)`. Lower scores are preferred.

use std::collections::HashMap;

/// Provider id -> score.
pub type ScoreMap = HashMap<String, f64>;

/// Score for a non-negative estimated cost: `1 - 1/(1 + cost)`.
pub fn score(cost: f64) -> f64 {
    1.0 - 1.0 / (1.0 + cost)
}

/// Pick the candidate with the lowest score.
///
/// Candidates without a score rank after every scored one. Ties keep the
/// earliest candidate. Returns the index into `candidate_ids`.
pub fn select_best<S: AsRef<str>>(scores: &ScoreMap, candidate_ids: &[S]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, id) in candidate_ids.iter().enumerate() {
        let value = scores.get(id.as_ref()).copied().unwrap_or(f64::INFINITY);
        match best {
            Some((_, current)) if value >= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}
