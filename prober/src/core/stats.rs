//! Score statistics over the result log.

/// Aggregate of result scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

/// Summarize `scores`. Returns `None` for an empty input.
pub fn score_stats(scores: &[f64]) -> Option<ScoreStats> {
    if scores.is_empty() {
        return None;
    }
    let count = scores.len();
    let sum: f64 = scores.iter().sum();
    let mean = sum / count as f64;
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / count as f64;
    Some(ScoreStats {
        count,
        mean,
        min,
        max,
        sum,
        std_dev: variance.sqrt(),
    })
}
