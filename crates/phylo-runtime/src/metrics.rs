//! Generation statistics derived from the fitness history.
//!
//! The history (one list of fitness values per generation) is the only
//! input, so the same numbers can be produced for a live population or a
//! restored session.

use serde::Serialize;
use std::fmt;

/// Default fraction of a generation counted as its elite.
pub const DEFAULT_ELITE_FRACTION: f64 = 0.25;

/// Statistics of one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub size: usize,
    pub best: f64,
    pub mean: f64,
    /// Mean of the best `elite_fraction` of the generation (at least one genome).
    pub elite_mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>5} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            self.generation, self.size, self.best, self.mean, self.elite_mean, self.std_dev
        )
    }
}

/// Statistics for every generation, using [`DEFAULT_ELITE_FRACTION`].
pub fn compute(history: &[Vec<f64>]) -> Vec<GenerationStats> {
    compute_with_elite(history, DEFAULT_ELITE_FRACTION)
}

/// Statistics for every generation with a custom elite fraction.
///
/// Empty generations are skipped.
pub fn compute_with_elite(history: &[Vec<f64>], elite_fraction: f64) -> Vec<GenerationStats> {
    history
        .iter()
        .enumerate()
        .filter(|(_, scores)| !scores.is_empty())
        .map(|(generation, scores)| generation_stats(generation, scores, elite_fraction))
        .collect()
}

fn generation_stats(generation: usize, scores: &[f64], elite_fraction: f64) -> GenerationStats {
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.total_cmp(a));
    let elite = ((elite_fraction.clamp(0.0, 1.0) * n).ceil() as usize).clamp(1, ranked.len());
    let elite_mean = ranked[..elite].iter().sum::<f64>() / elite as f64;

    GenerationStats {
        generation,
        size: scores.len(),
        best: ranked[0],
        mean,
        elite_mean,
        std_dev: variance.sqrt(),
    }
}

/// Column header matching the `Display` layout of [`GenerationStats`].
pub fn header() -> String {
    format!(
        "{:>5} {:>6} {:>10} {:>10} {:>10} {:>10}",
        "gen", "size", "best", "mean", "elite", "std"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_per_generation_statistics() {
        let history = vec![vec![1.0, 2.0, 3.0, 4.0], vec![2.0, 2.0]];
        let stats = compute(&history);
        assert_eq!(stats.len(), 2);

        let first = &stats[0];
        assert_eq!(first.best, 4.0);
        assert_eq!(first.mean, 2.5);
        assert_eq!(first.elite_mean, 4.0);
        assert!((first.std_dev - 1.25f64.sqrt()).abs() < 1e-12);

        let second = &stats[1];
        assert_eq!(second.generation, 1);
        assert_eq!(second.std_dev, 0.0);
    }

    #[test]
    fn elite_fraction_is_at_least_one_genome() {
        let stats = compute_with_elite(&[vec![1.0, 5.0, 3.0]], 0.0);
        assert_eq!(stats[0].elite_mean, 5.0);
        let stats = compute_with_elite(&[vec![1.0, 5.0, 3.0]], 1.0);
        assert_eq!(stats[0].elite_mean, 3.0);
    }

    #[test]
    fn empty_generations_are_skipped() {
        let stats = compute(&[vec![], vec![1.0]]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].generation, 1);
    }
}
