//! Per-trial results and aggregated statistics

use serde::{Deserialize, Serialize};

/// Result of a single trial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimResult {
    /// Total time cost to clear every location
    pub total_cost: i64,
    /// Locations in the order they were cleared
    pub clear_order: Vec<usize>,
    pub hops: u64,
    pub reloads: u64,
    pub laps: u64,
}

/// Aggregated statistics across many trials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub trials: usize,
    /// Estimated expected cost (sample mean)
    pub avg_cost: f64,
    pub std_cost: f64,
    /// Standard error of the mean, shrinks as 1/sqrt(trials)
    pub std_error: f64,
    pub min_cost: i64,
    pub max_cost: i64,
    pub avg_hops: f64,
    pub avg_reloads: f64,
    pub avg_laps: f64,
    /// Mean 1-based position of each location in the clear order, over the
    /// trials that cleared it. `None` for locations never cleared.
    pub avg_clear_position: Vec<Option<f64>>,
}

impl AggregatedStats {
    /// Aggregate trial results. `location_count` sizes the per-location table.
    pub fn from_results(results: &[SimResult], location_count: usize) -> Self {
        if results.is_empty() {
            return Self {
                avg_clear_position: vec![None; location_count],
                ..Self::default()
            };
        }

        let n = results.len() as f64;
        // Summed as integers so the mean matches a plain running total exactly
        let sum: i128 = results.iter().map(|r| r.total_cost as i128).sum();
        let avg_cost = sum as f64 / n;

        let variance = results
            .iter()
            .map(|r| (r.total_cost as f64 - avg_cost).powi(2))
            .sum::<f64>()
            / n;
        let std_cost = variance.sqrt();

        let mut position_sums = vec![0.0; location_count];
        let mut position_counts = vec![0usize; location_count];
        for r in results {
            for (pos, &loc) in r.clear_order.iter().enumerate() {
                if loc < location_count {
                    position_sums[loc] += (pos + 1) as f64;
                    position_counts[loc] += 1;
                }
            }
        }
        let avg_clear_position = position_sums
            .iter()
            .zip(&position_counts)
            .map(|(&s, &c)| if c > 0 { Some(s / c as f64) } else { None })
            .collect();

        let mean = |f: fn(&SimResult) -> u64| results.iter().map(f).sum::<u64>() as f64 / n;

        Self {
            trials: results.len(),
            avg_cost,
            std_cost,
            std_error: std_cost / n.sqrt(),
            min_cost: results.iter().map(|r| r.total_cost).min().unwrap_or(0),
            max_cost: results.iter().map(|r| r.total_cost).max().unwrap_or(0),
            avg_hops: mean(|r| r.hops),
            avg_reloads: mean(|r| r.reloads),
            avg_laps: mean(|r| r.laps),
            avg_clear_position,
        }
    }
}
