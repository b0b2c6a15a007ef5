//! Monte Carlo driver - runs independent trials and aggregates them

use crate::budget::ReloadBudget;
use crate::config::{ConfigError, SimConfig};
use crate::events::{FastRng, RollSource};
use crate::graph::TravelGraph;
use crate::location::{init_locations, Location};
use crate::stats::{AggregatedStats, SimResult};
use crate::walker::{CycleWalker, WalkStats};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

/// A validated scenario with its read-only tables built once per run
#[derive(Debug, Clone)]
pub struct Scenario {
    config: SimConfig,
    graph: TravelGraph,
    budget: ReloadBudget,
}

impl Scenario {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let graph = config.graph();
        let budget = config.budget();
        Ok(Self { config, graph, budget })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn graph(&self) -> &TravelGraph {
        &self.graph
    }

    pub fn budget(&self) -> &ReloadBudget {
        &self.budget
    }

    /// Add permanent exclusions on top of the configured ones
    pub fn exclude(&mut self, locations: &[usize]) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        config.excluded.extend_from_slice(locations);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Fresh location states for one trial
    pub fn fresh_locations(&self) -> Vec<Location> {
        let mut locations = Vec::new();
        self.reset_locations(&mut locations);
        locations
    }

    fn reset_locations(&self, locations: &mut Vec<Location>) {
        init_locations(locations, &self.config.events, &self.config.excluded);
    }

    fn walker(&self) -> CycleWalker<'_> {
        self.config.walker(&self.graph, &self.budget)
    }
}

/// Seed of the `index`-th trial of a run seeded with `base`.
/// Sequential and parallel runs derive identical per-trial seeds.
#[inline(always)]
pub fn trial_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

/// Run a single trial with a random seed
pub fn run_trial(scenario: &Scenario) -> SimResult {
    run_trial_with_seed(scenario, rand::random::<u64>())
}

/// Run a single trial with a specific seed
pub fn run_trial_with_seed(scenario: &Scenario, seed: u64) -> SimResult {
    let mut rng = FastRng::new(seed);
    let mut locations = Vec::new();
    run_trial_with_rng(scenario, &mut locations, &mut rng)
}

/// Run a trial with a specific roll source, reusing `locations` as scratch space.
/// Locations are fully reinitialized first, so nothing carries over between trials.
pub fn run_trial_with_rng<R: RollSource>(
    scenario: &Scenario,
    locations: &mut Vec<Location>,
    rng: &mut R,
) -> SimResult {
    scenario.reset_locations(locations);

    let mut walk = WalkStats::default();
    let start = scenario.config.start_location();
    let total_cost = scenario.walker().clear_one_cycle(locations, start, rng, &mut walk);

    SimResult {
        total_cost,
        clear_order: walk.clear_order,
        hops: walk.hops,
        reloads: walk.reloads,
        laps: walk.laps,
    }
}

/// Run multiple trials in parallel, one independent RNG per trial
pub fn run_trials_parallel(
    scenario: &Scenario,
    count: usize,
    seed: u64,
    threads: Option<usize>,
) -> Vec<SimResult> {
    let threads = threads.unwrap_or_else(num_cpus::get).max(1);

    let run = || -> Vec<SimResult> {
        (0..count)
            .into_par_iter()
            .map_init(Vec::new, |locations, i| {
                let mut rng = FastRng::new(trial_seed(seed, i));
                run_trial_with_rng(scenario, locations, &mut rng)
            })
            .collect()
    };

    match ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(run),
        Err(e) => {
            warn!(error = %e, "failed to build thread pool, using the global pool");
            run()
        }
    }
}

/// Run multiple trials sequentially
pub fn run_trials_sequential(scenario: &Scenario, count: usize, seed: u64) -> Vec<SimResult> {
    let mut locations = Vec::new();
    (0..count)
        .map(|i| {
            let mut rng = FastRng::new(trial_seed(seed, i));
            run_trial_with_rng(scenario, &mut locations, &mut rng)
        })
        .collect()
}

/// Options for a full run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub trials: usize,
    pub parallel: bool,
    /// Base seed; random when unset
    pub seed: Option<u64>,
    /// Worker threads for parallel runs; all cores when unset
    pub threads: Option<usize>,
}

/// Run trials and return aggregated stats
pub fn run_and_aggregate(scenario: &Scenario, options: &RunOptions) -> AggregatedStats {
    let seed = options.seed.unwrap_or_else(rand::random::<u64>);
    info!(trials = options.trials, parallel = options.parallel, seed, "starting run");

    let results = if options.parallel {
        run_trials_parallel(scenario, options.trials, seed, options.threads)
    } else {
        run_trials_sequential(scenario, options.trials, seed)
    };
    debug!(completed = results.len(), "trials finished");

    let stats = AggregatedStats::from_results(&results, scenario.config.location_count());
    info!(estimate = stats.avg_cost, std_error = stats.std_error, "run complete");
    stats
}

/// Estimated expected cost to clear every location
pub fn estimate_cost(scenario: &Scenario, options: &RunOptions) -> f64 {
    run_and_aggregate(scenario, options).avg_cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ScriptedRolls;

    fn two_node_scenario() -> Scenario {
        let config = SimConfig {
            losses: vec![vec![0, 10], vec![10, 0]],
            gains: vec![vec![0, 0], vec![0, 0]],
            events: vec![vec![0], vec![1000]],
            start: Some(0),
            station: Some(0),
            ..SimConfig::default()
        };
        Scenario::new(config).unwrap()
    }

    #[test]
    fn test_trial_with_scripted_rolls() {
        let scenario = two_node_scenario();
        let mut locations = Vec::new();
        let mut rng = ScriptedRolls::constant(0);
        let result = run_trial_with_rng(&scenario, &mut locations, &mut rng);

        assert_eq!(result.total_cost, 10);
        assert_eq!(result.clear_order, vec![1]);
        assert_eq!(result.reloads, 1);
    }

    #[test]
    fn test_scratch_locations_are_reset_between_trials() {
        let scenario = two_node_scenario();
        let mut locations = Vec::new();
        let mut rng = ScriptedRolls::constant(0);

        let first = run_trial_with_rng(&scenario, &mut locations, &mut rng);
        assert!(locations[1].skip);
        let second = run_trial_with_rng(&scenario, &mut locations, &mut rng);
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_excluded_costs_nothing() {
        let mut scenario = Scenario::new(SimConfig::default()).unwrap();
        scenario.exclude(&[0, 1, 2, 3, 4, 5]).unwrap();
        let result = run_trial_with_seed(&scenario, 1);

        assert_eq!(result.total_cost, 0);
        assert!(result.clear_order.is_empty());
    }

    #[test]
    fn test_exclude_rejects_unknown_location() {
        let mut scenario = Scenario::new(SimConfig::default()).unwrap();
        assert!(scenario.exclude(&[12]).is_err());
        assert!(scenario.config().excluded.is_empty());
    }

    #[test]
    fn test_seeded_trial_is_reproducible() {
        let scenario = Scenario::new(SimConfig::default()).unwrap();
        assert_eq!(run_trial_with_seed(&scenario, 77), run_trial_with_seed(&scenario, 77));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let scenario = Scenario::new(SimConfig::default()).unwrap();
        let sequential = run_trials_sequential(&scenario, 40, 5);
        let parallel = run_trials_parallel(&scenario, 40, 5, Some(2));
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_unseeded_trial_clears_everything() {
        let scenario = two_node_scenario();
        let result = run_trial(&scenario);
        assert_eq!(result.clear_order, vec![1]);
        assert!(result.total_cost >= 10);
    }

    #[test]
    fn test_estimate_is_the_aggregated_mean() {
        let scenario = Scenario::new(SimConfig::default()).unwrap();
        let options = RunOptions {
            trials: 150,
            seed: Some(42),
            ..RunOptions::default()
        };
        let estimate = estimate_cost(&scenario, &options);
        assert_eq!(estimate, run_and_aggregate(&scenario, &options).avg_cost);

        let results = run_trials_sequential(&scenario, 150, 42);
        let sum: i64 = results.iter().map(|r| r.total_cost).sum();
        assert!((estimate - sum as f64 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_guaranteed_scenario_estimate() {
        // Every trial takes exactly one 0 -> 1 hop once the reload fires;
        // with 5 attempts at 5% the hop can repeat, so the mean is at least 10
        let scenario = two_node_scenario();
        let options = RunOptions {
            trials: 200,
            seed: Some(3),
            ..RunOptions::default()
        };
        let stats = run_and_aggregate(&scenario, &options);
        assert_eq!(stats.trials, 200);
        assert!(stats.avg_cost >= 10.0);
        assert_eq!(stats.avg_clear_position, vec![None, Some(1.0)]);
    }
}
