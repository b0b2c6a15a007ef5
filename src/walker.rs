//! Cycle walker - clears locations one at a time by circling the graph
//!
//! Clearing every location is computed as "cost to clear the next location"
//! plus "cost to clear the rest", where the rest is the same problem with the
//! just-cleared location skipped and used as the new starting point. The
//! active set shrinks by one per call, so recursion depth is bounded by the
//! number of testable locations.

use crate::budget::ReloadBudget;
use crate::events::{resolve, RollSource, EVENT_ROLL_PROB};
use crate::graph::TravelGraph;
use crate::location::Location;
use tracing::{debug, trace};

/// Reload steps per second of bonus time spent at the station
pub const LAST_NODE_MULTIPLIER: u32 = 18;

/// Bookkeeping gathered while walking, separate from the returned cost
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkStats {
    /// Locations in the order they were cleared
    pub clear_order: Vec<usize>,
    /// Hops taken during live passes
    pub hops: u64,
    /// Reloads that fired
    pub reloads: u64,
    /// Times the walk crossed the reload station
    pub laps: u64,
}

/// Read-only walking context shared by every trial of a run
#[derive(Debug, Clone, Copy)]
pub struct CycleWalker<'a> {
    graph: &'a TravelGraph,
    budget: &'a ReloadBudget,
    station: usize,
    last_node_multiplier: i64,
    roll_prob: u32,
}

impl<'a> CycleWalker<'a> {
    /// Walker with the reference tuning and the station at the last index
    pub fn new(graph: &'a TravelGraph, budget: &'a ReloadBudget) -> Self {
        Self {
            graph,
            budget,
            station: graph.count().saturating_sub(1),
            last_node_multiplier: LAST_NODE_MULTIPLIER as i64,
            roll_prob: EVENT_ROLL_PROB,
        }
    }

    pub fn with_station(mut self, station: usize) -> Self {
        self.station = station;
        self
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.last_node_multiplier = multiplier as i64;
        self
    }

    pub fn with_roll_prob(mut self, roll_prob: u32) -> Self {
        self.roll_prob = roll_prob;
        self
    }

    /// Next index after `idx` in visiting order, wrapping
    #[inline(always)]
    fn step(&self, idx: usize) -> usize {
        let next = idx + 1;
        if next == self.graph.count() {
            0
        } else {
            next
        }
    }

    /// Raw loss of one lap over the active set, starting at `start`.
    ///
    /// Counts every index stepped over, skipped or not, rather than waiting to
    /// come back to `start`, since `start` itself may already be skipped.
    fn lap_loss(&self, locations: &[Location], start: usize) -> i64 {
        let count = self.graph.count();
        let mut total = 0;
        let mut from = start;
        let mut to = start;
        let mut checked = 0;

        loop {
            loop {
                to = self.step(to);
                checked += 1;
                if !locations[to].skip {
                    break;
                }
            }
            if checked >= count {
                break;
            }
            total += self.graph.loss(from, to);
            from = to;
        }
        total
    }

    /// Total cost to clear every remaining testable location, walking from `start`.
    ///
    /// Returns 0 when no location is both testable and not skipped, which also
    /// covers empty graphs.
    pub fn clear_one_cycle<R: RollSource>(
        &self,
        locations: &mut [Location],
        start: usize,
        rng: &mut R,
        stats: &mut WalkStats,
    ) -> i64 {
        if self.graph.count() == 0 || !locations.iter().any(Location::is_active_target) {
            return 0;
        }

        let lap_loss = self.lap_loss(locations, start);
        let bonus = self.budget.attempts_for(lap_loss) as i64 * self.last_node_multiplier;

        let mut total: i64 = 0;
        let mut from = start;
        let mut to = start;
        loop {
            loop {
                to = self.step(to);
                if to == self.station {
                    total += bonus;
                    stats.laps += 1;
                }
                if !locations[to].skip {
                    break;
                }
            }

            total += self.graph.net(from, to);
            let attempts = self.budget.attempts_for(total);
            let reload = resolve(&mut locations[to], attempts, self.roll_prob, rng);
            stats.hops += 1;
            if reload.fired() {
                stats.reloads += 1;
            }
            trace!(from, to, total, attempts, ?reload, "hop");

            from = to;
            if locations[to].is_cleared() {
                break;
            }
        }

        locations[from].skip = true;
        stats.clear_order.push(from);
        debug!(cleared = from, pass_cost = total, lap_loss, bonus, "location cleared");

        total + self.clear_one_cycle(locations, from, rng, stats)
    }
}
