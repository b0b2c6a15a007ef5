//! Reload-budget lookup table
//!
//! Maps the cost lost since the last reload check to the number of reload
//! attempts (256-step cycles) worth performing. Built once per run from an
//! ascending step function and read in constant time afterwards.

/// Cost beyond which the number of reload attempts no longer changes
pub const MAX_TOTAL: u32 = 127;

/// Largest configurable `max_total`; the table holds one entry per cost
pub const MAX_TOTAL_LIMIT: u32 = 1 << 16;

/// Reference breakpoints as `(first_cost, attempts)` pairs.
/// Each pair covers costs from `first_cost` up to the next pair's `first_cost - 1`.
pub const DEFAULT_BREAKPOINTS: [(u32, u32); 11] = [
    (0, 5),
    (16, 6),
    (22, 7),
    (30, 8),
    (40, 9),
    (50, 10),
    (62, 11),
    (76, 12),
    (91, 13),
    (108, 14),
    (127, 15),
];

/// Precomputed cost -> attempts table
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadBudget {
    attempts: Vec<u32>,
}

impl ReloadBudget {
    /// Build the table for costs `0..=max_total` from a step function.
    ///
    /// Breakpoints are expected to be validated already (see `SimConfig::validate`):
    /// the first one starts at cost 0 and costs ascend strictly.
    pub fn from_breakpoints(breakpoints: &[(u32, u32)], max_total: u32) -> Self {
        let mut attempts = Vec::with_capacity(max_total as usize + 1);
        let mut current = breakpoints.first().map(|&(_, a)| a).unwrap_or(0);
        let mut next = 0;

        for cost in 0..=max_total {
            while next < breakpoints.len() && breakpoints[next].0 <= cost {
                current = breakpoints[next].1;
                next += 1;
            }
            attempts.push(current);
        }

        Self { attempts }
    }

    /// Largest cost with its own table entry
    #[inline(always)]
    pub fn max_total(&self) -> i64 {
        self.attempts.len() as i64 - 1
    }

    /// Clamp an accumulated cost into the table's domain.
    /// Running totals can dip below zero when gains exceed losses.
    #[inline(always)]
    pub fn clamp(&self, cost: i64) -> usize {
        cost.clamp(0, self.max_total().max(0)) as usize
    }

    /// Reload attempts for the given accumulated cost
    #[inline(always)]
    pub fn attempts_for(&self, cost: i64) -> u32 {
        self.attempts.get(self.clamp(cost)).copied().unwrap_or(0)
    }
}

impl Default for ReloadBudget {
    fn default() -> Self {
        Self::from_breakpoints(&DEFAULT_BREAKPOINTS, MAX_TOTAL)
    }
}
