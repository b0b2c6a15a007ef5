//! Event resolution - decides whether a reload fires during a leg of travel
//! and which event slot it clears

use crate::location::Location;

/// Reload chance per attempt, in 1/10 %
pub const EVENT_ROLL_PROB: u32 = 50;

/// Draws are uniform integers in [0, ROLL_RANGE)
pub const ROLL_RANGE: u32 = 1000;

/// Source of uniform draws in [0, 1000)
pub trait RollSource {
    fn roll(&mut self) -> u32;
}

/// Fast RNG wrapper for better performance
#[derive(Clone)]
pub struct FastRng {
    inner: fastrand::Rng,
}

impl FastRng {
    #[inline(always)]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: fastrand::Rng::with_seed(seed),
        }
    }

    #[inline(always)]
    pub fn gen_range(&mut self, low: u32, high: u32) -> u32 {
        self.inner.u32(low..high)
    }
}

impl RollSource for FastRng {
    #[inline(always)]
    fn roll(&mut self) -> u32 {
        self.gen_range(0, ROLL_RANGE)
    }
}

/// Replays a fixed sequence of draws, cycling when it runs out.
/// Used to make walks fully deterministic in tests.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    draws: Vec<u32>,
    pos: usize,
    consumed: usize,
}

impl ScriptedRolls {
    pub fn new(draws: Vec<u32>) -> Self {
        Self { draws, pos: 0, consumed: 0 }
    }

    /// Every draw returns the same value
    pub fn constant(draw: u32) -> Self {
        Self::new(vec![draw])
    }

    /// Number of draws taken so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&mut self) -> u32 {
        if self.draws.is_empty() {
            return ROLL_RANGE - 1;
        }
        let draw = self.draws[self.pos];
        self.pos = (self.pos + 1) % self.draws.len();
        self.consumed += 1;
        draw
    }
}

/// Outcome of a single resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// No attempt succeeded
    Idle,
    /// A reload fired; the slot it rolled, if the draw landed on one
    Fired(Option<usize>),
}

impl Reload {
    pub fn fired(&self) -> bool {
        matches!(self, Reload::Fired(_))
    }
}

/// Roll `attempts` reload chances at `location`. At most one reload fires,
/// however many attempts succeed, and it clears at most one slot.
///
/// Every attempt consumes a draw even after the first success.
pub fn resolve<R: RollSource>(
    location: &mut Location,
    attempts: u32,
    roll_prob: u32,
    rng: &mut R,
) -> Reload {
    let mut success = false;
    for _ in 0..attempts {
        if rng.roll() < roll_prob {
            success = true;
        }
    }
    if !success {
        return Reload::Idle;
    }

    let slot = location.slot_for_draw(rng.roll());
    if let Some(slot) = slot {
        location.clear_slot(slot);
    }
    Reload::Fired(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_success_leaves_location_untouched() {
        let mut location = Location::new(&[10, 40, 150]);
        let mut rng = ScriptedRolls::constant(EVENT_ROLL_PROB);
        let outcome = resolve(&mut location, 5, EVENT_ROLL_PROB, &mut rng);

        assert_eq!(outcome, Reload::Idle);
        assert_eq!(location.outstanding, 0b111);
        assert_eq!(rng.consumed(), 5);
    }

    #[test]
    fn test_zero_attempts_never_fire() {
        let mut location = Location::new(&[1000]);
        let mut rng = ScriptedRolls::constant(0);
        assert_eq!(resolve(&mut location, 0, EVENT_ROLL_PROB, &mut rng), Reload::Idle);
        assert_eq!(rng.consumed(), 0);
        assert_eq!(location.outstanding, 1);
    }

    #[test]
    fn test_single_fire_despite_many_successes() {
        let mut location = Location::new(&[10, 40, 150]);
        // Four successful attempts, then the slot draw lands in slot 1
        let mut rng = ScriptedRolls::new(vec![0, 1, 2, 3, 25]);
        let outcome = resolve(&mut location, 4, EVENT_ROLL_PROB, &mut rng);

        assert_eq!(outcome, Reload::Fired(Some(1)));
        assert_eq!(location.outstanding, 0b101);
        assert_eq!(rng.consumed(), 5);
    }

    #[test]
    fn test_late_success_still_fires() {
        let mut location = Location::new(&[10, 40, 150]);
        let mut rng = ScriptedRolls::new(vec![999, 999, 10, 999, 150]);
        let outcome = resolve(&mut location, 4, EVENT_ROLL_PROB, &mut rng);

        assert_eq!(outcome, Reload::Fired(Some(2)));
        assert_eq!(location.outstanding, 0b011);
    }

    #[test]
    fn test_draw_past_last_threshold_clears_nothing() {
        let mut location = Location::new(&[10, 40, 150]);
        let mut rng = ScriptedRolls::new(vec![0, 600]);
        let outcome = resolve(&mut location, 1, EVENT_ROLL_PROB, &mut rng);

        assert_eq!(outcome, Reload::Fired(None));
        assert!(outcome.fired());
        assert_eq!(location.outstanding, 0b111);
    }

    #[test]
    fn test_rolling_a_cleared_slot_has_no_effect() {
        let mut location = Location::new(&[40, 0, 0]);
        location.clear_slot(0);
        let mut rng = ScriptedRolls::new(vec![0, 5]);
        assert_eq!(resolve(&mut location, 1, EVENT_ROLL_PROB, &mut rng), Reload::Fired(Some(0)));
        assert_eq!(location.outstanding, 0);
    }

    #[test]
    fn test_fast_rng_stays_in_range() {
        let mut rng = FastRng::new(7);
        for _ in 0..10_000 {
            assert!(rng.roll() < ROLL_RANGE);
        }
    }

    #[test]
    fn test_fast_rng_is_reproducible() {
        let mut a = FastRng::new(42);
        let mut b = FastRng::new(42);
        let xs: Vec<u32> = (0..32).map(|_| a.roll()).collect();
        let ys: Vec<u32> = (0..32).map(|_| b.roll()).collect();
        assert_eq!(xs, ys);
    }
}
