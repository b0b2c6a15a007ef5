//! Per-location trial state

/// Width of the outstanding-event bitmask
pub const MAX_EVENT_SLOTS: usize = 32;

/// A location in the travel graph (a grotto, or the reload station)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Cumulative probabilities per event slot, in 1/10 %.
    /// A single draw in [0, 1000) hits the first slot whose threshold exceeds it.
    pub thresholds: Vec<u32>,
    /// Bit i set while slot i has a non-zero probability and hasn't been cleared
    pub outstanding: u32,
    /// Has at least one clearable event. Fixed for the whole trial.
    pub testable: bool,
    /// Travelled over without stopping
    pub skip: bool,
}

impl Location {
    /// Create a freshly initialized location
    pub fn new(probabilities: &[u32]) -> Self {
        let mut location = Self::default();
        location.initialize(probabilities);
        location
    }

    /// Reset this location for a new trial.
    ///
    /// `probabilities` must hold at most `MAX_EVENT_SLOTS` entries; the config
    /// layer enforces this before any trial runs.
    pub fn initialize(&mut self, probabilities: &[u32]) {
        self.skip = false;
        self.outstanding = 0;
        self.thresholds.clear();

        let mut running = 0;
        for (slot, &p) in probabilities.iter().enumerate() {
            running += p;
            self.thresholds.push(running);
            if p > 0 {
                self.outstanding |= 1 << slot;
            }
        }
        self.testable = self.outstanding != 0;
    }

    /// Testable and every event cleared
    #[inline(always)]
    pub fn is_cleared(&self) -> bool {
        self.testable && self.outstanding == 0
    }

    /// Still part of the walk and still has something to clear
    #[inline(always)]
    pub fn is_active_target(&self) -> bool {
        self.testable && !self.skip
    }

    /// Slot hit by a draw in [0, 1000), if any
    pub fn slot_for_draw(&self, draw: u32) -> Option<usize> {
        self.thresholds.iter().position(|&t| draw < t)
    }

    /// Clear a slot's bit. Clearing an already clear slot does nothing.
    #[inline(always)]
    pub fn clear_slot(&mut self, slot: usize) {
        self.outstanding &= !(1 << slot);
    }
}

/// Reinitialize every location from its probability row and apply exclusions
pub fn init_locations(locations: &mut Vec<Location>, events: &[Vec<u32>], excluded: &[usize]) {
    locations.resize_with(events.len(), Location::default);
    for (location, row) in locations.iter_mut().zip(events) {
        location.initialize(row);
    }
    for &idx in excluded {
        if let Some(location) = locations.get_mut(idx) {
            location.skip = true;
        }
    }
}
