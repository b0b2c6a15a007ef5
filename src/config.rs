//! Configuration structures for loading scenario YAML/JSON files

use crate::budget::{ReloadBudget, DEFAULT_BREAKPOINTS, MAX_TOTAL, MAX_TOTAL_LIMIT};
use crate::events::{EVENT_ROLL_PROB, ROLL_RANGE};
use crate::graph::TravelGraph;
use crate::location::MAX_EVENT_SLOTS;
use crate::walker::{CycleWalker, LAST_NODE_MULTIPLIER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a scenario
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{matrix} matrix must be {count}x{count} (row {row} has {len} entries)")]
    MatrixShape {
        matrix: &'static str,
        count: usize,
        row: usize,
        len: usize,
    },
    #[error("{matrix} matrix has {rows} rows, expected {count}")]
    MatrixRows {
        matrix: &'static str,
        rows: usize,
        count: usize,
    },
    #[error("events table has {rows} rows, expected one per location ({count})")]
    EventRows { rows: usize, count: usize },
    #[error("location {location} has {slots} event slots (at most {max})")]
    EventSlots {
        location: usize,
        slots: usize,
        max: usize,
    },
    #[error("{field} index {index} is out of range for {count} locations")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        count: usize,
    },
    #[error("event roll probability must be between 1 and {max} (got {value})")]
    RollProbability { value: u32, max: u32 },
    #[error("max_total must be at most {max} (got {value})")]
    MaxTotal { value: u32, max: u32 },
    #[error("invalid reload breakpoints: {0}")]
    Breakpoints(&'static str),
}

/// Tuning constants for the reload model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Lap cost beyond which extra reload attempts stop helping
    pub max_total: u32,
    /// Reload steps per unit of station time
    pub last_node_multiplier: u32,
    /// Chance per attempt for a reload, in 1/10 %
    pub event_roll_prob: u32,
    /// `(first_cost, attempts)` step function for the reload budget
    pub breakpoints: Vec<(u32, u32)>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_total: MAX_TOTAL,
            last_node_multiplier: LAST_NODE_MULTIPLIER,
            event_roll_prob: EVENT_ROLL_PROB,
            breakpoints: DEFAULT_BREAKPOINTS.to_vec(),
        }
    }
}

/// Full scenario loaded from YAML/JSON.
///
/// Every field is optional in files; missing ones fall back to the reference
/// seven-location map (six grottos plus the reload station at index 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Time lost per direct hop, `losses[from][to]`
    pub losses: Vec<Vec<u32>>,
    /// Time refunded per direct hop, `gains[from][to]`
    pub gains: Vec<Vec<u32>>,
    /// Raw probability per event slot, in 1/10 %. Rows are expected to sum to at most 1000.
    pub events: Vec<Vec<u32>>,
    /// Where every trial starts (defaults to the last location)
    pub start: Option<usize>,
    /// Location whose crossing pays the lap bonus (defaults to the last location)
    pub station: Option<usize>,
    /// Locations skipped for the whole run
    pub excluded: Vec<usize>,
    /// Optional display names, one per location
    pub names: Vec<String>,
    pub tuning: Tuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        let losses = [
            [0, 10, 19, 22, 35, 51, 0],
            [0, 0, 16, 15, 35, 51, 0],
            [0, 0, 0, 22, 39, 51, 7],
            [0, 0, 0, 0, 20, 51, 0],
            [0, 0, 0, 0, 0, 51, 0],
            [0, 0, 0, 0, 0, 0, 14],
            [10, 10, 17, 10, 17, 51, 0],
        ];
        let gains = [
            [0, 15, 16, 14, 18, 21, 0],
            [0, 0, 5, 21, 18, 21, 0],
            [0, 0, 0, 19, 17, 21, 0],
            [0, 0, 0, 0, 18, 21, 0],
            [0, 0, 0, 0, 0, 21, 0],
            [0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 3, 0, 0],
        ];
        let events = [
            [10, 20, 20],
            [40, 150, 0],
            [10, 40, 150],
            [10, 30, 150],
            [10, 40, 40],
            [40, 0, 0],
            [0, 0, 0],
        ];

        Self {
            losses: losses.iter().map(|r| r.to_vec()).collect(),
            gains: gains.iter().map(|r| r.to_vec()).collect(),
            events: events.iter().map(|r| r.to_vec()).collect(),
            start: None,
            station: None,
            excluded: Vec::new(),
            names: Vec::new(),
            tuning: Tuning::default(),
        }
    }
}

impl SimConfig {
    /// Load and validate a scenario from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let path_str = path.as_ref().to_string_lossy().to_lowercase();

        // Check if it's JSON or YAML
        let config: SimConfig = if path_str.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a JSON string (for Python interop)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of locations
    pub fn location_count(&self) -> usize {
        self.losses.len()
    }

    /// Start location, last index unless overridden
    pub fn start_location(&self) -> usize {
        self.start.unwrap_or(self.location_count().saturating_sub(1))
    }

    /// Reload station, last index unless overridden
    pub fn station_location(&self) -> usize {
        self.station.unwrap_or(self.location_count().saturating_sub(1))
    }

    /// Display name for a location
    pub fn location_name(&self, idx: usize) -> String {
        match self.names.get(idx) {
            Some(name) => name.clone(),
            None if idx == self.station_location() => "station".to_string(),
            None => format!("grotto {}", idx),
        }
    }

    /// Check shapes and tuning. Probability sums are not checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.location_count();

        for (matrix, rows) in [("losses", &self.losses), ("gains", &self.gains)] {
            if rows.len() != count {
                return Err(ConfigError::MatrixRows {
                    matrix,
                    rows: rows.len(),
                    count,
                });
            }
            if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != count) {
                return Err(ConfigError::MatrixShape {
                    matrix,
                    count,
                    row,
                    len: r.len(),
                });
            }
        }

        if self.events.len() != count {
            return Err(ConfigError::EventRows {
                rows: self.events.len(),
                count,
            });
        }
        if let Some((location, row)) = self
            .events
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() > MAX_EVENT_SLOTS)
        {
            return Err(ConfigError::EventSlots {
                location,
                slots: row.len(),
                max: MAX_EVENT_SLOTS,
            });
        }

        let mut indices: Vec<(&'static str, usize)> = Vec::new();
        if let Some(start) = self.start {
            indices.push(("start", start));
        }
        if let Some(station) = self.station {
            indices.push(("station", station));
        }
        indices.extend(self.excluded.iter().map(|&i| ("excluded", i)));
        if let Some(&(field, index)) = indices.iter().find(|(_, i)| *i >= count) {
            return Err(ConfigError::IndexOutOfRange { field, index, count });
        }

        let roll_prob = self.tuning.event_roll_prob;
        if roll_prob == 0 || roll_prob > ROLL_RANGE {
            return Err(ConfigError::RollProbability {
                value: roll_prob,
                max: ROLL_RANGE,
            });
        }

        if self.tuning.max_total > MAX_TOTAL_LIMIT {
            return Err(ConfigError::MaxTotal {
                value: self.tuning.max_total,
                max: MAX_TOTAL_LIMIT,
            });
        }

        validate_breakpoints(&self.tuning.breakpoints)
    }

    /// Travel graph built from the loss/gain matrices
    pub fn graph(&self) -> TravelGraph {
        TravelGraph::from_rows(&self.losses, &self.gains)
    }

    /// Reload budget table built from the tuning breakpoints
    pub fn budget(&self) -> ReloadBudget {
        ReloadBudget::from_breakpoints(&self.tuning.breakpoints, self.tuning.max_total)
    }

    /// Walker configured with this scenario's station and tuning
    pub fn walker<'a>(&self, graph: &'a TravelGraph, budget: &'a ReloadBudget) -> CycleWalker<'a> {
        CycleWalker::new(graph, budget)
            .with_station(self.station_location())
            .with_multiplier(self.tuning.last_node_multiplier)
            .with_roll_prob(self.tuning.event_roll_prob)
    }
}

fn validate_breakpoints(breakpoints: &[(u32, u32)]) -> Result<(), ConfigError> {
    let Some(&(first_cost, first_attempts)) = breakpoints.first() else {
        return Err(ConfigError::Breakpoints("at least one breakpoint is required"));
    };
    if first_cost != 0 {
        return Err(ConfigError::Breakpoints("first breakpoint must start at cost 0"));
    }
    if first_attempts == 0 {
        return Err(ConfigError::Breakpoints("zero attempts at cost 0 can never clear anything"));
    }

    for pair in breakpoints.windows(2) {
        let ((c0, a0), (c1, a1)) = (pair[0], pair[1]);
        if c1 <= c0 {
            return Err(ConfigError::Breakpoints("costs must be strictly ascending"));
        }
        if a1 < a0 {
            return Err(ConfigError::Breakpoints("attempts must not decrease"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Scenario;

    #[test]
    fn test_default_is_valid_reference_map() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.location_count(), 7);
        assert_eq!(config.start_location(), 6);
        assert_eq!(config.station_location(), 6);
        assert_eq!(config.budget(), ReloadBudget::default());
        assert_eq!(config.location_name(6), "station");
        assert_eq!(config.location_name(2), "grotto 2");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "excluded: [5]\ntuning:\n  event_roll_prob: 60\n";
        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.excluded, vec![5]);
        assert_eq!(config.tuning.event_roll_prob, 60);
        assert_eq!(config.tuning.last_node_multiplier, 18);
        assert_eq!(config.location_count(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_scenario() {
        let json = r#"{
            "losses": [[0, 10], [10, 0]],
            "gains": [[0, 0], [0, 0]],
            "events": [[0], [1000]],
            "start": 0,
            "station": 0,
            "names": ["home", "cave"]
        }"#;
        let config = SimConfig::from_json(json).unwrap();

        assert_eq!(config.start_location(), 0);
        assert_eq!(config.station_location(), 0);
        assert_eq!(config.location_name(1), "cave");
        assert_eq!(config.graph().loss(0, 1), 10);
    }

    #[test]
    fn test_rejects_ragged_matrix() {
        let mut config = SimConfig::default();
        config.gains[3].pop();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MatrixShape { matrix: "gains", row: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_missing_event_rows() {
        let mut config = SimConfig::default();
        config.events.pop();
        assert!(matches!(config.validate(), Err(ConfigError::EventRows { rows: 6, count: 7 })));
    }

    #[test]
    fn test_rejects_out_of_range_indices() {
        let mut config = SimConfig::default();
        config.excluded = vec![1, 7];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IndexOutOfRange { field: "excluded", index: 7, .. })
        ));

        let mut config = SimConfig::default();
        config.start = Some(9);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IndexOutOfRange { field: "start", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_tuning() {
        let mut config = SimConfig::default();
        config.tuning.event_roll_prob = 0;
        assert!(matches!(config.validate(), Err(ConfigError::RollProbability { .. })));

        let mut config = SimConfig::default();
        config.tuning.breakpoints = vec![(0, 5), (10, 4)];
        assert!(matches!(config.validate(), Err(ConfigError::Breakpoints(_))));

        config.tuning.breakpoints = vec![(3, 5)];
        assert!(matches!(config.validate(), Err(ConfigError::Breakpoints(_))));

        config.tuning.breakpoints = vec![(0, 5), (0, 6)];
        assert!(matches!(config.validate(), Err(ConfigError::Breakpoints(_))));
    }

    #[test]
    fn test_rejects_huge_max_total() {
        let mut config = SimConfig::default();
        config.tuning.max_total = u32::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::MaxTotal { value: u32::MAX, .. })));
        assert!(Scenario::new(config).is_err());

        let yaml = "tuning:\n  max_total: 4294967295\n";
        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MaxTotal { .. })));

        let mut config = SimConfig::default();
        config.tuning.max_total = MAX_TOTAL_LIMIT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_scenario_is_valid() {
        let json = r#"{"losses": [], "gains": [], "events": []}"#;
        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.location_count(), 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimConfig::from_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("failed to read config"));
    }
}
