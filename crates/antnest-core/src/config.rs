//! Runtime tuning for the nest simulation.

use serde::{Deserialize, Serialize};

/// Tunables for the engine, the builder strategy and the debug grid.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestConfig {
    /// Seconds between idle builder decisions
    pub strategy_interval: f32,
    /// Ant walking speed in units per second
    pub ant_speed: f32,
    /// Max distance at which an ant counts as standing on a node
    pub node_snap_distance: f32,
    /// Debug grid size in rooms
    pub grid_width: u32,
    pub grid_height: u32,
    /// Debug grid room spacing
    pub grid_spacing_x: f32,
    pub grid_spacing_y: f32,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            strategy_interval: 1.0,
            ant_speed: 1.5,
            node_snap_distance: 0.25,
            grid_width: 4,
            grid_height: 3,
            grid_spacing_x: 4.0,
            grid_spacing_y: 3.0,
        }
    }
}

impl NestConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = NestConfig::from_json(r#"{ "strategy_interval": 0.25 }"#).unwrap();
        assert_eq!(config.strategy_interval, 0.25);
        assert_eq!(config.grid_width, 4);
        assert_eq!(config.ant_speed, NestConfig::default().ant_speed);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = NestConfig {
            grid_width: 6,
            ..Default::default()
        };
        let back = NestConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
