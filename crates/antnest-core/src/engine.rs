//! Nest engine - main entry point for running the nest

use crate::config::NestConfig;
use crate::persistence::{self, SaveError};
use crate::registry::NestRegistry;
use crate::systems::*;

/// Main nest engine
pub struct NestEngine {
    /// Live nest: elements, edges, ants and their ECS world
    pub registry: NestRegistry,
    pub config: NestConfig,
    /// Simulation time in seconds since start
    pub sim_time: f64,

    time_scale: f32,
}

impl NestEngine {
    /// Create an empty nest using `config`
    pub fn new(config: NestConfig) -> Self {
        Self {
            registry: NestRegistry::with_config(&config),
            config,
            sim_time: 0.0,
            time_scale: 1.0,
        }
    }

    /// Update the nest by delta_seconds
    pub fn update(&mut self, delta_seconds: f32) {
        let scaled_delta = delta_seconds * self.time_scale;
        self.sim_time += scaled_delta as f64;

        // Builders decide on their own timers
        builder_strategy_system(
            &mut self.registry,
            scaled_delta,
            self.config.node_snap_distance,
        );

        movement_system(&mut self.registry, scaled_delta, self.config.ant_speed);

        building_system(&mut self.registry);
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Current simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn ant_count(&self) -> usize {
        self.registry.agent_count()
    }

    pub fn element_count(&self) -> usize {
        self.registry.element_count()
    }

    /// Save nest state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_nest(writer, self.registry.data(), self.sim_time)
    }

    /// Load nest state from a reader, replacing the live nest
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = persistence::load_nest(reader)?;
        self.registry.load(loaded.nest);
        self.sim_time = loaded.sim_time;
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, SaveError> {
        persistence::export_json(self.registry.data(), self.sim_time)
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), SaveError> {
        let loaded = persistence::import_json(json)?;
        self.registry.load(loaded.nest);
        self.sim_time = loaded.sim_time;
        Ok(())
    }
}

impl Default for NestEngine {
    fn default() -> Self {
        Self::new(NestConfig::default())
    }
}
