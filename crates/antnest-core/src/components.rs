//! ECS components carried by spawned ants.
//!
//! Components are pure data. Behaviour lives in [`crate::systems`].

use antnest_logic::{ElementId, NodeId, Route, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{AgentDataKind, RecordId};

/// Identifies a live agent in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ant{}", self.0)
    }
}

/// Links an entity back to its registry entry and save record.
#[derive(Debug, Clone, Copy)]
pub struct Ant {
    pub id: AgentId,
    pub record: RecordId,
    pub kind: AgentDataKind,
}

/// Where an ant is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NestPosition {
    pub world: Vec3,
    /// Node the ant is standing on. `None` while between nodes.
    pub node: Option<NodeId>,
}

impl NestPosition {
    pub fn at(world: Vec3) -> Self {
        Self { world, node: None }
    }
}

/// Food hauling state of an ergate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carrier {
    pub holding_food: bool,
    pub capacity: u32,
}

/// Builder ant state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Idle,
    MovingToTarget {
        element: ElementId,
        target: NodeId,
        route: Vec<NodeId>,
        /// Index of the next waypoint in `route`
        next: usize,
    },
    Building {
        element: ElementId,
    },
}

impl Behavior {
    /// Start walking `route`. The first node is where the ant stands.
    pub fn moving_to(element: ElementId, route: Route) -> Self {
        let target = route.destination();
        Behavior::MovingToTarget {
            element,
            target,
            route: route.into_nodes(),
            next: 1,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Behavior::Idle)
    }
}

/// Throttles a strategy to run every `interval` seconds instead of every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyTimer {
    pub interval: f32,
    pub elapsed: f32,
}

impl StrategyTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Advance by `delta`; true once per elapsed interval.
    pub fn tick(&mut self, delta: f32) -> bool {
        self.elapsed += delta;
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}
