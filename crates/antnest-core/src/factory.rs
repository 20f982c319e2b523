//! Factories turning persisted data into live elements and ants.
//!
//! Each factory advertises the data kind it instantiates from. Element
//! lookup takes the exact kind first and otherwise walks
//! [`ElementDataKind::parent`] until a factory matches; agent lookup is
//! exact only.

use antnest_logic::Vec3;
use hecs::{Entity, World};

use crate::components::{Behavior, Carrier, NestPosition, StrategyTimer};
use crate::config::NestConfig;
use crate::data::{AgentData, AgentDataKind, AgentRecord, ElementData, ElementDataKind, RoomData};
use crate::element::ElementBlueprint;

/// Distance from a room's center to each of its four ports.
pub const ROOM_PORT_OFFSET: f32 = 1.0;

pub trait ElementFactory {
    fn data_kind(&self) -> ElementDataKind;
    fn instantiate(&self, data: &ElementData) -> Option<ElementBlueprint>;
}

pub trait AgentFactory {
    fn data_kind(&self) -> AgentDataKind;
    /// Spawn the ant's entity. The registry attaches the `Ant` tag afterwards.
    fn instantiate(&self, record: &AgentRecord, world: &mut World) -> Option<Entity>;
}

// ── Elements ────────────────────────────────────────────────────────────

/// Rooms: a `center` node with `left`/`right`/`top`/`bottom` ports. The
/// ports are the delivery targets while the room is being dug.
pub struct RoomFactory;

impl RoomFactory {
    fn blueprint(room: &RoomData) -> ElementBlueprint {
        let p = room.position;
        let o = ROOM_PORT_OFFSET;
        let mut bp = ElementBlueprint::new();
        let center = bp.node("center", p);
        for (name, offset) in [
            ("left", Vec3::planar(-o, 0.0)),
            ("right", Vec3::planar(o, 0.0)),
            ("top", Vec3::planar(0.0, o)),
            ("bottom", Vec3::planar(0.0, -o)),
        ] {
            let port = bp.node(name, p + offset);
            bp.link(center, port).mark_building(port);
        }
        bp
    }
}

impl ElementFactory for RoomFactory {
    fn data_kind(&self) -> ElementDataKind {
        ElementDataKind::Room
    }

    fn instantiate(&self, data: &ElementData) -> Option<ElementBlueprint> {
        match data {
            ElementData::Room(room) => Some(Self::blueprint(room)),
            ElementData::StorageRoom(storage) => Some(Self::blueprint(&storage.room)),
            _ => None,
        }
    }
}

/// Roads: two end nodes joined by one edge.
pub struct RoadFactory;

impl ElementFactory for RoadFactory {
    fn data_kind(&self) -> ElementDataKind {
        ElementDataKind::Road
    }

    fn instantiate(&self, data: &ElementData) -> Option<ElementBlueprint> {
        let ElementData::Road(road) = data else {
            return None;
        };
        let mut bp = ElementBlueprint::new();
        let a = bp.node("end_a", road.from);
        let b = bp.node("end_b", road.to);
        bp.link(a, b).mark_building(a).mark_building(b);
        Some(bp)
    }
}

/// Junctions: a single `center` node.
pub struct JunctionFactory;

impl ElementFactory for JunctionFactory {
    fn data_kind(&self) -> ElementDataKind {
        ElementDataKind::Junction
    }

    fn instantiate(&self, data: &ElementData) -> Option<ElementBlueprint> {
        let ElementData::Junction(junction) = data else {
            return None;
        };
        let mut bp = ElementBlueprint::new();
        bp.node("center", junction.position);
        Some(bp)
    }
}

// ── Agents ──────────────────────────────────────────────────────────────

pub struct DebugAntFactory;

impl AgentFactory for DebugAntFactory {
    fn data_kind(&self) -> AgentDataKind {
        AgentDataKind::Debug
    }

    fn instantiate(&self, record: &AgentRecord, world: &mut World) -> Option<Entity> {
        match record.data {
            AgentData::Debug => Some(world.spawn((NestPosition::at(record.position),))),
            _ => None,
        }
    }
}

pub struct ErgateAntFactory;

impl AgentFactory for ErgateAntFactory {
    fn data_kind(&self) -> AgentDataKind {
        AgentDataKind::Ergate
    }

    fn instantiate(&self, record: &AgentRecord, world: &mut World) -> Option<Entity> {
        let AgentData::Ergate(ergate) = &record.data else {
            return None;
        };
        Some(world.spawn((
            NestPosition::at(record.position),
            Carrier {
                holding_food: ergate.holding_food,
                capacity: ergate.capacity,
            },
        )))
    }
}

/// Builder ants start idle with their own strategy timer.
pub struct BuilderAntFactory {
    pub strategy_interval: f32,
}

impl AgentFactory for BuilderAntFactory {
    fn data_kind(&self) -> AgentDataKind {
        AgentDataKind::Builder
    }

    fn instantiate(&self, record: &AgentRecord, world: &mut World) -> Option<Entity> {
        match record.data {
            AgentData::Builder => Some(world.spawn((
                NestPosition::at(record.position),
                Behavior::Idle,
                StrategyTimer::new(self.strategy_interval),
            ))),
            _ => None,
        }
    }
}

// ── Lookup ──────────────────────────────────────────────────────────────

/// The factories a registry dispatches to.
#[derive(Default)]
pub struct FactorySet {
    elements: Vec<Box<dyn ElementFactory>>,
    agents: Vec<Box<dyn AgentFactory>>,
}

impl FactorySet {
    /// No factories registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every built-in factory, configured from `config`.
    pub fn standard(config: &NestConfig) -> Self {
        Self::empty()
            .with_element(RoomFactory)
            .with_element(RoadFactory)
            .with_element(JunctionFactory)
            .with_agent(DebugAntFactory)
            .with_agent(ErgateAntFactory)
            .with_agent(BuilderAntFactory {
                strategy_interval: config.strategy_interval,
            })
    }

    pub fn with_element(mut self, factory: impl ElementFactory + 'static) -> Self {
        self.elements.push(Box::new(factory));
        self
    }

    pub fn with_agent(mut self, factory: impl AgentFactory + 'static) -> Self {
        self.agents.push(Box::new(factory));
        self
    }

    /// Exact kind first, then the nearest registered ancestor.
    pub fn element_factory(&self, kind: ElementDataKind) -> Option<&dyn ElementFactory> {
        let mut current = Some(kind);
        while let Some(k) = current {
            if let Some(f) = self.elements.iter().find(|f| f.data_kind() == k) {
                return Some(f.as_ref());
            }
            current = k.parent();
        }
        None
    }

    pub fn agent_factory(&self, kind: AgentDataKind) -> Option<&dyn AgentFactory> {
        self.agents
            .iter()
            .find(|f| f.data_kind() == kind)
            .map(|f| f.as_ref())
    }
}
