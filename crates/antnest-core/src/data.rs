//! Persisted nest records.
//!
//! These are the plain-data shapes written to save files. Live runtime state
//! (arena handles, ECS entities) is rebuilt from them on load, so nothing here
//! refers to a `NodeId` or `ElementId`.

use antnest_logic::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a persisted record.
///
/// Decides "is this data already registered" without relying on object
/// identity, and lets edge records point at element records across loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Elements ────────────────────────────────────────────────────────────

/// Tag of an element data variant, used for factory dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementDataKind {
    Room,
    StorageRoom,
    Road,
    Junction,
}

impl ElementDataKind {
    /// The more general kind a factory may fall back to.
    pub fn parent(self) -> Option<Self> {
        match self {
            ElementDataKind::StorageRoom => Some(ElementDataKind::Room),
            ElementDataKind::Room | ElementDataKind::Road | ElementDataKind::Junction => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    /// Room center
    pub position: Vec3,
    pub under_construction: bool,
}

/// A room that also stores food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRoomData {
    pub room: RoomData,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadData {
    pub from: Vec3,
    pub to: Vec3,
    pub under_construction: bool,
}

/// A bare crossing point. Never under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionData {
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementData {
    Room(RoomData),
    StorageRoom(StorageRoomData),
    Road(RoadData),
    Junction(JunctionData),
}

impl ElementData {
    pub fn room(position: Vec3, under_construction: bool) -> Self {
        ElementData::Room(RoomData {
            position,
            under_construction,
        })
    }

    pub fn road(from: Vec3, to: Vec3, under_construction: bool) -> Self {
        ElementData::Road(RoadData {
            from,
            to,
            under_construction,
        })
    }

    pub fn junction(position: Vec3) -> Self {
        ElementData::Junction(JunctionData { position })
    }

    pub fn kind(&self) -> ElementDataKind {
        match self {
            ElementData::Room(_) => ElementDataKind::Room,
            ElementData::StorageRoom(_) => ElementDataKind::StorageRoom,
            ElementData::Road(_) => ElementDataKind::Road,
            ElementData::Junction(_) => ElementDataKind::Junction,
        }
    }

    /// Whether the element goes through a construction phase at all.
    pub fn is_buildable(&self) -> bool {
        !matches!(self, ElementData::Junction(_))
    }

    pub fn under_construction(&self) -> bool {
        match self {
            ElementData::Room(r) => r.under_construction,
            ElementData::StorageRoom(s) => s.room.under_construction,
            ElementData::Road(r) => r.under_construction,
            ElementData::Junction(_) => false,
        }
    }

    /// Returns false for data that cannot be under construction.
    pub fn set_under_construction(&mut self, value: bool) -> bool {
        match self {
            ElementData::Room(r) => r.under_construction = value,
            ElementData::StorageRoom(s) => s.room.under_construction = value,
            ElementData::Road(r) => r.under_construction = value,
            ElementData::Junction(_) => return false,
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: RecordId,
    pub data: ElementData,
}

impl ElementRecord {
    pub fn new(data: ElementData) -> Self {
        Self {
            id: RecordId::new(),
            data,
        }
    }
}

// ── Edges ───────────────────────────────────────────────────────────────

/// A node addressed by its element record and port name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub element: RecordId,
    pub node: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: RecordId,
    pub a: NodeRef,
    pub b: NodeRef,
}

// ── Agents ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentDataKind {
    Debug,
    Ergate,
    Builder,
}

/// Worker ant that hauls food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErgateData {
    pub holding_food: bool,
    pub capacity: u32,
}

impl Default for ErgateData {
    fn default() -> Self {
        Self {
            holding_food: false,
            capacity: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentData {
    Debug,
    Ergate(ErgateData),
    Builder,
}

impl AgentData {
    pub fn kind(&self) -> AgentDataKind {
        match self {
            AgentData::Debug => AgentDataKind::Debug,
            AgentData::Ergate(_) => AgentDataKind::Ergate,
            AgentData::Builder => AgentDataKind::Builder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: RecordId,
    /// Spawn position
    pub position: Vec3,
    pub data: AgentData,
}

impl AgentRecord {
    pub fn new(data: AgentData, position: Vec3) -> Self {
        Self {
            id: RecordId::new(),
            position,
            data,
        }
    }
}

// ── Nest ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestStructure {
    pub elements: Vec<ElementRecord>,
    pub edges: Vec<EdgeRecord>,
}

/// Everything persisted about a nest, in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestData {
    pub ants: Vec<AgentRecord>,
    pub structure: NestStructure,
}
