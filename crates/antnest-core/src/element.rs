//! Structural elements and the edges between them.

use antnest_logic::{EdgeId, ElementId, NodeId, Vec3};

use crate::data::{ElementData, ElementRecord, RecordId};

/// Traversal role of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Finished,
    /// Exposes its building-node subset as delivery targets.
    UnderConstruction,
    /// Not buildable (junctions).
    Generic,
}

impl ElementKind {
    pub fn of(data: &ElementData) -> Self {
        if !data.is_buildable() {
            ElementKind::Generic
        } else if data.under_construction() {
            ElementKind::UnderConstruction
        } else {
            ElementKind::Finished
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub name: String,
    pub position: Vec3,
}

/// An element's local graph before it is placed in a registry.
///
/// Node references are indices into `nodes`. Factories produce blueprints
/// from data; callers building elements by hand attach the backing record
/// with [`ElementBlueprint::with_record`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementBlueprint {
    pub record: Option<ElementRecord>,
    pub nodes: Vec<NodeSpec>,
    pub local_edges: Vec<(usize, usize)>,
    pub building_nodes: Vec<usize>,
}

impl ElementBlueprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index.
    pub fn node(&mut self, name: impl Into<String>, position: Vec3) -> usize {
        self.nodes.push(NodeSpec {
            name: name.into(),
            position,
        });
        self.nodes.len() - 1
    }

    pub fn link(&mut self, a: usize, b: usize) -> &mut Self {
        self.local_edges.push((a, b));
        self
    }

    pub fn mark_building(&mut self, index: usize) -> &mut Self {
        self.building_nodes.push(index);
        self
    }

    pub fn with_record(mut self, record: ElementRecord) -> Self {
        self.record = Some(record);
        self
    }

    /// Every local edge and building node refers to an existing node.
    pub fn is_consistent(&self) -> bool {
        let n = self.nodes.len();
        self.local_edges.iter().all(|&(a, b)| a < n && b < n)
            && self.building_nodes.iter().all(|&i| i < n)
    }
}

/// A registered structural element.
#[derive(Debug, Clone)]
pub struct NestElement {
    pub(crate) id: ElementId,
    pub(crate) record: ElementRecord,
    pub(crate) kind: ElementKind,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) local_edges: Vec<(NodeId, NodeId)>,
    pub(crate) building_nodes: Vec<NodeId>,
}

impl NestElement {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn record_id(&self) -> RecordId {
        self.record.id
    }

    pub fn data(&self) -> &ElementData {
        &self.record.data
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_under_construction(&self) -> bool {
        self.kind == ElementKind::UnderConstruction
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn local_edges(&self) -> &[(NodeId, NodeId)] {
        &self.local_edges
    }

    /// Delivery targets while under construction. Empty otherwise.
    pub fn building_nodes(&self) -> &[NodeId] {
        if self.is_under_construction() {
            &self.building_nodes
        } else {
            &[]
        }
    }
}

/// A connection between nodes of two different elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementEdge {
    pub id: EdgeId,
    pub record: RecordId,
    pub a: NodeId,
    pub b: NodeId,
    pub a_host: ElementId,
    pub b_host: ElementId,
}

impl ElementEdge {
    pub fn touches(&self, element: ElementId) -> bool {
        self.a_host == element || self.b_host == element
    }
}
