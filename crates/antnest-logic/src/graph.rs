//! Traversal graph of the nest.
//!
//! `NavGraph` is an arena of path nodes addressed by [`NodeId`]. Removing a
//! node tombstones its slot and strips it from its neighbours' adjacency
//! lists, so no handle ever dangles into a reused slot. Edges are undirected
//! and may repeat: a local edge and an inter-element edge between the same
//! pair are tracked independently, and `unlink` removes exactly one of them.

use crate::geometry::Vec3;
use crate::ids::{ElementId, NodeId};

/// A single addressable point in the traversal graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    pub position: Vec3,
    /// Logical port name within the host element ("left", "top", "end_a", ...).
    pub name: String,
    /// Owning element. Non-owning back-reference.
    pub host: ElementId,
}

#[derive(Debug, Clone)]
struct Slot {
    node: PathNode,
    neighbors: Vec<NodeId>,
}

/// Node arena plus adjacency lists.
#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    slots: Vec<Option<Slot>>,
    live: usize,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh node slot.
    pub fn add_node(&mut self, host: ElementId, name: impl Into<String>, position: Vec3) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Slot {
            node: PathNode {
                position,
                name: name.into(),
                host,
            },
            neighbors: Vec::new(),
        }));
        self.live += 1;
        id
    }

    /// Tombstone a node and drop every edge touching it.
    ///
    /// Returns the removed node, or `None` if the slot was already empty.
    pub fn remove_node(&mut self, id: NodeId) -> Option<PathNode> {
        let slot = self.slots.get_mut(id.index())?.take()?;
        for neighbor in &slot.neighbors {
            if let Some(Some(other)) = self.slots.get_mut(neighbor.index()) {
                other.neighbors.retain(|&n| n != id);
            }
        }
        self.live -= 1;
        Some(slot.node)
    }

    /// Add an undirected edge. Both endpoints must be live.
    pub fn link(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        if let Some(Some(slot)) = self.slots.get_mut(a.index()) {
            slot.neighbors.push(b);
        }
        if a != b {
            if let Some(Some(slot)) = self.slots.get_mut(b.index()) {
                slot.neighbors.push(a);
            }
        }
        true
    }

    /// Remove one occurrence of the undirected edge `a - b`.
    pub fn unlink(&mut self, a: NodeId, b: NodeId) -> bool {
        let removed = self.remove_one(a, b);
        if a != b {
            self.remove_one(b, a);
        }
        removed
    }

    fn remove_one(&mut self, from: NodeId, to: NodeId) -> bool {
        let Some(Some(slot)) = self.slots.get_mut(from.index()) else {
            return false;
        };
        match slot.neighbors.iter().position(|&n| n == to) {
            Some(i) => {
                slot.neighbors.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.slots
            .get(id.index())
            .and_then(|s| s.as_ref())
            .map(|s| &s.node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.position)
    }

    /// Neighbours in insertion order. Empty for unknown nodes.
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(id.index())
            .and_then(|s| s.as_ref())
            .map(|s| s.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Whether at least one edge joins `a` and `b`.
    pub fn is_linked(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Live nodes in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PathNode)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (NodeId(i as u32), &s.node)))
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Live node closest to `position`, if any lies within `max_distance`.
    /// Ties go to the lower slot.
    pub fn nearest(&self, position: Vec3, max_distance: f32) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for (id, node) in self.nodes() {
            let d = node.position.distance(&position);
            if d > max_distance {
                continue;
            }
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (NavGraph, [NodeId; 3]) {
        let mut g = NavGraph::new();
        let host = ElementId(0);
        let a = g.add_node(host, "a", Vec3::planar(0.0, 0.0));
        let b = g.add_node(host, "b", Vec3::planar(1.0, 0.0));
        let c = g.add_node(host, "c", Vec3::planar(0.0, 1.0));
        g.link(a, b);
        g.link(b, c);
        g.link(c, a);
        (g, [a, b, c])
    }

    #[test]
    fn test_link_is_undirected() {
        let (g, [a, b, _]) = triangle();
        assert!(g.is_linked(a, b));
        assert!(g.is_linked(b, a));
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn test_remove_node_strips_adjacency() {
        let (mut g, [a, b, c]) = triangle();
        let removed = g.remove_node(b).unwrap();
        assert_eq!(removed.name, "b");
        assert!(!g.contains(b));
        assert!(!g.neighbors(a).contains(&b));
        assert!(!g.neighbors(c).contains(&b));
        assert_eq!(g.node_count(), 2);
        // Second removal is a no-op
        assert!(g.remove_node(b).is_none());
    }

    #[test]
    fn test_slots_not_reused() {
        let (mut g, [_, b, _]) = triangle();
        g.remove_node(b);
        let d = g.add_node(ElementId(1), "d", Vec3::ZERO);
        assert_ne!(d, b);
        assert!(g.node(b).is_none());
    }

    #[test]
    fn test_duplicate_edges_unlink_one() {
        let (mut g, [a, b, _]) = triangle();
        g.link(a, b);
        assert!(g.unlink(a, b));
        assert!(g.is_linked(a, b));
        assert!(g.unlink(a, b));
        assert!(!g.is_linked(a, b));
        assert!(!g.is_linked(b, a));
    }

    #[test]
    fn test_link_rejects_dead_nodes() {
        let (mut g, [a, b, _]) = triangle();
        g.remove_node(b);
        assert!(!g.link(a, b));
    }

    #[test]
    fn test_nearest_within_radius() {
        let (g, [a, b, _]) = triangle();
        assert_eq!(g.nearest(Vec3::planar(0.1, 0.0), 0.5), Some(a));
        assert_eq!(g.nearest(Vec3::planar(0.9, 0.1), 0.5), Some(b));
        assert_eq!(g.nearest(Vec3::planar(5.0, 5.0), 0.5), None);
    }
}
