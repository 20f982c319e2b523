//! A* route search over the nest graph.
//!
//! Edge cost is the straight-line distance between the two node positions and
//! the heuristic is the straight-line distance to the goal, so the heuristic
//! is consistent and the first time the goal is popped its route is optimal.
//!
//! The frontier pops the lowest `g + h` first. Ties go to the lower `h`, then
//! to the entry pushed first, which makes the chosen route a pure function of
//! the graph (including adjacency insertion order).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use thiserror::Error;

use crate::graph::NavGraph;
use crate::ids::NodeId;

/// Invalid query input. "No route" is not an error, see [`find_route`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    #[error("node {0} is not in the graph")]
    NodeNotInGraph(NodeId),
}

/// Ordered node sequence from origin to destination, both inclusive.
///
/// Always non-empty. A single-node route means origin and destination are
/// the same node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    nodes: Vec<NodeId>,
}

impl Route {
    fn single(node: NodeId) -> Self {
        Self { nodes: vec![node] }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a route holds at least its origin.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// True when the route has at least one hop.
    pub fn is_multi_hop(&self) -> bool {
        self.nodes.len() >= 2
    }

    pub fn origin(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn destination(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Total straight-line length along the route. Nodes missing from
    /// `graph` contribute nothing.
    pub fn cost(&self, graph: &NavGraph) -> f32 {
        self.nodes
            .windows(2)
            .filter_map(|w| Some(graph.position(w[0])?.distance(&graph.position(w[1])?)))
            .sum()
    }

    pub fn into_nodes(self) -> Vec<NodeId> {
        self.nodes
    }
}

#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    f: f32,
    h: f32,
    seq: u64,
    node: NodeId,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reversed so the best entry is the greatest
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

/// Find a least-cost route from `from` to `to`.
///
/// Returns `Err` if either endpoint is not a live node, `Ok(None)` if the
/// endpoints are disconnected, and `Ok(Some(route))` otherwise. When
/// `from == to` the route is the single node.
pub fn find_route(graph: &NavGraph, from: NodeId, to: NodeId) -> Result<Option<Route>, RouteError> {
    let start = graph.node(from).ok_or(RouteError::NodeNotInGraph(from))?;
    let goal = graph.node(to).ok_or(RouteError::NodeNotInGraph(to))?;

    if from == to {
        return Ok(Some(Route::single(from)));
    }

    let goal_pos = goal.position;
    let mut frontier = BinaryHeap::new();
    let mut g_score: HashMap<NodeId, f32> = HashMap::new();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
    let mut closed: HashSet<NodeId> = HashSet::new();
    let mut seq = 0u64;

    let h0 = start.position.distance(&goal_pos);
    frontier.push(FrontierEntry {
        f: h0,
        h: h0,
        seq,
        node: from,
    });
    g_score.insert(from, 0.0);

    while let Some(FrontierEntry { node: current, .. }) = frontier.pop() {
        if current == to {
            log::trace!("route {} -> {}: {} nodes expanded", from, to, closed.len());
            return Ok(Some(reconstruct(&came_from, from, to)));
        }
        // Stale duplicate of an already expanded node
        if !closed.insert(current) {
            continue;
        }

        let Some(current_pos) = graph.position(current) else {
            continue;
        };
        let current_g = g_score.get(&current).copied().unwrap_or(f32::INFINITY);

        for &next in graph.neighbors(current) {
            if closed.contains(&next) {
                continue;
            }
            let Some(next_pos) = graph.position(next) else {
                continue;
            };
            let tentative = current_g + current_pos.distance(&next_pos);
            if tentative < g_score.get(&next).copied().unwrap_or(f32::INFINITY) {
                g_score.insert(next, tentative);
                came_from.insert(next, current);
                let h = next_pos.distance(&goal_pos);
                seq += 1;
                frontier.push(FrontierEntry {
                    f: tentative + h,
                    h,
                    seq,
                    node: next,
                });
            }
        }
    }

    Ok(None)
}

fn reconstruct(came_from: &HashMap<NodeId, NodeId>, from: NodeId, to: NodeId) -> Route {
    let mut nodes = vec![to];
    let mut node = to;
    while node != from {
        match came_from.get(&node) {
            Some(&prev) => {
                nodes.push(prev);
                node = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    Route { nodes }
}
