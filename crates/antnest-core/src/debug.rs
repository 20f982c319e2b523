//! Developer tooling: counters, a generated test nest, random route samples
//! and line segments for drawing the traversal graph.
//!
//! Nothing here is needed to run a nest. A viewer or the simtest harness
//! drives it.

use antnest_logic::{ElementId, NodeId, Route, RouteError, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::components::AgentId;
use crate::config::NestConfig;
use crate::data::{AgentData, AgentRecord, ElementData, ElementDataKind, ElementRecord};
use crate::registry::{NestRegistry, RegistryError};

/// Snapshot of registry counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NestStats {
    pub ants: usize,
    pub elements: usize,
    pub building_elements: usize,
    pub element_edges: usize,
    pub nodes: usize,
    pub cached_routes: usize,
    pub cache_epoch: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DebugError {
    #[error("no factory accepted {0:?} data")]
    MissingFactory(ElementDataKind),
    #[error("element {element} has no `{port}` node")]
    MissingPort { element: ElementId, port: &'static str },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Handles of a generated test grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub width: u32,
    pub height: u32,
    /// Row-major, `y * width + x`
    pub rooms: Vec<ElementId>,
    /// Horizontal roads first (row by row), then vertical ones
    pub roads: Vec<ElementId>,
}

impl GridLayout {
    pub fn room_at(&self, x: u32, y: u32) -> Option<ElementId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.rooms.get((y * self.width + x) as usize).copied()
    }
}

/// Result of one random route sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSample {
    pub from: NodeId,
    pub to: NodeId,
    pub route: Option<Route>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub a: Vec3,
    pub b: Vec3,
}

/// Lines to draw, grouped by layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphOverlay {
    pub local_edges: Vec<Segment>,
    pub element_edges: Vec<Segment>,
    pub latest_route: Vec<Segment>,
}

impl GraphOverlay {
    pub fn is_empty(&self) -> bool {
        self.local_edges.is_empty() && self.element_edges.is_empty() && self.latest_route.is_empty()
    }
}

pub struct DebugPanel {
    pub show_graph: bool,
    spacing_x: f32,
    spacing_y: f32,
    latest_route: Option<Route>,
}

impl DebugPanel {
    pub fn new(config: &NestConfig) -> Self {
        Self {
            show_graph: true,
            spacing_x: config.grid_spacing_x,
            spacing_y: config.grid_spacing_y,
            latest_route: None,
        }
    }

    pub fn latest_route(&self) -> Option<&Route> {
        self.latest_route.as_ref()
    }

    pub fn stats(&self, registry: &NestRegistry) -> NestStats {
        let cache = registry.cache();
        NestStats {
            ants: registry.agent_count(),
            elements: registry.element_count(),
            building_elements: registry.building_elements().count(),
            element_edges: registry.edge_count(),
            nodes: registry.graph().node_count(),
            cached_routes: cache.len(),
            cache_epoch: cache.epoch(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
        }
    }

    /// Spawn a debug ant on a random node, or at the origin in an empty nest.
    pub fn spawn_debug_ant<R: Rng + ?Sized>(&mut self, registry: &mut NestRegistry, rng: &mut R) -> Option<AgentId> {
        let positions: Vec<Vec3> = registry.nodes().map(|(_, n)| n.position).collect();
        let position = positions.choose(rng).copied().unwrap_or(Vec3::ZERO);
        registry.add_agent(AgentRecord::new(AgentData::Debug, position), true)
    }

    /// Replace every element with a `width` x `height` grid of finished rooms
    /// joined by roads. Ants are kept.
    pub fn rebuild_test_grid(
        &mut self,
        registry: &mut NestRegistry,
        width: u32,
        height: u32,
    ) -> Result<GridLayout, DebugError> {
        let existing: Vec<ElementId> = registry.elements().map(|e| e.id()).collect();
        for id in existing {
            registry.remove_element(id)?;
        }
        self.latest_route = None;

        let mut layout = GridLayout {
            width,
            height,
            rooms: Vec::with_capacity((width * height) as usize),
            roads: Vec::new(),
        };
        let half_w = (width as f32 - 1.0) / 2.0;
        let half_h = (height as f32 - 1.0) / 2.0;
        for y in 0..height {
            for x in 0..width {
                let position = Vec3::planar(
                    (x as f32 - half_w) * self.spacing_x,
                    (y as f32 - half_h) * self.spacing_y,
                );
                layout.rooms.push(add(registry, ElementData::room(position, false))?);
            }
        }

        for y in 0..height {
            for x in 0..width.saturating_sub(1) {
                let i = (y * width + x) as usize;
                let road = join(registry, layout.rooms[i], "right", layout.rooms[i + 1], "left")?;
                layout.roads.push(road);
            }
        }
        for y in 0..height.saturating_sub(1) {
            for x in 0..width {
                let i = (y * width + x) as usize;
                let above = i + width as usize;
                let road = join(registry, layout.rooms[i], "top", layout.rooms[above], "bottom")?;
                layout.roads.push(road);
            }
        }

        log::info!(
            "test grid {}x{}: {} rooms, {} roads",
            width,
            height,
            layout.rooms.len(),
            layout.roads.len()
        );
        Ok(layout)
    }

    /// Route between two random nodes of two random elements.
    ///
    /// Returns `Ok(None)` when the nest has no elements.
    pub fn random_route_test<R: Rng + ?Sized>(
        &mut self,
        registry: &mut NestRegistry,
        rng: &mut R,
    ) -> Result<Option<RouteSample>, RouteError> {
        let Some(from) = random_node(registry, rng) else {
            return Ok(None);
        };
        let Some(to) = random_node(registry, rng) else {
            return Ok(None);
        };
        let route = registry.find_route(from, to)?;
        self.latest_route = route.clone();
        Ok(Some(RouteSample { from, to, route }))
    }

    /// Segments for local edges, element edges and the latest sampled route.
    /// Empty while `show_graph` is off.
    pub fn graph_overlay(&self, registry: &NestRegistry) -> GraphOverlay {
        if !self.show_graph {
            return GraphOverlay::default();
        }
        let segment = |a: NodeId, b: NodeId| {
            Some(Segment {
                a: registry.node(a)?.position,
                b: registry.node(b)?.position,
            })
        };

        GraphOverlay {
            local_edges: registry
                .elements()
                .flat_map(|e| e.local_edges().iter())
                .filter_map(|&(a, b)| segment(a, b))
                .collect(),
            element_edges: registry
                .element_edges()
                .filter_map(|e| segment(e.a, e.b))
                .collect(),
            latest_route: self
                .latest_route
                .iter()
                .flat_map(|r| r.nodes().windows(2))
                .filter_map(|w| segment(w[0], w[1]))
                .collect(),
        }
    }
}

fn add(registry: &mut NestRegistry, data: ElementData) -> Result<ElementId, DebugError> {
    let kind = data.kind();
    registry
        .add_element(ElementRecord::new(data), true)
        .ok_or(DebugError::MissingFactory(kind))
}

fn port(registry: &NestRegistry, element: ElementId, port: &'static str) -> Result<NodeId, DebugError> {
    registry
        .find_node(element, port)
        .ok_or(DebugError::MissingPort { element, port })
}

/// Lay a finished road from `a.a_port` to `b.b_port` and connect both ends.
fn join(
    registry: &mut NestRegistry,
    a: ElementId,
    a_port: &'static str,
    b: ElementId,
    b_port: &'static str,
) -> Result<ElementId, DebugError> {
    let n1 = port(registry, a, a_port)?;
    let n2 = port(registry, b, b_port)?;
    let from = registry.node(n1).map(|n| n.position).unwrap_or_default();
    let to = registry.node(n2).map(|n| n.position).unwrap_or_default();

    let road = add(registry, ElementData::road(from, to, false))?;
    let r1 = port(registry, road, "end_a")?;
    let r2 = port(registry, road, "end_b")?;
    registry.connect(n1, r1)?;
    registry.connect(r2, n2)?;
    Ok(road)
}

fn random_node<R: Rng + ?Sized>(registry: &NestRegistry, rng: &mut R) -> Option<NodeId> {
    let elements: Vec<ElementId> = registry.elements().map(|e| e.id()).collect();
    let element = registry.element(*elements.choose(rng)?)?;
    element.nodes().choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(width: u32, height: u32) -> (NestRegistry, DebugPanel, GridLayout) {
        let config = NestConfig::default();
        let mut registry = NestRegistry::with_config(&config);
        let mut panel = DebugPanel::new(&config);
        let layout = panel.rebuild_test_grid(&mut registry, width, height).unwrap();
        (registry, panel, layout)
    }

    #[test]
    fn test_grid_counts() {
        let (registry, panel, layout) = grid(4, 3);
        assert_eq!(layout.rooms.len(), 12);
        assert_eq!(layout.roads.len(), 3 * 3 + 2 * 4);
        let stats = panel.stats(&registry);
        assert_eq!(stats.elements, 29);
        assert_eq!(stats.element_edges, 34);
        assert_eq!(stats.nodes, 12 * 5 + 17 * 2);
        assert_eq!(stats.building_elements, 0);
    }

    #[test]
    fn test_grid_positions_are_centered() {
        let (registry, _, layout) = grid(4, 3);
        let corner = layout.room_at(0, 0).unwrap();
        let center = registry.find_node(corner, "center").unwrap();
        assert_eq!(registry.node(center).unwrap().position, Vec3::planar(-6.0, -3.0));
        let far = layout.room_at(3, 2).unwrap();
        let center = registry.find_node(far, "center").unwrap();
        assert_eq!(registry.node(center).unwrap().position, Vec3::planar(6.0, 3.0));
        assert!(layout.room_at(4, 0).is_none());
    }

    #[test]
    fn test_rebuild_replaces_previous_nest() {
        let (mut registry, mut panel, _) = grid(4, 3);
        let layout = panel.rebuild_test_grid(&mut registry, 2, 1).unwrap();
        assert_eq!(registry.element_count(), 3);
        assert_eq!(registry.edge_count(), 2);
        assert_eq!(layout.roads.len(), 1);
        assert_eq!(registry.data().structure.elements.len(), 3);
    }

    #[test]
    fn test_random_route_sample_is_recorded() {
        let (mut registry, mut panel, _) = grid(4, 3);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let sample = panel.random_route_test(&mut registry, &mut rng).unwrap().unwrap();
            // The grid is connected
            let route = sample.route.unwrap();
            assert_eq!(route.origin(), sample.from);
            assert_eq!(route.destination(), sample.to);
            assert_eq!(panel.latest_route(), Some(&route));
        }
    }

    #[test]
    fn test_random_route_on_empty_nest() {
        let mut registry = NestRegistry::default();
        let mut panel = DebugPanel::new(&NestConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(panel.random_route_test(&mut registry, &mut rng), Ok(None));
    }

    #[test]
    fn test_spawn_debug_ant_lands_on_a_node() {
        let (mut registry, mut panel, _) = grid(2, 2);
        let mut rng = StdRng::seed_from_u64(3);
        let id = panel.spawn_debug_ant(&mut registry, &mut rng).unwrap();
        let record = registry.data().ants.last().unwrap();
        assert!(registry.nearest_node(record.position, 1e-4).is_some());
        assert_eq!(panel.stats(&registry).ants, 1);
        assert!(registry.agent(id).is_some());
    }

    #[test]
    fn test_overlay_layers() {
        let (mut registry, mut panel, layout) = grid(2, 1);
        let from = registry.find_node(layout.rooms[0], "center").unwrap();
        let to = registry.find_node(layout.rooms[1], "center").unwrap();
        assert!(panel.latest_route().is_none());

        let overlay = panel.graph_overlay(&registry);
        assert_eq!(overlay.local_edges.len(), 2 * 4 + 1);
        assert_eq!(overlay.element_edges.len(), 2);
        assert!(overlay.latest_route.is_empty());

        panel.latest_route = registry.find_route(from, to).unwrap();
        let overlay = panel.graph_overlay(&registry);
        assert_eq!(overlay.latest_route.len(), 5);

        panel.show_graph = false;
        assert!(panel.graph_overlay(&registry).is_empty());
    }
}
