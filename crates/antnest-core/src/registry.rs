//! The live nest: elements, inter-element edges and spawned ants.
//!
//! `NestRegistry` is the only place topology changes. Every mutating call
//! clears the route cache before it returns, so a route handed out by
//! [`NestRegistry::find_route`] always reflects the current graph.
//!
//! The persisted mirror ([`NestData`]) is kept in step with the live
//! collections by the same calls. `persist = false` is for rebuilding from
//! records that are already in the mirror.

use antnest_logic::{
    find_route, EdgeId, ElementId, NavGraph, NodeId, PathNode, Route, RouteCache, RouteError, Vec3,
};
use hecs::{Entity, World};
use indexmap::IndexMap;
use thiserror::Error;

use crate::components::{Ant, AgentId};
use crate::config::NestConfig;
use crate::data::{AgentDataKind, AgentRecord, EdgeRecord, ElementRecord, NestData, NodeRef, RecordId};
use crate::element::{ElementBlueprint, ElementEdge, ElementKind, NestElement};
use crate::factory::FactorySet;

/// Misuse of the registry API. These indicate a bug at the call site.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("element has no backing data; attach an ElementRecord before registering")]
    MissingData,
    #[error("element data {0} is already registered")]
    DuplicateRegistration(RecordId),
    #[error("element blueprint refers to nodes it does not define")]
    InconsistentBlueprint,
    #[error("element {0} is not registered")]
    UnknownElement(ElementId),
    #[error("node {0} is not registered")]
    UnknownNode(NodeId),
    #[error("nodes {0} and {1} belong to the same element")]
    SameElement(NodeId, NodeId),
    #[error("edge {0} is not registered")]
    UnknownEdge(EdgeId),
    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),
}

/// A spawned ant as seen by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub record: RecordId,
    pub kind: AgentDataKind,
    /// The ant's entity in [`NestRegistry::world`].
    pub entity: Entity,
}

pub struct NestRegistry {
    factories: FactorySet,
    data: NestData,
    graph: NavGraph,
    elements: IndexMap<ElementId, NestElement>,
    edges: IndexMap<EdgeId, ElementEdge>,
    agents: IndexMap<AgentId, Agent>,
    world: World,
    cache: RouteCache,
    next_element: u32,
    next_edge: u32,
    next_agent: u32,
}

impl NestRegistry {
    /// Empty nest dispatching to `factories`.
    pub fn new(factories: FactorySet) -> Self {
        Self {
            factories,
            data: NestData::default(),
            graph: NavGraph::new(),
            elements: IndexMap::new(),
            edges: IndexMap::new(),
            agents: IndexMap::new(),
            world: World::new(),
            cache: RouteCache::new(),
            next_element: 0,
            next_edge: 0,
            next_agent: 0,
        }
    }

    /// Empty nest with the built-in factories.
    pub fn with_config(config: &NestConfig) -> Self {
        Self::new(FactorySet::standard(config))
    }

    // ── Elements ────────────────────────────────────────────────────────

    /// Instantiate an element from its record through the matching factory.
    ///
    /// Returns `None` (and logs a warning) if no factory handles the data.
    pub fn add_element(&mut self, record: ElementRecord, persist: bool) -> Option<ElementId> {
        let kind = record.data.kind();
        let duplicate = if persist {
            self.is_record_registered(record.id)
        } else {
            self.elements.values().any(|e| e.record.id == record.id)
        };
        if duplicate {
            log::warn!("element data {} is already registered", record.id);
            return None;
        }
        let Some(factory) = self.factories.element_factory(kind) else {
            log::warn!("no element factory registered for {:?}", kind);
            return None;
        };
        let Some(blueprint) = factory.instantiate(&record.data) else {
            log::warn!(
                "{:?} factory produced nothing for {:?} data",
                factory.data_kind(),
                kind
            );
            return None;
        };
        if !blueprint.is_consistent() {
            log::warn!("{:?} factory produced an inconsistent blueprint", kind);
            return None;
        }

        if persist {
            self.data.structure.elements.push(record.clone());
        }
        let id = self.insert_element(record, blueprint);
        self.topology_changed("element added");
        Some(id)
    }

    /// Register an element built outside the registry.
    ///
    /// The blueprint must carry its backing record, and that record must not
    /// be registered yet.
    pub fn register_external(&mut self, mut blueprint: ElementBlueprint) -> Result<ElementId, RegistryError> {
        let record = blueprint.record.take().ok_or(RegistryError::MissingData)?;
        if self.is_record_registered(record.id) {
            return Err(RegistryError::DuplicateRegistration(record.id));
        }
        if !blueprint.is_consistent() {
            return Err(RegistryError::InconsistentBlueprint);
        }

        self.data.structure.elements.push(record.clone());
        let id = self.insert_element(record, blueprint);
        self.topology_changed("external element registered");
        Ok(id)
    }

    /// Remove an element, its nodes, and every inter-element edge touching it.
    pub fn remove_element(&mut self, id: ElementId) -> Result<NestElement, RegistryError> {
        let element = self
            .elements
            .shift_remove(&id)
            .ok_or(RegistryError::UnknownElement(id))?;
        if let Some(pos) = self
            .data
            .structure
            .elements
            .iter()
            .position(|r| r.id == element.record.id)
        {
            self.data.structure.elements.remove(pos);
        }

        let touching: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.touches(id))
            .map(|e| e.id)
            .collect();
        for edge in touching {
            self.drop_edge(edge);
        }
        for &node in &element.nodes {
            self.graph.remove_node(node);
        }

        self.topology_changed("element removed");
        Ok(element)
    }

    /// Mark an under-construction element as finished.
    ///
    /// Returns `Ok(false)` if the element was not under construction.
    pub fn complete_construction(&mut self, id: ElementId) -> Result<bool, RegistryError> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(RegistryError::UnknownElement(id))?;
        if element.kind != ElementKind::UnderConstruction {
            return Ok(false);
        }
        element.kind = ElementKind::Finished;
        element.record.data.set_under_construction(false);
        let record_id = element.record.id;
        if let Some(r) = self
            .data
            .structure
            .elements
            .iter_mut()
            .find(|r| r.id == record_id)
        {
            r.data.set_under_construction(false);
        }

        self.topology_changed("construction completed");
        Ok(true)
    }

    fn insert_element(&mut self, record: ElementRecord, blueprint: ElementBlueprint) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;

        let nodes: Vec<NodeId> = blueprint
            .nodes
            .iter()
            .map(|spec| self.graph.add_node(id, spec.name.clone(), spec.position))
            .collect();
        let local_edges: Vec<(NodeId, NodeId)> = blueprint
            .local_edges
            .iter()
            .map(|&(a, b)| (nodes[a], nodes[b]))
            .collect();
        for &(a, b) in &local_edges {
            self.graph.link(a, b);
        }
        let building_nodes = blueprint.building_nodes.iter().map(|&i| nodes[i]).collect();

        let kind = ElementKind::of(&record.data);
        self.elements.insert(
            id,
            NestElement {
                id,
                record,
                kind,
                nodes,
                local_edges,
                building_nodes,
            },
        );
        id
    }

    fn is_record_registered(&self, record: RecordId) -> bool {
        self.data.structure.elements.iter().any(|r| r.id == record)
            || self.elements.values().any(|e| e.record.id == record)
    }

    // ── Edges ───────────────────────────────────────────────────────────

    /// Connect nodes of two different elements.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<EdgeId, RegistryError> {
        let a_ref = self.node_ref(a)?;
        let b_ref = self.node_ref(b)?;
        if a_ref.element == b_ref.element {
            return Err(RegistryError::SameElement(a, b));
        }

        let record = EdgeRecord {
            id: RecordId::new(),
            a: a_ref,
            b: b_ref,
        };
        let record_id = record.id;
        self.data.structure.edges.push(record);
        let id = self.insert_edge(record_id, a, b)?;
        self.topology_changed("elements connected");
        Ok(id)
    }

    /// Remove a single inter-element edge.
    pub fn disconnect(&mut self, id: EdgeId) -> Result<(), RegistryError> {
        self.drop_edge(id).ok_or(RegistryError::UnknownEdge(id))?;
        self.topology_changed("elements disconnected");
        Ok(())
    }

    fn insert_edge(&mut self, record: RecordId, a: NodeId, b: NodeId) -> Result<EdgeId, RegistryError> {
        let a_host = self.graph.node(a).ok_or(RegistryError::UnknownNode(a))?.host;
        let b_host = self.graph.node(b).ok_or(RegistryError::UnknownNode(b))?.host;
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.graph.link(a, b);
        self.edges.insert(
            id,
            ElementEdge {
                id,
                record,
                a,
                b,
                a_host,
                b_host,
            },
        );
        Ok(id)
    }

    /// Unlink and forget an edge without firing topology-changed.
    fn drop_edge(&mut self, id: EdgeId) -> Option<ElementEdge> {
        let edge = self.edges.shift_remove(&id)?;
        self.graph.unlink(edge.a, edge.b);
        self.data.structure.edges.retain(|r| r.id != edge.record);
        Some(edge)
    }

    fn node_ref(&self, node: NodeId) -> Result<NodeRef, RegistryError> {
        let path_node = self.graph.node(node).ok_or(RegistryError::UnknownNode(node))?;
        let host = self
            .elements
            .get(&path_node.host)
            .ok_or(RegistryError::UnknownNode(node))?;
        Ok(NodeRef {
            element: host.record.id,
            node: path_node.name.clone(),
        })
    }

    fn resolve(&self, node: &NodeRef) -> Option<NodeId> {
        let element = self.elements.values().find(|e| e.record.id == node.element)?;
        element
            .nodes
            .iter()
            .copied()
            .find(|&n| self.graph.node(n).is_some_and(|p| p.name == node.node))
    }

    // ── Agents ──────────────────────────────────────────────────────────

    /// Spawn an ant through the factory for its exact data kind.
    pub fn add_agent(&mut self, record: AgentRecord, persist: bool) -> Option<AgentId> {
        let kind = record.data.kind();
        let Some(factory) = self.factories.agent_factory(kind) else {
            log::warn!("no agent factory registered for {:?}", kind);
            return None;
        };
        let Some(entity) = factory.instantiate(&record, &mut self.world) else {
            log::warn!("{:?} agent factory produced nothing", kind);
            return None;
        };

        let id = AgentId(self.next_agent);
        let tagged = self.world.insert_one(
            entity,
            Ant {
                id,
                record: record.id,
                kind,
            },
        );
        if let Err(e) = tagged {
            log::warn!("{:?} agent factory returned a dead entity: {}", kind, e);
            return None;
        }
        self.next_agent += 1;
        self.agents.insert(
            id,
            Agent {
                id,
                record: record.id,
                kind,
                entity,
            },
        );
        if persist {
            self.data.ants.push(record);
        }
        Some(id)
    }

    /// Forget an ant and drop its save record.
    ///
    /// The entity is left in [`Self::world`]; despawning it is the caller's job.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<Agent, RegistryError> {
        let agent = self
            .agents
            .shift_remove(&id)
            .ok_or(RegistryError::UnknownAgent(id))?;
        self.data.ants.retain(|r| r.id != agent.record);
        Ok(agent)
    }

    // ── Routes ──────────────────────────────────────────────────────────

    /// Cached least-cost route between two registered nodes.
    ///
    /// `Ok(None)` means the nodes are disconnected. `Err` means one of them is
    /// not registered.
    pub fn find_route(&mut self, from: NodeId, to: NodeId) -> Result<Option<Route>, RouteError> {
        if let Some(hit) = self.cache.get(from, to) {
            log::trace!("route cache hit {} -> {}", from, to);
            return Ok(hit);
        }
        let route = find_route(&self.graph, from, to)?;
        self.cache.insert(from, to, route.clone());
        Ok(route)
    }

    fn topology_changed(&mut self, reason: &str) {
        self.cache.clear();
        log::debug!(
            "topology changed ({}), route cache epoch {}",
            reason,
            self.cache.epoch()
        );
    }

    // ── Load ────────────────────────────────────────────────────────────

    /// Tear down the live nest and rebuild it from `data`.
    ///
    /// Every ant entity is despawned. Records are instantiated in the order
    /// ants, elements, edges. Records that cannot be instantiated or resolved
    /// are logged and stay in the persisted data untouched.
    pub fn load(&mut self, data: NestData) {
        // Despawn one by one: `World::clear` resets generations, which would
        // let stale handles resolve to freshly loaded ants.
        let entities: Vec<Entity> = self.world.iter().map(|e| e.entity()).collect();
        for entity in entities {
            let _ = self.world.despawn(entity);
        }
        self.agents.clear();
        self.elements.clear();
        self.edges.clear();
        self.graph = NavGraph::new();
        self.data = data;

        for record in self.data.ants.clone() {
            self.add_agent(record, false);
        }
        for record in self.data.structure.elements.clone() {
            self.add_element(record, false);
        }
        for record in self.data.structure.edges.clone() {
            match (self.resolve(&record.a), self.resolve(&record.b)) {
                (Some(a), Some(b)) => {
                    if let Err(e) = self.insert_edge(record.id, a, b) {
                        log::warn!("edge record {} skipped: {}", record.id, e);
                    }
                }
                _ => log::warn!(
                    "edge record {} refers to a node that was not loaded",
                    record.id
                ),
            }
        }

        self.topology_changed("nest loaded");
        log::info!(
            "nest loaded: {} ants, {} elements, {} edges",
            self.agents.len(),
            self.elements.len(),
            self.edges.len()
        );
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Persisted mirror of the live nest.
    pub fn data(&self) -> &NestData {
        &self.data
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.graph.node(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PathNode)> {
        self.graph.nodes()
    }

    /// Node of `element` with the given port name.
    pub fn find_node(&self, element: ElementId, name: &str) -> Option<NodeId> {
        self.elements.get(&element)?.nodes.iter().copied().find(|&n| {
            self.graph
                .node(n)
                .is_some_and(|p| p.name == name)
        })
    }

    /// Closest node within `max_distance` of `position`.
    pub fn nearest_node(&self, position: Vec3, max_distance: f32) -> Option<NodeId> {
        self.graph.nearest(position, max_distance)
    }

    pub fn element(&self, id: ElementId) -> Option<&NestElement> {
        self.elements.get(&id)
    }

    /// Elements in registration order.
    pub fn elements(&self) -> impl Iterator<Item = &NestElement> {
        self.elements.values()
    }

    pub fn building_elements(&self) -> impl Iterator<Item = &NestElement> {
        self.elements.values().filter(|e| e.is_under_construction())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&ElementEdge> {
        self.edges.get(&id)
    }

    pub fn element_edges(&self) -> impl Iterator<Item = &ElementEdge> {
        self.edges.values()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for NestRegistry {
    fn default() -> Self {
        Self::with_config(&NestConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::NestPosition;
    use crate::data::{AgentData, ElementData};
    use crate::data::AgentDataKind;
    use crate::factory::{AgentFactory, ElementFactory, RoomFactory};

    /// Hands back an entity it has already despawned.
    struct VanishingAntFactory;

    impl AgentFactory for VanishingAntFactory {
        fn data_kind(&self) -> AgentDataKind {
            AgentDataKind::Debug
        }

        fn instantiate(&self, record: &AgentRecord, world: &mut World) -> Option<Entity> {
            let entity = world.spawn((NestPosition::at(record.position),));
            world.despawn(entity).ok()?;
            Some(entity)
        }
    }

    fn room(registry: &mut NestRegistry, x: f32, building: bool) -> ElementId {
        registry
            .add_element(
                ElementRecord::new(ElementData::room(Vec3::planar(x, 0.0), building)),
                true,
            )
            .unwrap()
    }

    /// Two rooms joined left-to-right by a road. Returns (left room, road, right room).
    fn two_rooms(registry: &mut NestRegistry) -> (ElementId, ElementId, ElementId) {
        let a = room(registry, 0.0, false);
        let b = room(registry, 4.0, false);
        let from = registry.node(registry.find_node(a, "right").unwrap()).unwrap().position;
        let to = registry.node(registry.find_node(b, "left").unwrap()).unwrap().position;
        let road = registry
            .add_element(ElementRecord::new(ElementData::road(from, to, false)), true)
            .unwrap();
        let r1 = registry.find_node(road, "end_a").unwrap();
        let r2 = registry.find_node(road, "end_b").unwrap();
        registry.connect(registry.find_node(a, "right").unwrap(), r1).unwrap();
        registry.connect(r2, registry.find_node(b, "left").unwrap()).unwrap();
        (a, road, b)
    }

    #[test]
    fn test_add_element_registers_nodes() {
        let mut registry = NestRegistry::default();
        let id = room(&mut registry, 0.0, false);
        let element = registry.element(id).unwrap();
        assert_eq!(element.nodes().len(), 5);
        assert_eq!(element.kind(), ElementKind::Finished);
        for &n in element.nodes() {
            assert_eq!(registry.node(n).unwrap().host, id);
        }
        for &(a, b) in element.local_edges() {
            assert!(element.nodes().contains(&a));
            assert!(element.nodes().contains(&b));
        }
        assert_eq!(registry.data().structure.elements.len(), 1);
    }

    #[test]
    fn test_add_element_without_persist() {
        let mut registry = NestRegistry::default();
        registry
            .add_element(ElementRecord::new(ElementData::junction(Vec3::ZERO)), false)
            .unwrap();
        assert_eq!(registry.element_count(), 1);
        assert!(registry.data().structure.elements.is_empty());
    }

    #[test]
    fn test_missing_factory_yields_none() {
        let mut registry = NestRegistry::new(FactorySet::empty().with_element(RoomFactory));
        let record = ElementRecord::new(ElementData::junction(Vec3::ZERO));
        assert!(registry.add_element(record, true).is_none());
        assert_eq!(registry.element_count(), 0);
        assert!(registry.data().structure.elements.is_empty());
        assert!(registry
            .add_agent(AgentRecord::new(AgentData::Builder, Vec3::ZERO), true)
            .is_none());
    }

    #[test]
    fn test_every_mutation_clears_cache() {
        let mut registry = NestRegistry::default();
        let (a, road, b) = two_rooms(&mut registry);
        let from = registry.find_node(a, "center").unwrap();
        let to = registry.find_node(b, "center").unwrap();

        let warm = |registry: &mut NestRegistry| {
            registry.find_route(from, to).unwrap();
            assert!(!registry.cache().is_empty());
        };

        warm(&mut registry);
        room(&mut registry, 20.0, true);
        assert!(registry.cache().is_empty());

        warm(&mut registry);
        let edge = registry.element_edges().next().unwrap().id;
        registry.disconnect(edge).unwrap();
        assert!(registry.cache().is_empty());

        warm(&mut registry);
        let site = registry.building_elements().next().unwrap().id();
        registry.complete_construction(site).unwrap();
        assert!(registry.cache().is_empty());

        warm(&mut registry);
        registry.remove_element(road).unwrap();
        assert!(registry.cache().is_empty());
    }

    #[test]
    fn test_cache_transparency() {
        let mut registry = NestRegistry::default();
        let (a, _, b) = two_rooms(&mut registry);
        let from = registry.find_node(a, "left").unwrap();
        let to = registry.find_node(b, "right").unwrap();
        let first = registry.find_route(from, to).unwrap().unwrap();
        let hits = registry.cache().hits();
        let second = registry.find_route(from, to).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.cache().hits(), hits + 1);
        assert_eq!(first, find_route(registry.graph(), from, to).unwrap().unwrap());
    }

    #[test]
    fn test_remove_element_cascades_edges() {
        let mut registry = NestRegistry::default();
        let (a, road, b) = two_rooms(&mut registry);
        let from = registry.find_node(a, "center").unwrap();
        let to = registry.find_node(b, "center").unwrap();
        assert!(registry.find_route(from, to).unwrap().is_some());

        let removed = registry.remove_element(road).unwrap();
        assert_eq!(registry.edge_count(), 0);
        assert!(registry.data().structure.edges.is_empty());
        assert!(registry.element_edges().all(|e| !e.touches(road)));
        for &n in removed.nodes() {
            assert!(registry.node(n).is_none());
        }
        assert_eq!(registry.find_route(from, to), Ok(None));
        assert_eq!(
            registry.remove_element(road).unwrap_err(),
            RegistryError::UnknownElement(road)
        );
    }

    #[test]
    fn test_removed_node_is_invalid_query() {
        let mut registry = NestRegistry::default();
        let (a, road, _) = two_rooms(&mut registry);
        let end = registry.find_node(road, "end_a").unwrap();
        let center = registry.find_node(a, "center").unwrap();
        registry.remove_element(road).unwrap();
        assert_eq!(
            registry.find_route(center, end),
            Err(RouteError::NodeNotInGraph(end))
        );
    }

    #[test]
    fn test_connect_rejects_same_element_and_unknown_nodes() {
        let mut registry = NestRegistry::default();
        let a = room(&mut registry, 0.0, false);
        let left = registry.find_node(a, "left").unwrap();
        let right = registry.find_node(a, "right").unwrap();
        assert_eq!(
            registry.connect(left, right),
            Err(RegistryError::SameElement(left, right))
        );
        assert_eq!(
            registry.connect(left, NodeId(999)),
            Err(RegistryError::UnknownNode(NodeId(999)))
        );
        assert!(registry.data().structure.edges.is_empty());
    }

    #[test]
    fn test_register_external_requires_data() {
        let mut registry = NestRegistry::default();
        let data = ElementData::room(Vec3::ZERO, true);
        let blueprint = RoomFactory.instantiate(&data).unwrap();
        assert_eq!(
            registry.register_external(blueprint.clone()),
            Err(RegistryError::MissingData)
        );

        let record = ElementRecord::new(data);
        let record_id = record.id;
        let blueprint = blueprint.with_record(record);
        let id = registry.register_external(blueprint.clone()).unwrap();
        assert_eq!(registry.element(id).unwrap().record_id(), record_id);
        assert_eq!(registry.data().structure.elements.len(), 1);
        assert_eq!(
            registry.register_external(blueprint),
            Err(RegistryError::DuplicateRegistration(record_id))
        );
        assert_eq!(registry.element_count(), 1);
    }

    #[test]
    fn test_complete_construction_updates_record() {
        let mut registry = NestRegistry::default();
        let site = room(&mut registry, 0.0, true);
        assert_eq!(registry.building_elements().count(), 1);
        assert_eq!(registry.element(site).unwrap().building_nodes().len(), 4);

        assert_eq!(registry.complete_construction(site), Ok(true));
        assert_eq!(registry.building_elements().count(), 0);
        assert!(registry.element(site).unwrap().building_nodes().is_empty());
        assert!(!registry.data().structure.elements[0].data.under_construction());
        assert_eq!(registry.complete_construction(site), Ok(false));
    }

    #[test]
    fn test_remove_agent_keeps_entity() {
        let mut registry = NestRegistry::default();
        let id = registry
            .add_agent(AgentRecord::new(AgentData::Builder, Vec3::ZERO), true)
            .unwrap();
        assert_eq!(registry.data().ants.len(), 1);
        let agent = registry.remove_agent(id).unwrap();
        assert!(registry.data().ants.is_empty());
        assert_eq!(registry.agent_count(), 0);
        assert!(registry.world().get::<&NestPosition>(agent.entity).is_ok());
        assert_eq!(
            registry.remove_agent(id).unwrap_err(),
            RegistryError::UnknownAgent(id)
        );
    }

    #[test]
    fn test_load_rebuilds_in_order() {
        let mut registry = NestRegistry::default();
        let (a, _, b) = two_rooms(&mut registry);
        registry
            .add_agent(AgentRecord::new(AgentData::Builder, Vec3::ZERO), true)
            .unwrap();
        let old_entity = registry.agents().next().unwrap().entity;
        let from = registry.find_node(a, "center").unwrap();
        let to = registry.find_node(b, "center").unwrap();
        let before = registry.find_route(from, to).unwrap().unwrap();
        let data = registry.data().clone();

        registry.load(data.clone());
        assert_eq!(registry.data(), &data);
        assert_eq!(registry.element_count(), 3);
        assert_eq!(registry.edge_count(), 2);
        assert_eq!(registry.agent_count(), 1);
        assert!(registry.cache().is_empty());
        assert!(!registry.world().contains(old_entity));

        // Handles changed, the route shape did not
        let a2 = registry.elements().next().unwrap().id();
        let b2 = registry.elements().nth(1).unwrap().id();
        let from = registry.find_node(a2, "center").unwrap();
        let to = registry.find_node(b2, "center").unwrap();
        let after = registry.find_route(from, to).unwrap().unwrap();
        assert_eq!(after.len(), before.len());
    }

    #[test]
    fn test_load_invalidates_old_entity_handles() {
        let mut registry = NestRegistry::default();
        let dropped = registry
            .add_agent(AgentRecord::new(AgentData::Builder, Vec3::ZERO), true)
            .unwrap();
        let dropped_entity = registry.remove_agent(dropped).unwrap().entity;
        registry
            .add_agent(AgentRecord::new(AgentData::Debug, Vec3::ZERO), true)
            .unwrap();
        let kept_entity = registry.agents().next().unwrap().entity;

        let data = registry.data().clone();
        registry.load(data);
        assert_eq!(registry.agent_count(), 1);
        assert!(!registry.world().contains(dropped_entity));
        assert!(!registry.world().contains(kept_entity));
        assert!(registry.world().get::<&Ant>(dropped_entity).is_err());
        assert!(registry.world().get::<&Ant>(kept_entity).is_err());

        let fresh = registry.agents().next().unwrap().entity;
        assert_ne!(fresh, dropped_entity);
        assert_ne!(fresh, kept_entity);
        assert_eq!(registry.world().iter().count(), 1);
    }

    #[test]
    fn test_duplicate_element_record_is_rejected() {
        let mut registry = NestRegistry::default();
        let record = ElementRecord::new(ElementData::room(Vec3::ZERO, false));
        let id = registry.add_element(record.clone(), true).unwrap();
        assert!(registry.add_element(record.clone(), true).is_none());
        assert!(registry.add_element(record, false).is_none());
        assert_eq!(registry.element_count(), 1);
        assert_eq!(registry.data().structure.elements.len(), 1);
        assert_eq!(registry.graph().node_count(), 5);

        registry.remove_element(id).unwrap();
        assert_eq!(registry.element_count(), 0);
        assert!(registry.data().structure.elements.is_empty());
    }

    #[test]
    fn test_remove_element_drops_one_persisted_copy() {
        let mut registry = NestRegistry::default();
        let record = ElementRecord::new(ElementData::room(Vec3::ZERO, false));
        let mut data = NestData::default();
        data.structure.elements.push(record.clone());
        data.structure.elements.push(record);

        registry.load(data);
        assert_eq!(registry.element_count(), 1);
        assert_eq!(registry.data().structure.elements.len(), 2);

        let id = registry.elements().next().unwrap().id();
        registry.remove_element(id).unwrap();
        assert_eq!(registry.data().structure.elements.len(), 1);
    }

    #[test]
    fn test_dead_agent_entity_is_not_registered() {
        let mut registry = NestRegistry::new(FactorySet::empty().with_agent(VanishingAntFactory));
        let record = AgentRecord::new(AgentData::Debug, Vec3::ZERO);
        assert!(registry.add_agent(record, true).is_none());
        assert_eq!(registry.agent_count(), 0);
        assert!(registry.data().ants.is_empty());
        assert_eq!(registry.world().iter().count(), 0);
    }

    #[test]
    fn test_load_skips_dangling_edge_record() {
        let mut registry = NestRegistry::default();
        two_rooms(&mut registry);
        let mut data = registry.data().clone();
        data.structure.edges[0].a.node = "nowhere".into();

        registry.load(data);
        assert_eq!(registry.edge_count(), 1);
        assert_eq!(registry.data().structure.edges.len(), 2);
    }
}
