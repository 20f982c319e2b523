//! Builder strategy - idle builders pick a construction site to walk to

use antnest_logic::{ElementId, NodeId, Route};
use hecs::Entity;

use crate::components::{Behavior, NestPosition, StrategyTimer};
use crate::registry::NestRegistry;

/// Where an idle builder decided to go.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTarget {
    pub element: ElementId,
    pub node: NodeId,
    /// Route from the builder's node to `node`, at least two nodes long
    pub route: Route,
}

/// One idle decision for a builder standing on `current`.
///
/// Candidates are the building nodes of every under-construction element,
/// ordered by straight-line distance from `current`. The first one with a
/// multi-hop route wins. Returns `None` when the builder is between nodes,
/// when nothing is under construction, or when no site is reachable.
pub fn choose_build_target(registry: &mut NestRegistry, current: Option<NodeId>) -> Option<BuildTarget> {
    if registry.building_elements().next().is_none() {
        return None;
    }
    let current = current?;
    let origin = registry.node(current)?.position;

    // TODO: order by movement cost instead of straight-line distance
    let mut candidates: Vec<(ElementId, NodeId, f32)> = registry
        .building_elements()
        .flat_map(|e| e.building_nodes().iter().map(move |&n| (e.id(), n)))
        .filter_map(|(e, n)| {
            let d = registry.node(n)?.position.distance(&origin);
            Some((e, n, d))
        })
        .collect();
    // Stable: equally distant nodes keep element registration order
    candidates.sort_by(|a, b| a.2.total_cmp(&b.2));

    for (element, node, _) in candidates {
        match registry.find_route(current, node) {
            Ok(Some(route)) if route.is_multi_hop() => {
                return Some(BuildTarget {
                    element,
                    node,
                    route,
                });
            }
            Ok(_) => {}
            Err(e) => log::warn!("skipping build candidate {}: {}", node, e),
        }
    }
    None
}

/// Run due idle decisions for every builder and start the chosen walks.
pub fn builder_strategy_system(registry: &mut NestRegistry, delta_seconds: f32, snap_distance: f32) {
    // Collect first: deciding needs &mut registry for route queries
    let mut due: Vec<(Entity, NestPosition)> = Vec::new();
    for (entity, (pos, behavior, timer)) in registry
        .world_mut()
        .query_mut::<(&NestPosition, &Behavior, &mut StrategyTimer)>()
    {
        if !behavior.is_idle() {
            continue;
        }
        if timer.tick(delta_seconds) {
            due.push((entity, *pos));
        }
    }

    for (entity, pos) in due {
        // Trust the recorded node only while it still exists
        let current = pos
            .node
            .filter(|&n| registry.node(n).is_some())
            .or_else(|| registry.nearest_node(pos.world, snap_distance));
        log::trace!("builder {:?} idle tick on {:?}", entity, current);

        let Some(target) = choose_build_target(registry, current) else {
            continue;
        };
        log::debug!(
            "builder {:?} heading to {} on {} ({} hops)",
            entity,
            target.node,
            target.element,
            target.route.hops()
        );
        let world = registry.world_mut();
        if let Ok(mut behavior) = world.get::<&mut Behavior>(entity) {
            *behavior = Behavior::moving_to(target.element, target.route);
        }
        if let Ok(mut p) = world.get::<&mut NestPosition>(entity) {
            p.node = current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AgentData, AgentRecord, ElementData, ElementRecord};
    use antnest_logic::Vec3;

    fn add(registry: &mut NestRegistry, data: ElementData) -> ElementId {
        registry.add_element(ElementRecord::new(data), true).unwrap()
    }

    #[test]
    fn test_no_sites_no_target() {
        let mut registry = NestRegistry::default();
        let home = add(&mut registry, ElementData::room(Vec3::ZERO, false));
        let center = registry.find_node(home, "center");
        assert!(choose_build_target(&mut registry, center).is_none());
    }

    #[test]
    fn test_mid_transit_is_noop() {
        let mut registry = NestRegistry::default();
        add(&mut registry, ElementData::room(Vec3::ZERO, true));
        assert!(choose_build_target(&mut registry, None).is_none());
    }

    #[test]
    fn test_disconnected_site_is_skipped() {
        let mut registry = NestRegistry::default();
        let home = add(&mut registry, ElementData::room(Vec3::ZERO, false));
        add(&mut registry, ElementData::room(Vec3::planar(10.0, 0.0), true));
        let center = registry.find_node(home, "center");
        assert!(choose_build_target(&mut registry, center).is_none());
    }

    #[test]
    fn test_nearest_reachable_port_wins() {
        let mut registry = NestRegistry::default();
        let home = add(&mut registry, ElementData::room(Vec3::ZERO, false));
        let site = add(&mut registry, ElementData::room(Vec3::planar(4.0, 0.0), true));
        let road = add(
            &mut registry,
            ElementData::road(Vec3::planar(1.0, 0.0), Vec3::planar(3.0, 0.0), false),
        );
        registry
            .connect(
                registry.find_node(home, "right").unwrap(),
                registry.find_node(road, "end_a").unwrap(),
            )
            .unwrap();
        registry
            .connect(
                registry.find_node(road, "end_b").unwrap(),
                registry.find_node(site, "left").unwrap(),
            )
            .unwrap();

        let center = registry.find_node(home, "center");
        let target = choose_build_target(&mut registry, center).unwrap();
        assert_eq!(target.element, site);
        assert_eq!(target.node, registry.find_node(site, "left").unwrap());
        assert_eq!(target.route.origin(), center.unwrap());
        assert_eq!(target.route.destination(), target.node);
    }

    #[test]
    fn test_standing_on_site_port_picks_another() {
        let mut registry = NestRegistry::default();
        let site = add(&mut registry, ElementData::room(Vec3::ZERO, true));
        let left = registry.find_node(site, "left").unwrap();
        let target = choose_build_target(&mut registry, Some(left)).unwrap();
        assert_ne!(target.node, left);
        assert!(target.route.len() >= 2);
    }

    #[test]
    fn test_system_respects_interval() {
        let mut registry = NestRegistry::default();
        let home = add(&mut registry, ElementData::room(Vec3::ZERO, true));
        let start = registry.node(registry.find_node(home, "center").unwrap()).unwrap().position;
        let id = registry
            .add_agent(AgentRecord::new(AgentData::Builder, start), true)
            .unwrap();
        let entity = registry.agent(id).unwrap().entity;

        builder_strategy_system(&mut registry, 0.5, 0.25);
        assert!(registry.world().get::<&Behavior>(entity).unwrap().is_idle());

        builder_strategy_system(&mut registry, 0.5, 0.25);
        let behavior = (*registry.world().get::<&Behavior>(entity).unwrap()).clone();
        assert!(matches!(
            behavior,
            Behavior::MovingToTarget { element, .. } if element == home
        ));
    }
}
