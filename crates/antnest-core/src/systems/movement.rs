//! Movement system - walks builders node to node along their route

use antnest_logic::{ElementId, NodeId};
use hecs::Entity;

use crate::components::{Behavior, NestPosition};
use crate::registry::NestRegistry;

/// Advance every `MovingToTarget` ant by `speed * delta_seconds`.
///
/// An ant reaching its last waypoint switches to `Building`. If the next
/// waypoint no longer exists the ant drops back to `Idle` and will re-plan on
/// its next strategy tick.
pub fn movement_system(registry: &mut NestRegistry, delta_seconds: f32, speed: f32) {
    let mut updates: Vec<(Entity, NestPosition, Behavior)> = Vec::new();

    for (entity, (pos, behavior)) in registry.world().query::<(&NestPosition, &Behavior)>().iter() {
        if let Behavior::MovingToTarget { .. } = behavior {
            let (new_pos, new_behavior) = step(registry, pos, behavior, delta_seconds * speed);
            updates.push((entity, new_pos, new_behavior));
        }
    }

    let world = registry.world_mut();
    for (entity, new_pos, new_behavior) in updates {
        if let Ok(mut pos) = world.get::<&mut NestPosition>(entity) {
            *pos = new_pos;
        }
        if let Ok(mut behavior) = world.get::<&mut Behavior>(entity) {
            *behavior = new_behavior;
        }
    }
}

fn step(registry: &NestRegistry, pos: &NestPosition, behavior: &Behavior, distance: f32) -> (NestPosition, Behavior) {
    let Behavior::MovingToTarget {
        element,
        target,
        route,
        next,
    } = behavior
    else {
        return (*pos, behavior.clone());
    };

    let Some(&waypoint) = route.get(*next) else {
        return arrive(pos, *element, *target);
    };
    let Some(waypoint_pos) = registry.node(waypoint).map(|n| n.position) else {
        log::debug!("route broken at {}, back to idle", waypoint);
        return (
            NestPosition {
                world: pos.world,
                node: None,
            },
            Behavior::Idle,
        );
    };

    let remaining = pos.world.distance(&waypoint_pos);
    if distance >= remaining {
        let reached = NestPosition {
            world: waypoint_pos,
            node: Some(waypoint),
        };
        if *next + 1 >= route.len() {
            return arrive(&reached, *element, waypoint);
        }
        return (
            reached,
            Behavior::MovingToTarget {
                element: *element,
                target: *target,
                route: route.clone(),
                next: next + 1,
            },
        );
    }

    let direction = (waypoint_pos - pos.world).normalize();
    (
        NestPosition {
            world: pos.world + direction * distance,
            node: None,
        },
        behavior.clone(),
    )
}

fn arrive(pos: &NestPosition, element: ElementId, node: NodeId) -> (NestPosition, Behavior) {
    (
        NestPosition {
            world: pos.world,
            node: Some(node),
        },
        Behavior::Building { element },
    )
}
