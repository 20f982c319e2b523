//! Building system - releases builders whose site is finished or gone

use hecs::Entity;

use crate::components::Behavior;
use crate::registry::NestRegistry;

pub fn building_system(registry: &mut NestRegistry) {
    let done: Vec<Entity> = registry
        .world()
        .query::<&Behavior>()
        .iter()
        .filter_map(|(entity, behavior)| match behavior {
            Behavior::Building { element } => {
                let active = registry
                    .element(*element)
                    .is_some_and(|e| e.is_under_construction());
                (!active).then_some(entity)
            }
            _ => None,
        })
        .collect();

    for entity in done {
        if let Ok(mut behavior) = registry.world_mut().get::<&mut Behavior>(entity) {
            *behavior = Behavior::Idle;
        }
    }
}
