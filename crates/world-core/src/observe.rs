//! Per-entity observation generation.

use contracts::{
    Observation, ObservationEvent, ObservedTile, Position, TickResult,
};

use crate::error::WorldError;
use crate::world::GridWorld;

#[derive(Debug, Clone, Copy)]
pub struct ObservationParams {
    pub radius: i32,
    pub hearing_radius: i32,
}

/// Visibility predicate hook. The current policy is a plain Chebyshev
/// radius cap; an opacity-aware ray trace slots in here without touching
/// the callers.
pub fn is_visible(observer: Position, target: Position, _world: &GridWorld, radius: i32) -> bool {
    observer.chebyshev_distance(target) <= radius
}

/// Builds the self-contained observation for one entity at tick start:
/// the in-radius tile window, visible entities and objects, and the prior
/// tick's events filtered down to what this observer could perceive.
pub fn generate(
    world: &GridWorld,
    entity_id: &str,
    params: ObservationParams,
    deadline_ms: u64,
    prior: &TickResult,
) -> Result<Observation, WorldError> {
    let observer = world.get_entity(entity_id)?.clone();
    let center = observer.position;
    let radius = params.radius;

    let mut visible_tiles = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let position = Position::new(center.x + dx, center.y + dy);
            if !world.in_bounds(position) {
                continue;
            }
            let tile = world.tile_at(position);
            visible_tiles.push(ObservedTile {
                position,
                walkable: tile.walkable,
                opaque: tile.opaque,
                floor_type: tile.floor_type,
            });
        }
    }

    let visible_entities = world
        .entities()
        .values()
        .filter(|entity| entity.entity_id != entity_id)
        .filter(|entity| is_visible(center, entity.position, world, radius))
        .cloned()
        .collect();

    let visible_objects = world
        .objects()
        .values()
        .filter(|object| is_visible(center, object.position, world, radius))
        .cloned()
        .collect();

    let events = perceived_events(world, center, params, prior);

    Ok(Observation {
        tick_id: world.tick(),
        deadline_ms,
        self_entity: observer,
        visible_tiles,
        visible_entities,
        visible_objects,
        events,
    })
}

fn perceived_events(
    world: &GridWorld,
    center: Position,
    params: ObservationParams,
    prior: &TickResult,
) -> Vec<ObservationEvent> {
    let radius = params.radius;
    let mut events = Vec::new();

    for record in &prior.moves {
        if !record.success {
            continue;
        }
        let from_seen = is_visible(center, record.from, world, radius);
        let to_seen = is_visible(center, record.to, world, radius);
        if from_seen || to_seen {
            events.push(ObservationEvent::EntityMoved {
                entity_id: record.entity_id.clone(),
                from: record.from,
                to: record.to,
            });
        }
        if !from_seen && to_seen {
            events.push(ObservationEvent::EntityEntered {
                entity_id: record.entity_id.clone(),
                position: record.to,
            });
        }
        if from_seen && !to_seen {
            events.push(ObservationEvent::EntityLeft {
                entity_id: record.entity_id.clone(),
                position: record.from,
            });
        }
    }

    for spawned in &prior.spawns {
        if is_visible(center, spawned.position, world, radius) {
            events.push(ObservationEvent::EntityEntered {
                entity_id: spawned.entity_id.clone(),
                position: spawned.position,
            });
        }
    }
    for departed in &prior.despawns {
        if is_visible(center, departed.position, world, radius) {
            events.push(ObservationEvent::EntityLeft {
                entity_id: departed.entity_id.clone(),
                position: departed.position,
            });
        }
    }

    for change in &prior.object_changes {
        let seen = world
            .get_object(&change.object_id)
            .map(|object| is_visible(center, object.position, world, radius))
            .unwrap_or(false);
        if seen {
            events.push(ObservationEvent::ObjectChanged {
                object_id: change.object_id.clone(),
                field: change.field.clone(),
                old_value: change.old_value.clone(),
                new_value: change.new_value.clone(),
            });
        }
    }

    for utterance in &prior.utterances {
        if center.chebyshev_distance(utterance.position) <= params.hearing_radius {
            events.push(ObservationEvent::Utterance {
                entity_id: utterance.entity_id.clone(),
                text: utterance.text.clone(),
                channel: utterance.channel.clone(),
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Entity, MoveRecord, Utterance, WorldObject};

    fn spawn(world: &mut GridWorld, entity_id: &str, x: i32, y: i32) {
        world
            .spawn_entity(Entity {
                entity_id: entity_id.to_string(),
                position: Position::new(x, y),
                entity_type: "agent".to_string(),
                tags: Default::default(),
                status_bits: 0,
                inventory: Default::default(),
                spawn_tick: 0,
            })
            .expect("spawn");
    }

    fn params(radius: i32) -> ObservationParams {
        ObservationParams {
            radius,
            hearing_radius: radius,
        }
    }

    #[test]
    fn observation_is_bounded_by_the_chebyshev_radius() {
        let mut world = GridWorld::new(20, 20);
        spawn(&mut world, "observer", 10, 10);
        spawn(&mut world, "near", 12, 8);
        spawn(&mut world, "far", 16, 10);
        world
            .add_object(WorldObject {
                object_id: "bush_far".to_string(),
                position: Position::new(10, 16),
                object_type: "bush".to_string(),
                state: Default::default(),
                walkable: true,
                opaque: false,
            })
            .expect("add object");

        let observation = generate(
            &world,
            "observer",
            params(5),
            1_500,
            &TickResult::empty(0),
        )
        .expect("observation");

        let entity_ids: Vec<&str> = observation
            .visible_entities
            .iter()
            .map(|entity| entity.entity_id.as_str())
            .collect();
        assert_eq!(entity_ids, vec!["near"]);
        assert!(observation.visible_objects.is_empty());
        assert!(observation
            .visible_tiles
            .iter()
            .all(|tile| tile.position.chebyshev_distance(Position::new(10, 10)) <= 5));
        assert_eq!(observation.visible_tiles.len(), 11 * 11);
    }

    #[test]
    fn tile_window_clips_at_the_world_edge() {
        let mut world = GridWorld::new(20, 20);
        spawn(&mut world, "observer", 0, 0);
        let observation = generate(
            &world,
            "observer",
            params(5),
            1_500,
            &TickResult::empty(0),
        )
        .expect("observation");
        assert_eq!(observation.visible_tiles.len(), 6 * 6);
    }

    #[test]
    fn moved_entities_surface_as_moved_plus_boundary_crossings() {
        let mut world = GridWorld::new(30, 30);
        spawn(&mut world, "observer", 10, 10);
        spawn(&mut world, "walker", 16, 10);

        let mut prior = TickResult::empty(4);
        prior.moves.push(MoveRecord::succeeded(
            "walker",
            Position::new(16, 10),
            Position::new(15, 10),
        ));

        let observation = generate(&world, "observer", params(5), 0, &prior).expect("observation");
        assert!(observation.events.iter().any(|event| matches!(
            event,
            ObservationEvent::EntityMoved { entity_id, .. } if entity_id == "walker"
        )));
        assert!(observation.events.iter().any(|event| matches!(
            event,
            ObservationEvent::EntityEntered { entity_id, .. } if entity_id == "walker"
        )));
    }

    #[test]
    fn utterances_respect_the_hearing_radius() {
        let mut world = GridWorld::new(30, 30);
        spawn(&mut world, "observer", 10, 10);
        spawn(&mut world, "shouter", 14, 10);
        spawn(&mut world, "whisperer", 18, 10);

        let mut prior = TickResult::empty(4);
        for (entity_id, x) in [("shouter", 14), ("whisperer", 18)] {
            prior.utterances.push(Utterance {
                entity_id: entity_id.to_string(),
                position: Position::new(x, 10),
                text: "hey".to_string(),
                channel: "local".to_string(),
            });
        }

        let observation = generate(&world, "observer", params(5), 0, &prior).expect("observation");
        let heard: Vec<&str> = observation
            .events
            .iter()
            .filter_map(|event| match event {
                ObservationEvent::Utterance { entity_id, .. } => Some(entity_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(heard, vec!["shouter"]);
    }

    #[test]
    fn object_changes_require_the_object_to_be_visible() {
        let mut world = GridWorld::new(30, 30);
        spawn(&mut world, "observer", 10, 10);
        for (object_id, x) in [("bush_near", 12), ("bush_far", 20)] {
            world
                .add_object(WorldObject {
                    object_id: object_id.to_string(),
                    position: Position::new(x, 10),
                    object_type: "bush".to_string(),
                    state: Default::default(),
                    walkable: true,
                    opaque: false,
                })
                .expect("add object");
        }

        let mut prior = TickResult::empty(4);
        for object_id in ["bush_near", "bush_far"] {
            prior.object_changes.push(contracts::ObjectChange {
                object_id: object_id.to_string(),
                field: "berry_count".to_string(),
                old_value: "3".to_string(),
                new_value: "2".to_string(),
            });
        }

        let observation = generate(&world, "observer", params(5), 0, &prior).expect("observation");
        let changed: Vec<&str> = observation
            .events
            .iter()
            .filter_map(|event| match event {
                ObservationEvent::ObjectChanged { object_id, .. } => Some(object_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(changed, vec!["bush_near"]);
    }
}
