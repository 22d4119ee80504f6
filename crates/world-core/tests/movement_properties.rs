use std::collections::{BTreeMap, BTreeSet};

use contracts::{Direction, Entity, Intent, MoveFailure, Position};
use proptest::prelude::*;
use world_core::{run_tick, GridWorld};

const GRID: i32 = 6;

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::North),
        Just(Direction::Northeast),
        Just(Direction::East),
        Just(Direction::Southeast),
        Just(Direction::South),
        Just(Direction::Southwest),
        Just(Direction::West),
        Just(Direction::Northwest),
    ]
}

/// Up to eight entities on distinct tiles of a 6x6 grid, each with a
/// heading for the tick.
fn crowd_strategy() -> impl Strategy<Value = Vec<(Position, Direction)>> {
    (
        proptest::collection::btree_set(0..(GRID * GRID), 1..=8),
        proptest::collection::vec(direction_strategy(), 8),
    )
        .prop_map(|(cells, directions)| {
            cells
                .into_iter()
                .zip(directions)
                .map(|(cell, direction)| {
                    (Position::new(cell % GRID, cell / GRID), direction)
                })
                .collect()
        })
}

fn build_world(crowd: &[(Position, Direction)]) -> (GridWorld, BTreeMap<String, Intent>) {
    let mut world = GridWorld::new(GRID, GRID);
    let mut intents = BTreeMap::new();
    for (index, (position, direction)) in crowd.iter().enumerate() {
        let entity_id = format!("e{index:02}");
        world
            .spawn_entity(Entity {
                entity_id: entity_id.clone(),
                position: *position,
                entity_type: "agent".to_string(),
                tags: Default::default(),
                status_bits: 0,
                inventory: Default::default(),
                spawn_tick: 0,
            })
            .expect("distinct cells");
        intents.insert(
            entity_id,
            Intent::Move {
                direction: *direction,
            },
        );
    }
    (world, intents)
}

proptest! {
    #[test]
    fn identical_input_yields_identical_outcomes(crowd in crowd_strategy()) {
        let (mut world_a, intents_a) = build_world(&crowd);
        let (mut world_b, intents_b) = build_world(&crowd);

        let result_a = run_tick(&mut world_a, intents_a, Vec::new(), 10).expect("tick a");
        let result_b = run_tick(&mut world_b, intents_b, Vec::new(), 10).expect("tick b");

        prop_assert_eq!(result_a, result_b);
        prop_assert_eq!(
            world_a.entities().values().map(|e| (e.entity_id.clone(), e.position)).collect::<Vec<_>>(),
            world_b.entities().values().map(|e| (e.entity_id.clone(), e.position)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn invariants_hold_after_any_resolved_tick(crowd in crowd_strategy()) {
        let (mut world, intents) = build_world(&crowd);
        run_tick(&mut world, intents, Vec::new(), 10).expect("tick");
        prop_assert!(world.verify_invariants().is_ok());
    }

    #[test]
    fn winners_land_on_distinct_claimed_tiles(crowd in crowd_strategy()) {
        let (mut world, intents) = build_world(&crowd);
        let result = run_tick(&mut world, intents, Vec::new(), 10).expect("tick");

        let mut destinations = BTreeSet::new();
        for record in result.moves.iter().filter(|record| record.success) {
            prop_assert!(destinations.insert(record.to), "two winners on {:?}", record.to);
            prop_assert_eq!(
                world.get_entity(&record.entity_id).expect("winner").position,
                record.to
            );
        }
    }

    #[test]
    fn losers_keep_their_positions_and_carry_a_reason(crowd in crowd_strategy()) {
        let (mut world, intents) = build_world(&crowd);
        let before: BTreeMap<String, Position> = world
            .entities()
            .values()
            .map(|entity| (entity.entity_id.clone(), entity.position))
            .collect();

        let result = run_tick(&mut world, intents, Vec::new(), 10).expect("tick");

        for record in result.moves.iter().filter(|record| !record.success) {
            prop_assert!(record.reason.is_some());
            prop_assert_eq!(record.from, record.to);
            prop_assert_eq!(
                world.get_entity(&record.entity_id).expect("loser").position,
                before[&record.entity_id]
            );
        }
    }

    #[test]
    fn contested_destinations_go_to_the_smallest_id(crowd in crowd_strategy()) {
        let (mut world, intents) = build_world(&crowd);
        let result = run_tick(&mut world, intents, Vec::new(), 10).expect("tick");

        // No contested loser aimed at a won destination may sort before
        // the winner that took it.
        for winner in result.moves.iter().filter(|record| record.success) {
            for loser in result.moves.iter().filter(|record| {
                record.reason == Some(MoveFailure::Contested)
            }) {
                if loser_target(&crowd, &loser.entity_id) == Some(winner.to) {
                    prop_assert!(winner.entity_id < loser.entity_id);
                }
            }
        }
    }
}

/// Recomputes the tile a loser was aiming at from the generated crowd,
/// since failed records carry their origin in both endpoints.
fn loser_target(crowd: &[(Position, Direction)], entity_id: &str) -> Option<Position> {
    let index: usize = entity_id.trim_start_matches('e').parse().ok()?;
    let (position, direction) = crowd.get(index)?;
    Some(position.offset(*direction))
}
