use super::*;

use contracts::WorldConfig;

fn entity(entity_id: &str, x: i32, y: i32) -> Entity {
    Entity {
        entity_id: entity_id.to_string(),
        position: Position::new(x, y),
        entity_type: "agent".to_string(),
        tags: BTreeSet::new(),
        status_bits: 0,
        inventory: Default::default(),
        spawn_tick: 0,
    }
}

fn bush(object_id: &str, x: i32, y: i32, berries: &str) -> WorldObject {
    WorldObject {
        object_id: object_id.to_string(),
        position: Position::new(x, y),
        object_type: "bush".to_string(),
        state: [("berry_count".to_string(), berries.to_string())].into(),
        walkable: true,
        opaque: false,
    }
}

#[test]
fn unset_in_bounds_tiles_synthesize_the_open_default() {
    let world = GridWorld::new(5, 5);
    let tile = world.tile_at(Position::new(2, 2));
    assert!(tile.walkable);
    assert!(!tile.opaque);
}

#[test]
fn out_of_bounds_lookup_returns_the_boundary_sentinel() {
    let world = GridWorld::new(5, 5);
    for position in [
        Position::new(-1, 0),
        Position::new(0, -1),
        Position::new(5, 0),
        Position::new(0, 5),
    ] {
        assert!(!world.tile_at(position).walkable);
        assert!(!world.is_walkable(position));
    }
}

#[test]
fn tile_replacement_is_whole_entry() {
    let mut world = GridWorld::new(5, 5);
    world
        .set_tile(
            Position::new(1, 1),
            Tile {
                walkable: false,
                opaque: true,
                floor_type: "wall".to_string(),
            },
        )
        .expect("set tile");
    assert!(!world.is_walkable(Position::new(1, 1)));

    world
        .set_tile(Position::new(1, 1), Tile::open())
        .expect("replace tile");
    assert!(world.is_walkable(Position::new(1, 1)));
}

#[test]
fn spawn_rejects_duplicates_and_occupied_positions() {
    let mut world = GridWorld::new(5, 5);
    world.spawn_entity(entity("a", 1, 1)).expect("spawn");

    assert_eq!(
        world.spawn_entity(entity("a", 2, 2)),
        Err(WorldError::EntityExists("a".to_string()))
    );
    assert_eq!(
        world.spawn_entity(entity("b", 1, 1)),
        Err(WorldError::PositionOccupied {
            position: Position::new(1, 1),
            occupant: "a".to_string(),
        })
    );
    assert_eq!(
        world.spawn_entity(entity("c", 9, 9)),
        Err(WorldError::OutOfBounds(Position::new(9, 9)))
    );
}

#[test]
fn spawn_stamps_the_current_tick() {
    let mut world = GridWorld::new(5, 5);
    world.advance_tick();
    world.advance_tick();
    let spawned = world.spawn_entity(entity("a", 1, 1)).expect("spawn");
    assert_eq!(spawned.spawn_tick, 2);
}

#[test]
fn move_entity_keeps_both_indices_in_step() {
    let mut world = GridWorld::new(5, 5);
    world.spawn_entity(entity("a", 1, 1)).expect("spawn");
    world
        .move_entity("a", Position::new(2, 1))
        .expect("move");

    assert!(world.entity_at(Position::new(1, 1)).is_none());
    assert_eq!(
        world
            .entity_at(Position::new(2, 1))
            .map(|found| found.entity_id.as_str()),
        Some("a")
    );
    world.verify_invariants().expect("invariants hold");
}

#[test]
fn enact_moves_relocates_a_chain_without_transient_overlap() {
    let mut world = GridWorld::new(5, 1);
    world.spawn_entity(entity("a", 0, 0)).expect("spawn");
    world.spawn_entity(entity("b", 1, 0)).expect("spawn");

    world
        .enact_moves(&[
            ("a".to_string(), Position::new(1, 0)),
            ("b".to_string(), Position::new(2, 0)),
        ])
        .expect("enact");

    assert_eq!(
        world.get_entity("a").expect("entity").position,
        Position::new(1, 0)
    );
    assert_eq!(
        world.get_entity("b").expect("entity").position,
        Position::new(2, 0)
    );
    world.verify_invariants().expect("invariants hold");
}

#[test]
fn inventory_mutators_guard_undersupply() {
    let mut world = GridWorld::new(5, 5);
    world.spawn_entity(entity("a", 1, 1)).expect("spawn");
    world.inventory_add("a", "berry", 2).expect("add");

    assert!(matches!(
        world.inventory_remove("a", "berry", 3),
        Err(WorldError::Undersupplied { available: 2, .. })
    ));
    world.inventory_remove("a", "berry", 2).expect("remove");
    assert_eq!(
        world.get_entity("a").expect("entity").inventory.count("berry"),
        0
    );
}

#[test]
fn objects_share_positions_and_index_stays_consistent() {
    let mut world = GridWorld::new(5, 5);
    world.add_object(bush("bush1", 2, 2, "3")).expect("add");
    world.add_object(bush("bush2", 2, 2, "1")).expect("add");

    assert_eq!(world.objects_at(Position::new(2, 2)).len(), 2);
    world.remove_object("bush1").expect("remove");
    assert_eq!(world.objects_at(Position::new(2, 2)).len(), 1);
    world.verify_invariants().expect("invariants hold");
}

#[test]
fn non_walkable_object_blocks_the_tile() {
    let mut world = GridWorld::new(5, 5);
    let mut boulder = bush("boulder", 2, 2, "0");
    boulder.object_type = "boulder".to_string();
    boulder.walkable = false;
    world.add_object(boulder).expect("add");
    assert!(!world.is_walkable(Position::new(2, 2)));
}

#[test]
fn update_object_field_reports_old_and_new_values() {
    let mut world = GridWorld::new(5, 5);
    world.add_object(bush("bush1", 2, 2, "3")).expect("add");

    let change = world
        .update_object_field("bush1", "berry_count", "2")
        .expect("update");
    assert_eq!(change.old_value, "3");
    assert_eq!(change.new_value, "2");

    let change = world
        .update_object_field("bush1", "ripeness", "high")
        .expect("new field");
    assert_eq!(change.old_value, "");
}

#[test]
fn from_config_builds_the_seeded_world() {
    let config: WorldConfig = serde_json::from_str(
        r#"{
            "grid": {"width": 3, "height": 1},
            "initial": {
                "entities": [
                    {"entity_id": "a", "position": {"x": 0, "y": 0}},
                    {"entity_id": "b", "position": {"x": 1, "y": 0}}
                ],
                "objects": [
                    {
                        "object_id": "bush1",
                        "position": {"x": 2, "y": 0},
                        "object_type": "bush",
                        "state": {"berry_count": "3"}
                    }
                ]
            }
        }"#,
    )
    .expect("config parses");

    let world = GridWorld::from_config(&config).expect("world builds");
    assert_eq!(world.dims(), (3, 1));
    assert_eq!(world.entities().len(), 2);
    assert_eq!(world.objects().len(), 1);
}

#[test]
fn viewer_snapshot_carries_everything() {
    let mut world = GridWorld::new(5, 5);
    world.spawn_entity(entity("a", 1, 1)).expect("spawn");
    world.add_object(bush("bush1", 2, 2, "3")).expect("add");

    match world.viewer_snapshot(1_000) {
        contracts::ViewerMessage::Snapshot {
            tick_id,
            entities,
            objects,
            world_size,
            tick_duration_ms,
        } => {
            assert_eq!(tick_id, 0);
            assert_eq!(entities.len(), 1);
            assert_eq!(objects.len(), 1);
            assert_eq!((world_size.width, world_size.height), (5, 5));
            assert_eq!(tick_duration_ms, 1_000);
        }
        other => panic!("expected snapshot, got {other:?}"),
    }
}
