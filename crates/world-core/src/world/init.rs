use contracts::{Entity, Inventory, Tile, WorldConfig, WorldObject};

use super::GridWorld;
use crate::error::WorldError;

impl GridWorld {
    /// Builds the tick-zero world from a configuration record: tile
    /// overrides first, then entities, then objects.
    pub fn from_config(config: &WorldConfig) -> Result<Self, WorldError> {
        let mut world = GridWorld::new(config.grid.width, config.grid.height);

        for seed in &config.initial.tiles {
            world.set_tile(
                seed.position,
                Tile {
                    walkable: seed.walkable,
                    opaque: seed.opaque,
                    floor_type: seed.floor_type.clone(),
                },
            )?;
        }

        for seed in &config.initial.entities {
            world.spawn_entity(Entity {
                entity_id: seed.entity_id.clone(),
                position: seed.position,
                entity_type: seed.entity_type.clone(),
                tags: seed.tags.clone(),
                status_bits: 0,
                inventory: Inventory::default(),
                spawn_tick: 0,
            })?;
        }

        for seed in &config.initial.objects {
            world.add_object(WorldObject {
                object_id: seed.object_id.clone(),
                position: seed.position,
                object_type: seed.object_type.clone(),
                state: seed.state.clone(),
                walkable: seed.walkable,
                opaque: seed.opaque,
            })?;
        }

        world.verify_invariants()?;
        Ok(world)
    }
}
