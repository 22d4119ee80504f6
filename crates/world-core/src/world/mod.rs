use std::collections::{BTreeMap, BTreeSet};

mod init;
mod snapshot;

use contracts::{Entity, ObjectChange, Position, Tile, WorldObject};

use crate::error::WorldError;

/// The authoritative world aggregate: bounded grid, sparse tile overrides,
/// entity and object registries with position indices, and the tick counter.
///
/// Mutators are only called from the tick pipeline; every successful
/// mutation leaves both indices consistent with the registries.
#[derive(Debug, Clone)]
pub struct GridWorld {
    width: i32,
    height: i32,
    tick: u64,
    tiles: BTreeMap<Position, Tile>,
    entities: BTreeMap<String, Entity>,
    entity_positions: BTreeMap<Position, String>,
    objects: BTreeMap<String, WorldObject>,
    object_positions: BTreeMap<Position, BTreeSet<String>>,
}

impl GridWorld {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            tick: 0,
            tiles: BTreeMap::new(),
            entities: BTreeMap::new(),
            entity_positions: BTreeMap::new(),
            objects: BTreeMap::new(),
            object_positions: BTreeMap::new(),
        }
    }

    pub fn dims(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick = self.tick.saturating_add(1);
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        (0..self.width).contains(&position.x) && (0..self.height).contains(&position.y)
    }

    /// Sparse lookup: unset in-bounds positions synthesize the open default,
    /// out-of-bounds positions return the non-walkable boundary sentinel.
    pub fn tile_at(&self, position: Position) -> Tile {
        if !self.in_bounds(position) {
            return Tile::boundary();
        }
        self.tiles.get(&position).cloned().unwrap_or_else(Tile::open)
    }

    /// A position is walkable when its tile is and no object standing on it
    /// forbids passage.
    pub fn is_walkable(&self, position: Position) -> bool {
        self.tile_at(position).walkable
            && self
                .objects_at(position)
                .iter()
                .all(|object| object.walkable)
    }

    pub fn set_tile(&mut self, position: Position, tile: Tile) -> Result<(), WorldError> {
        if !self.in_bounds(position) {
            return Err(WorldError::OutOfBounds(position));
        }
        self.tiles.insert(position, tile);
        Ok(())
    }

    pub fn entities(&self) -> &BTreeMap<String, Entity> {
        &self.entities
    }

    pub fn entity_at(&self, position: Position) -> Option<&Entity> {
        self.entity_positions
            .get(&position)
            .and_then(|entity_id| self.entities.get(entity_id))
    }

    pub fn get_entity(&self, entity_id: &str) -> Result<&Entity, WorldError> {
        self.entities
            .get(entity_id)
            .ok_or_else(|| WorldError::EntityNotFound(entity_id.to_string()))
    }

    /// Adds the entity with `spawn_tick` stamped to the current tick.
    pub fn spawn_entity(&mut self, entity: Entity) -> Result<Entity, WorldError> {
        if self.entities.contains_key(&entity.entity_id) {
            return Err(WorldError::EntityExists(entity.entity_id));
        }
        if !self.in_bounds(entity.position) {
            return Err(WorldError::OutOfBounds(entity.position));
        }
        if let Some(occupant) = self.entity_positions.get(&entity.position) {
            return Err(WorldError::PositionOccupied {
                position: entity.position,
                occupant: occupant.clone(),
            });
        }
        let spawned = Entity {
            spawn_tick: self.tick,
            ..entity
        };
        self.entity_positions
            .insert(spawned.position, spawned.entity_id.clone());
        self.entities
            .insert(spawned.entity_id.clone(), spawned.clone());
        Ok(spawned)
    }

    pub fn despawn_entity(&mut self, entity_id: &str) -> Result<Entity, WorldError> {
        let entity = self
            .entities
            .remove(entity_id)
            .ok_or_else(|| WorldError::EntityNotFound(entity_id.to_string()))?;
        self.entity_positions.remove(&entity.position);
        Ok(entity)
    }

    pub fn move_entity(&mut self, entity_id: &str, to: Position) -> Result<(), WorldError> {
        if !self.in_bounds(to) {
            return Err(WorldError::OutOfBounds(to));
        }
        let entity = self.get_entity(entity_id)?.clone();
        if let Some(occupant) = self.entity_positions.get(&to) {
            if occupant != entity_id {
                return Err(WorldError::PositionOccupied {
                    position: to,
                    occupant: occupant.clone(),
                });
            }
        }
        self.entity_positions.remove(&entity.position);
        self.entity_positions.insert(to, entity_id.to_string());
        self.entities
            .insert(entity_id.to_string(), entity.with_position(to));
        Ok(())
    }

    /// Applies a batch of resolved winners atomically: all old index entries
    /// are cleared before any new one is written, so chains relocate without
    /// a transient double-occupancy.
    pub fn enact_moves(&mut self, winners: &[(String, Position)]) -> Result<(), WorldError> {
        for (entity_id, _) in winners {
            let position = self.get_entity(entity_id)?.position;
            self.entity_positions.remove(&position);
        }
        for (entity_id, to) in winners {
            let entity = self.get_entity(entity_id)?.clone();
            self.entity_positions.insert(*to, entity_id.clone());
            self.entities
                .insert(entity_id.clone(), entity.with_position(*to));
        }
        Ok(())
    }

    pub fn inventory_add(
        &mut self,
        entity_id: &str,
        item_type: &str,
        amount: u32,
    ) -> Result<(), WorldError> {
        let entity = self.get_entity(entity_id)?.clone();
        let inventory = entity.inventory.add(item_type, amount);
        self.entities
            .insert(entity_id.to_string(), entity.with_inventory(inventory));
        Ok(())
    }

    pub fn inventory_remove(
        &mut self,
        entity_id: &str,
        item_type: &str,
        amount: u32,
    ) -> Result<(), WorldError> {
        let entity = self.get_entity(entity_id)?.clone();
        let inventory = entity.inventory.remove(item_type, amount).ok_or_else(|| {
            WorldError::Undersupplied {
                entity_id: entity_id.to_string(),
                item_type: item_type.to_string(),
                requested: amount,
                available: entity.inventory.count(item_type),
            }
        })?;
        self.entities
            .insert(entity_id.to_string(), entity.with_inventory(inventory));
        Ok(())
    }

    pub fn objects(&self) -> &BTreeMap<String, WorldObject> {
        &self.objects
    }

    pub fn objects_at(&self, position: Position) -> Vec<&WorldObject> {
        self.object_positions
            .get(&position)
            .map(|object_ids| {
                object_ids
                    .iter()
                    .filter_map(|object_id| self.objects.get(object_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_object(&self, object_id: &str) -> Result<&WorldObject, WorldError> {
        self.objects
            .get(object_id)
            .ok_or_else(|| WorldError::ObjectNotFound(object_id.to_string()))
    }

    pub fn add_object(&mut self, object: WorldObject) -> Result<(), WorldError> {
        if self.objects.contains_key(&object.object_id) {
            return Err(WorldError::ObjectExists(object.object_id));
        }
        if !self.in_bounds(object.position) {
            return Err(WorldError::OutOfBounds(object.position));
        }
        self.object_positions
            .entry(object.position)
            .or_default()
            .insert(object.object_id.clone());
        self.objects.insert(object.object_id.clone(), object);
        Ok(())
    }

    pub fn remove_object(&mut self, object_id: &str) -> Result<WorldObject, WorldError> {
        let object = self
            .objects
            .remove(object_id)
            .ok_or_else(|| WorldError::ObjectNotFound(object_id.to_string()))?;
        if let Some(object_ids) = self.object_positions.get_mut(&object.position) {
            object_ids.remove(object_id);
            if object_ids.is_empty() {
                self.object_positions.remove(&object.position);
            }
        }
        Ok(object)
    }

    /// Replaces one string-encoded state field and reports the transition.
    /// An unset field reads as the empty string in the change record.
    pub fn update_object_field(
        &mut self,
        object_id: &str,
        field: &str,
        value: &str,
    ) -> Result<ObjectChange, WorldError> {
        let object = self.get_object(object_id)?.clone();
        let old_value = object.state_field(field).unwrap_or("").to_string();
        self.objects
            .insert(object_id.to_string(), object.with_field(field, value));
        Ok(ObjectChange {
            object_id: object_id.to_string(),
            field: field.to_string(),
            old_value,
            new_value: value.to_string(),
        })
    }

    /// Walks every registry/index pair and bound. Returns the first
    /// discrepancy; a violation means the tick that caused it is defective.
    pub fn verify_invariants(&self) -> Result<(), WorldError> {
        for (entity_id, entity) in &self.entities {
            if !self.in_bounds(entity.position) {
                return Err(WorldError::InvariantViolation(format!(
                    "entity {entity_id} at out-of-bounds {}",
                    entity.position
                )));
            }
            match self.entity_positions.get(&entity.position) {
                Some(indexed) if indexed == entity_id => {}
                Some(indexed) => {
                    return Err(WorldError::InvariantViolation(format!(
                        "position {} indexes {indexed}, expected {entity_id}",
                        entity.position
                    )))
                }
                None => {
                    return Err(WorldError::InvariantViolation(format!(
                        "entity {entity_id} missing from position index at {}",
                        entity.position
                    )))
                }
            }
        }
        for (position, entity_id) in &self.entity_positions {
            match self.entities.get(entity_id) {
                Some(entity) if entity.position == *position => {}
                _ => {
                    return Err(WorldError::InvariantViolation(format!(
                        "position index entry {position} -> {entity_id} has no matching entity"
                    )))
                }
            }
        }
        for (object_id, object) in &self.objects {
            let indexed = self
                .object_positions
                .get(&object.position)
                .map(|object_ids| object_ids.contains(object_id))
                .unwrap_or(false);
            if !indexed {
                return Err(WorldError::InvariantViolation(format!(
                    "object {object_id} missing from position index at {}",
                    object.position
                )));
            }
        }
        for (position, object_ids) in &self.object_positions {
            for object_id in object_ids {
                match self.objects.get(object_id) {
                    Some(object) if object.position == *position => {}
                    _ => {
                        return Err(WorldError::InvariantViolation(format!(
                            "object index entry {position} -> {object_id} has no matching object"
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
