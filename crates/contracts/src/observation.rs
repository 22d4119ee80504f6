use serde::{Deserialize, Serialize};

use crate::grid::{Entity, Position, WorldObject};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservedTile {
    pub position: Position,
    pub walkable: bool,
    pub opaque: bool,
    pub floor_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObservationEvent {
    EntityMoved {
        entity_id: String,
        from: Position,
        to: Position,
    },
    ObjectChanged {
        object_id: String,
        field: String,
        old_value: String,
        new_value: String,
    },
    EntityEntered {
        entity_id: String,
        position: Position,
    },
    EntityLeft {
        entity_id: String,
        position: Position,
    },
    Utterance {
        entity_id: String,
        text: String,
        channel: String,
    },
}

/// The self-contained per-entity view pushed at tick start. Observers can
/// resynchronize from any single observation without history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Observation {
    pub tick_id: u64,
    /// Advisory wall-clock instant when this tick's intent deadline fires.
    pub deadline_ms: u64,
    #[serde(rename = "self")]
    pub self_entity: Entity,
    pub visible_tiles: Vec<ObservedTile>,
    pub visible_entities: Vec<Entity>,
    pub visible_objects: Vec<WorldObject>,
    pub events: Vec<ObservationEvent>,
}
