use serde::{Deserialize, Serialize};

use crate::grid::{Entity, Position, WorldObject};
use crate::tick::{MoveRecord, ObjectChange};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldSize {
    pub width: i32,
    pub height: i32,
}

/// The viewer-facing move record: outcome only, no failure reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewerMove {
    pub entity_id: String,
    pub from: Position,
    pub to: Position,
    pub success: bool,
}

impl From<&MoveRecord> for ViewerMove {
    fn from(record: &MoveRecord) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            from: record.from,
            to: record.to,
            success: record.success,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerMessage {
    Snapshot {
        tick_id: u64,
        entities: Vec<Entity>,
        objects: Vec<WorldObject>,
        world_size: WorldSize,
        tick_duration_ms: u64,
    },
    TickStarted {
        tick_id: u64,
        tick_start_ms: u64,
        deadline_ms: u64,
        tick_duration_ms: u64,
    },
    TickCompleted {
        tick_id: u64,
        moves: Vec<ViewerMove>,
        object_changes: Vec<ObjectChange>,
        actions_processed: usize,
    },
    EntitySpawned {
        tick_id: u64,
        entity: Entity,
    },
    EntityDespawned {
        tick_id: u64,
        entity_id: String,
    },
    Shutdown {
        tick_id: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_snake_case_type_tag() {
        let message = ViewerMessage::TickStarted {
            tick_id: 7,
            tick_start_ms: 1_000,
            deadline_ms: 1_500,
            tick_duration_ms: 1_000,
        };
        let encoded = serde_json::to_string(&message).expect("encode");
        assert!(encoded.contains(r#""type":"tick_started""#));

        let decoded: ViewerMessage = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, message);
    }
}
