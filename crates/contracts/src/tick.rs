use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grid::{Entity, Position};

/// Per-tick timing record pushed on the tick feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickEvent {
    pub tick_id: u64,
    pub tick_start_ms: u64,
    pub intent_deadline_ms: u64,
    pub tick_duration_ms: u64,
    pub world_version: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoveFailure {
    Swap,
    Cycle,
    Contested,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveRecord {
    pub entity_id: String,
    pub from: Position,
    pub to: Position,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<MoveFailure>,
}

impl MoveRecord {
    pub fn succeeded(entity_id: impl Into<String>, from: Position, to: Position) -> Self {
        Self {
            entity_id: entity_id.into(),
            from,
            to,
            success: true,
            reason: None,
        }
    }

    pub fn failed(entity_id: impl Into<String>, at: Position, reason: MoveFailure) -> Self {
        Self {
            entity_id: entity_id.into(),
            from: at,
            to: at,
            success: false,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Collect,
    Eat,
    Pickup,
    Use,
    Say,
    Wait,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionRecord {
    pub entity_id: String,
    pub action_type: ActionType,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectChange {
    pub object_id: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Utterance {
    pub entity_id: String,
    pub position: Position,
    pub text: String,
    pub channel: String,
}

/// Everything that happened during one tick, finalized before any consumer
/// sees the next tick's observations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickResult {
    pub tick_id: u64,
    pub moves: Vec<MoveRecord>,
    pub actions: Vec<ActionRecord>,
    pub object_changes: Vec<ObjectChange>,
    pub utterances: Vec<Utterance>,
    pub spawns: Vec<Entity>,
    /// Entities as of the moment they left the world; the final position
    /// drives visibility filtering for the following tick's observations.
    pub despawns: Vec<Entity>,
}

impl TickResult {
    pub fn empty(tick_id: u64) -> Self {
        Self {
            tick_id,
            moves: Vec::new(),
            actions: Vec::new(),
            object_changes: Vec::new(),
            utterances: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
            && self.actions.is_empty()
            && self.object_changes.is_empty()
            && self.utterances.is_empty()
            && self.spawns.is_empty()
            && self.despawns.is_empty()
    }

    pub fn actions_processed(&self) -> usize {
        self.moves.len() + self.actions.len()
    }
}
