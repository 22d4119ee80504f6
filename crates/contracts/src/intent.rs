use serde::{Deserialize, Serialize};

use crate::grid::Direction;

/// What an entity should attempt during a specific tick. Exactly one
/// variant per entity per tick; resubmission replaces the previous one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Move {
        direction: Direction,
    },
    Collect {
        /// Target object; when absent, any collectible at the actor's tile.
        #[serde(default)]
        object_id: Option<String>,
        #[serde(default = "default_item_type")]
        item_type: String,
        #[serde(default = "default_amount")]
        amount: u32,
    },
    Eat {
        item_type: String,
        #[serde(default = "default_amount")]
        amount: u32,
    },
    Pickup {
        kind: String,
        #[serde(default = "default_amount")]
        amount: u32,
    },
    Use {
        kind: String,
        #[serde(default = "default_amount")]
        amount: u32,
    },
    Say {
        text: String,
        #[serde(default = "default_channel")]
        channel: String,
    },
    #[default]
    Wait,
}

fn default_item_type() -> String {
    "berry".to_string()
}

fn default_amount() -> u32 {
    1
}

fn default_channel() -> String {
    "local".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitIntentRequest {
    pub lease_id: String,
    pub entity_id: String,
    pub tick_id: u64,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    WrongTick,
    LateTick,
    InvalidLease,
    IllegalAction,
    UnknownEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitIntentResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl SubmitIntentResponse {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_round_trip_through_tagged_json() {
        let intent = Intent::Collect {
            object_id: Some("bush1".to_string()),
            item_type: "berry".to_string(),
            amount: 2,
        };
        let encoded = serde_json::to_string(&intent).expect("encode");
        assert!(encoded.contains(r#""type":"collect""#));
        let decoded: Intent = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, intent);
    }

    #[test]
    fn collect_defaults_fill_in_item_and_amount() {
        let decoded: Intent = serde_json::from_str(r#"{"type": "collect"}"#).expect("decode");
        assert_eq!(
            decoded,
            Intent::Collect {
                object_id: None,
                item_type: "berry".to_string(),
                amount: 1,
            }
        );
    }
}
