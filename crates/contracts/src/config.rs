use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::Position;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WorldConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub tick: TickTimingConfig,
    #[serde(default)]
    pub lease: LeaseConfig,
    #[serde(default)]
    pub observation: ObservationConfig,
    #[serde(default)]
    pub foraging: ForagingConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub initial: InitialState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridConfig {
    #[serde(default = "default_grid_dim")]
    pub width: i32,
    #[serde(default = "default_grid_dim")]
    pub height: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_grid_dim(),
            height: default_grid_dim(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickTimingConfig {
    #[serde(default = "default_tick_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_intent_deadline_ms")]
    pub deadline_ms: u64,
}

impl Default for TickTimingConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_tick_duration_ms(),
            deadline_ms: default_intent_deadline_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaseConfig {
    #[serde(default = "default_lease_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_lease_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservationConfig {
    #[serde(default = "default_observation_radius")]
    pub radius: i32,
    /// Utterance hearing radius; falls back to the visibility radius.
    #[serde(default)]
    pub hearing_radius: Option<i32>,
}

impl ObservationConfig {
    pub fn hearing_radius(&self) -> i32 {
        self.hearing_radius.unwrap_or(self.radius)
    }
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            radius: default_observation_radius(),
            hearing_radius: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForagingConfig {
    #[serde(default = "default_regen_every_ticks")]
    pub regen_every_ticks: u64,
}

impl Default for ForagingConfig {
    fn default() -> Self {
        Self {
            regen_every_ticks: default_regen_every_ticks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastConfig {
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InitialState {
    #[serde(default)]
    pub entities: Vec<EntitySeed>,
    #[serde(default)]
    pub tiles: Vec<TileSeed>,
    #[serde(default)]
    pub objects: Vec<ObjectSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitySeed {
    pub entity_id: String,
    pub position: Position,
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileSeed {
    pub position: Position,
    #[serde(default = "default_walkable")]
    pub walkable: bool,
    #[serde(default)]
    pub opaque: bool,
    #[serde(default = "default_floor_type")]
    pub floor_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectSeed {
    pub object_id: String,
    pub position: Position,
    pub object_type: String,
    #[serde(default)]
    pub state: BTreeMap<String, String>,
    #[serde(default = "default_walkable")]
    pub walkable: bool,
    #[serde(default)]
    pub opaque: bool,
}

fn default_grid_dim() -> i32 {
    10
}

fn default_tick_duration_ms() -> u64 {
    1_000
}

fn default_intent_deadline_ms() -> u64 {
    500
}

fn default_lease_ttl_ms() -> u64 {
    30_000
}

fn default_observation_radius() -> i32 {
    5
}

fn default_regen_every_ticks() -> u64 {
    10
}

fn default_queue_depth() -> usize {
    128
}

fn default_entity_type() -> String {
    "agent".to_string()
}

fn default_floor_type() -> String {
    "stone".to_string()
}

fn default_walkable() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: WorldConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.grid.width, 10);
        assert_eq!(config.tick.duration_ms, 1_000);
        assert_eq!(config.tick.deadline_ms, 500);
        assert_eq!(config.lease.ttl_ms, 30_000);
        assert_eq!(config.observation.radius, 5);
        assert_eq!(config.observation.hearing_radius(), 5);
        assert_eq!(config.broadcast.queue_depth, 128);
        assert!(config.initial.entities.is_empty());
    }

    #[test]
    fn hearing_radius_can_diverge_from_visibility() {
        let config: WorldConfig =
            serde_json::from_str(r#"{"observation": {"radius": 4, "hearing_radius": 9}}"#)
                .expect("parse");
        assert_eq!(config.observation.radius, 4);
        assert_eq!(config.observation.hearing_radius(), 9);
    }
}
