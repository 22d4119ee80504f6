//! Cross-boundary contracts for the world kernel, API server, and clients.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod grid;
pub mod intent;
pub mod lease;
pub mod observation;
pub mod tick;
pub mod viewer;

pub use config::{
    BroadcastConfig, EntitySeed, ForagingConfig, GridConfig, InitialState, LeaseConfig,
    ObjectSeed, ObservationConfig, TickTimingConfig, TileSeed, WorldConfig,
};
pub use grid::{Direction, Entity, Inventory, Position, Tile, WorldObject};
pub use intent::{Intent, RejectReason, SubmitIntentRequest, SubmitIntentResponse};
pub use lease::{
    AcquireLeaseRequest, Lease, LeaseDenied, LeaseResponse, ReleaseLeaseRequest,
    ReleaseLeaseResponse, RenewLeaseRequest,
};
pub use observation::{Observation, ObservationEvent, ObservedTile};
pub use tick::{
    ActionRecord, ActionType, MoveFailure, MoveRecord, ObjectChange, TickEvent, TickResult,
    Utterance,
};
pub use viewer::{ViewerMessage, ViewerMove, WorldSize};

pub const WORLD_VERSION: &str = "0.3.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidIntent,
    InvalidConfig,
    UnknownEntity,
    UnknownObject,
    InvalidLease,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{:?}: {} ({details})", self.code, self.message),
            None => write!(f, "{:?}: {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveryEntry {
    pub entity_id: String,
    pub entity_type: String,
    pub tags: Vec<String>,
    pub spawn_tick: u64,
    pub has_active_lease: bool,
}
