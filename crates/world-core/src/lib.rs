//! Deterministic tick kernel: world state, movement resolution, action
//! application, leases, intent slots, and per-entity observations.

pub mod actions;
pub mod error;
pub mod intents;
pub mod lease;
pub mod movement;
pub mod observe;
pub mod tick;
pub mod world;

pub use error::WorldError;
pub use intents::IntentQueue;
pub use lease::LeaseManager;
pub use tick::{run_tick, WorldCommand};
pub use world::GridWorld;
