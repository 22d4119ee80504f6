//! The phased tick pipeline: commands, movement, actions, regeneration.

use std::collections::BTreeMap;

use contracts::{Direction, Entity, Intent, TickResult};

use crate::actions::{apply_actions, process_regeneration};
use crate::error::WorldError;
use crate::movement::{resolve, validate_claim, MoveClaim};
use crate::world::GridWorld;

/// Administrative mutation queued from outside the tick; applied at the
/// tick boundary so the change lands in that tick's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldCommand {
    SpawnEntity(Entity),
    DespawnEntity(String),
}

/// Runs one complete tick against the drained intents and queued commands,
/// then advances the tick counter. The resolution path never suspends.
///
/// On an invariant violation the world is restored to its pre-resolution
/// snapshot and the violation is returned; the caller must treat it as
/// fatal. No partially applied tick is ever observable.
pub fn run_tick(
    world: &mut GridWorld,
    intents: BTreeMap<String, Intent>,
    commands: Vec<WorldCommand>,
    regen_every_ticks: u64,
) -> Result<TickResult, WorldError> {
    let tick_id = world.tick();
    let snapshot = world.clone();
    let mut result = TickResult::empty(tick_id);

    for command in commands {
        match command {
            WorldCommand::SpawnEntity(entity) => {
                if let Ok(spawned) = world.spawn_entity(entity) {
                    result.spawns.push(spawned);
                }
            }
            WorldCommand::DespawnEntity(entity_id) => {
                if let Ok(removed) = world.despawn_entity(&entity_id) {
                    result.despawns.push(removed);
                }
            }
        }
    }

    let mut moves: BTreeMap<String, Direction> = BTreeMap::new();
    let mut actions: BTreeMap<String, Intent> = BTreeMap::new();
    for (entity_id, intent) in intents {
        match intent {
            Intent::Move { direction } => {
                moves.insert(entity_id, direction);
            }
            other => {
                actions.insert(entity_id, other);
            }
        }
    }

    let claims: Vec<MoveClaim> = moves
        .iter()
        .filter_map(|(entity_id, direction)| validate_claim(world, entity_id, *direction))
        .collect();
    result.moves = resolve(world, &claims);
    let winners: Vec<(String, contracts::Position)> = result
        .moves
        .iter()
        .filter(|record| record.success)
        .map(|record| (record.entity_id.clone(), record.to))
        .collect();
    world.enact_moves(&winners)?;

    let action_outcome = apply_actions(world, &actions);
    result.actions = action_outcome.records;
    result.object_changes = action_outcome.object_changes;
    result.utterances = action_outcome.utterances;

    result
        .object_changes
        .extend(process_regeneration(world, regen_every_ticks));

    if let Err(violation) = world.verify_invariants() {
        *world = snapshot;
        return Err(violation);
    }

    world.advance_tick();
    Ok(result)
}
