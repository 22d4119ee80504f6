//! Non-movement action application, strictly after movement enactment.

use std::collections::BTreeMap;

use contracts::{ActionRecord, ActionType, Intent, ObjectChange, Utterance};
use serde_json::json;

use crate::world::GridWorld;

#[derive(Debug, Default)]
pub struct ActionOutcome {
    pub records: Vec<ActionRecord>,
    pub object_changes: Vec<ObjectChange>,
    pub utterances: Vec<Utterance>,
}

fn count_field(item_type: &str) -> String {
    format!("{item_type}_count")
}

fn decoded_count(
    world: &GridWorld,
    cache: &mut BTreeMap<(String, String), u32>,
    object_id: &str,
    field: &str,
) -> u32 {
    let key = (object_id.to_string(), field.to_string());
    if let Some(count) = cache.get(&key) {
        return *count;
    }
    let count = world
        .get_object(object_id)
        .ok()
        .and_then(|object| object.state_field(field))
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(0);
    cache.insert(key, count);
    count
}

/// Applies the non-movement intents in lexicographic entity order against
/// post-move positions. Count fields are decoded once per object for the
/// phase, so later collectors on the same object see the depleted value.
pub fn apply_actions(world: &mut GridWorld, intents: &BTreeMap<String, Intent>) -> ActionOutcome {
    let mut outcome = ActionOutcome::default();
    let mut counts: BTreeMap<(String, String), u32> = BTreeMap::new();

    for (entity_id, intent) in intents {
        match intent {
            Intent::Move { .. } => {}
            Intent::Wait => outcome.records.push(ActionRecord {
                entity_id: entity_id.clone(),
                action_type: ActionType::Wait,
                success: true,
                reason: None,
                details: None,
            }),
            Intent::Collect {
                object_id,
                item_type,
                amount,
            } => apply_collect(
                world,
                &mut counts,
                &mut outcome,
                entity_id,
                object_id.as_deref(),
                item_type,
                *amount,
            ),
            Intent::Eat { item_type, amount } => {
                apply_eat(world, &mut outcome, entity_id, item_type, *amount)
            }
            Intent::Say { text, channel } => apply_say(world, &mut outcome, entity_id, text, channel),
            Intent::Pickup { .. } => outcome.records.push(ActionRecord {
                entity_id: entity_id.clone(),
                action_type: ActionType::Pickup,
                success: false,
                reason: Some("not_implemented".to_string()),
                details: None,
            }),
            Intent::Use { .. } => outcome.records.push(ActionRecord {
                entity_id: entity_id.clone(),
                action_type: ActionType::Use,
                success: false,
                reason: Some("not_implemented".to_string()),
                details: None,
            }),
        }
    }

    outcome
}

fn apply_collect(
    world: &mut GridWorld,
    counts: &mut BTreeMap<(String, String), u32>,
    outcome: &mut ActionOutcome,
    entity_id: &str,
    object_id: Option<&str>,
    item_type: &str,
    amount: u32,
) {
    let fail = |outcome: &mut ActionOutcome, reason: &str| {
        outcome.records.push(ActionRecord {
            entity_id: entity_id.to_string(),
            action_type: ActionType::Collect,
            success: false,
            reason: Some(reason.to_string()),
            details: None,
        });
    };

    let Ok(actor) = world.get_entity(entity_id) else {
        fail(outcome, "unknown_entity");
        return;
    };
    let actor_position = actor.position;
    let field = count_field(item_type);

    let target_id = match object_id {
        Some(object_id) => {
            let Ok(object) = world.get_object(object_id) else {
                fail(outcome, "unknown_object");
                return;
            };
            if object.position != actor_position {
                fail(outcome, "not_co_located");
                return;
            }
            if object.state_field(&field).is_none() {
                fail(outcome, "no_collectible");
                return;
            }
            object.object_id.clone()
        }
        None => {
            let candidate = world
                .objects_at(actor_position)
                .into_iter()
                .find(|object| object.state_field(&field).is_some())
                .map(|object| object.object_id.clone());
            match candidate {
                Some(object_id) => object_id,
                None => {
                    fail(outcome, "no_collectible");
                    return;
                }
            }
        }
    };

    let available = decoded_count(world, counts, &target_id, &field);
    if available < amount {
        fail(outcome, "depleted");
        return;
    }

    let remaining = available - amount;
    counts.insert((target_id.clone(), field.clone()), remaining);

    let Ok(change) = world.update_object_field(&target_id, &field, &remaining.to_string()) else {
        fail(outcome, "unknown_object");
        return;
    };
    if world.inventory_add(entity_id, item_type, amount).is_err() {
        fail(outcome, "unknown_entity");
        return;
    }

    outcome.object_changes.push(change);
    outcome.records.push(ActionRecord {
        entity_id: entity_id.to_string(),
        action_type: ActionType::Collect,
        success: true,
        reason: None,
        details: Some(json!({
            "object_id": target_id,
            "item_type": item_type,
            "amount": amount,
        })),
    });
}

fn apply_eat(
    world: &mut GridWorld,
    outcome: &mut ActionOutcome,
    entity_id: &str,
    item_type: &str,
    amount: u32,
) {
    match world.inventory_remove(entity_id, item_type, amount) {
        Ok(()) => outcome.records.push(ActionRecord {
            entity_id: entity_id.to_string(),
            action_type: ActionType::Eat,
            success: true,
            reason: None,
            details: Some(json!({ "item_type": item_type, "amount": amount })),
        }),
        Err(err) => outcome.records.push(ActionRecord {
            entity_id: entity_id.to_string(),
            action_type: ActionType::Eat,
            success: false,
            reason: Some(match err {
                crate::error::WorldError::EntityNotFound(_) => "unknown_entity".to_string(),
                _ => "insufficient_items".to_string(),
            }),
            details: None,
        }),
    }
}

fn apply_say(
    world: &GridWorld,
    outcome: &mut ActionOutcome,
    entity_id: &str,
    text: &str,
    channel: &str,
) {
    let Ok(speaker) = world.get_entity(entity_id) else {
        outcome.records.push(ActionRecord {
            entity_id: entity_id.to_string(),
            action_type: ActionType::Say,
            success: false,
            reason: Some("unknown_entity".to_string()),
            details: None,
        });
        return;
    };
    outcome.utterances.push(Utterance {
        entity_id: entity_id.to_string(),
        position: speaker.position,
        text: text.to_string(),
        channel: channel.to_string(),
    });
    outcome.records.push(ActionRecord {
        entity_id: entity_id.to_string(),
        action_type: ActionType::Say,
        success: true,
        reason: None,
        details: Some(json!({ "channel": channel })),
    });
}

/// Bush regeneration: every `regen_every` ticks, each bush below its
/// `max_berries` cap (default 5) grows one berry back.
pub fn process_regeneration(world: &mut GridWorld, regen_every: u64) -> Vec<ObjectChange> {
    let mut changes = Vec::new();
    if regen_every == 0 || world.tick() == 0 || world.tick() % regen_every != 0 {
        return changes;
    }

    let bush_ids: Vec<String> = world
        .objects()
        .values()
        .filter(|object| object.object_type == "bush")
        .map(|object| object.object_id.clone())
        .collect();

    for object_id in bush_ids {
        let Ok(object) = world.get_object(&object_id) else {
            continue;
        };
        let berries: u32 = object
            .state_field("berry_count")
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        let cap: u32 = object
            .state_field("max_berries")
            .and_then(|value| value.parse().ok())
            .unwrap_or(5);
        if berries < cap {
            let change = world
                .update_object_field(&object_id, "berry_count", &(berries + 1).to_string())
                .expect("bush still present");
            changes.push(change);
        }
    }

    changes
}
