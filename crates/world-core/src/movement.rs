//! Movement conflict resolution: claim, resolve, enact.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{Direction, MoveFailure, MoveRecord, Position};

use crate::world::GridWorld;

/// A validated move intent entered into resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveClaim {
    pub entity_id: String,
    pub from: Position,
    pub to: Position,
}

/// Validates a single move intent against the grid. Rejected intents never
/// enter resolution; the entity simply stays in place.
///
/// A diagonal step additionally requires both intervening cardinal
/// neighbors to be walkable (no corner cutting).
pub fn validate_claim(
    world: &GridWorld,
    entity_id: &str,
    direction: Direction,
) -> Option<MoveClaim> {
    let entity = world.get_entity(entity_id).ok()?;
    let from = entity.position;
    let to = from.offset(direction);
    if to == from {
        return None;
    }
    if !world.in_bounds(to) || !world.is_walkable(to) {
        return None;
    }
    if let Some((first, second)) = direction.diagonal_components() {
        if !world.is_walkable(from.offset(first)) || !world.is_walkable(from.offset(second)) {
            return None;
        }
    }
    Some(MoveClaim {
        entity_id: entity_id.to_string(),
        from,
        to,
    })
}

/// Pure conflict resolution. Outcomes depend only on the claims and the
/// current occupancy, never on submission order: claims are indexed by
/// entity id before any rule runs.
///
/// Rules, in order: swaps, cycles of length three or more, same-destination
/// contests (lexicographically smallest id wins), and destinations held by
/// anything that is not a successful mover this tick. The last rule runs to
/// a fixpoint: a mover that fails keeps its tile, which can strand the
/// claim behind it.
pub fn resolve(world: &GridWorld, claims: &[MoveClaim]) -> Vec<MoveRecord> {
    if claims.is_empty() {
        return Vec::new();
    }

    let mut by_entity: BTreeMap<&str, &MoveClaim> = BTreeMap::new();
    for claim in claims {
        by_entity.insert(claim.entity_id.as_str(), claim);
    }
    let mover_at: BTreeMap<Position, &str> = by_entity
        .values()
        .map(|claim| (claim.from, claim.entity_id.as_str()))
        .collect();

    let mut failed: BTreeMap<&str, MoveFailure> = BTreeMap::new();

    // Swaps: a pair exchanging tiles fails as a unit.
    for claim in by_entity.values() {
        if let Some(other_id) = mover_at.get(&claim.to) {
            let other = by_entity[other_id];
            if other.to == claim.from && other.entity_id != claim.entity_id {
                failed.insert(claim.entity_id.as_str(), MoveFailure::Swap);
                failed.insert(other.entity_id.as_str(), MoveFailure::Swap);
            }
        }
    }

    // Cycles of length >= 3 in the claim graph. Chains that terminate on an
    // empty tile are not cycles and stay eligible.
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    for claim in by_entity.values() {
        if failed.contains_key(claim.entity_id.as_str())
            || visited.contains(claim.entity_id.as_str())
        {
            continue;
        }
        let mut chain: Vec<&str> = Vec::new();
        let mut on_chain: BTreeSet<&str> = BTreeSet::new();
        let mut cursor: Option<&str> = Some(claim.entity_id.as_str());
        while let Some(current) = cursor {
            if on_chain.contains(current) {
                let start = chain.iter().position(|id| *id == current).unwrap_or(0);
                let members = &chain[start..];
                if members.len() >= 3 {
                    for &member in members {
                        failed.insert(member, MoveFailure::Cycle);
                    }
                }
                break;
            }
            if failed.contains_key(current) {
                break;
            }
            on_chain.insert(current);
            chain.push(current);
            cursor = by_entity
                .get(current)
                .and_then(|current_claim| mover_at.get(&current_claim.to))
                .filter(|next| !failed.contains_key(**next))
                .copied();
        }
        visited.extend(on_chain);
    }

    // Same destination: the lexicographically smallest surviving id wins.
    let mut contenders: BTreeMap<Position, Vec<&str>> = BTreeMap::new();
    for claim in by_entity.values() {
        if !failed.contains_key(claim.entity_id.as_str()) {
            contenders
                .entry(claim.to)
                .or_default()
                .push(claim.entity_id.as_str());
        }
    }
    for ids in contenders.values() {
        for &loser in ids.iter().skip(1) {
            failed.insert(loser, MoveFailure::Contested);
        }
    }

    // Occupied destinations, to a fixpoint: anything standing on a tile and
    // not about to vacate it blocks the claim aimed there.
    loop {
        let mut newly_failed: Vec<&str> = Vec::new();
        for claim in by_entity.values() {
            if failed.contains_key(claim.entity_id.as_str()) {
                continue;
            }
            let blocked = match world.entity_at(claim.to) {
                Some(occupant) => match by_entity.get(occupant.entity_id.as_str()) {
                    Some(_) => failed.contains_key(occupant.entity_id.as_str()),
                    None => true,
                },
                None => false,
            };
            if blocked {
                newly_failed.push(claim.entity_id.as_str());
            }
        }
        if newly_failed.is_empty() {
            break;
        }
        for entity_id in newly_failed {
            failed.insert(entity_id, MoveFailure::Blocked);
        }
    }

    by_entity
        .values()
        .map(|claim| match failed.get(claim.entity_id.as_str()) {
            Some(reason) => MoveRecord::failed(&claim.entity_id, claim.from, *reason),
            None => MoveRecord::succeeded(&claim.entity_id, claim.from, claim.to),
        })
        .collect()
}
