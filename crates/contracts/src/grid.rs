use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn chebyshev_distance(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Eight compass headings plus the explicit no-direction marker.
/// Coordinate system: +X is east, +Y is south.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    None,
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::North => (0, -1),
            Direction::Northeast => (1, -1),
            Direction::East => (1, 0),
            Direction::Southeast => (1, 1),
            Direction::South => (0, 1),
            Direction::Southwest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::Northwest => (-1, -1),
        }
    }

    /// The two cardinal components of a diagonal heading, or None for
    /// cardinals and the no-direction marker.
    pub fn diagonal_components(self) -> Option<(Direction, Direction)> {
        match self {
            Direction::Northeast => Some((Direction::North, Direction::East)),
            Direction::Southeast => Some((Direction::South, Direction::East)),
            Direction::Southwest => Some((Direction::South, Direction::West)),
            Direction::Northwest => Some((Direction::North, Direction::West)),
            _ => None,
        }
    }

    pub fn is_diagonal(self) -> bool {
        self.diagonal_components().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tile {
    #[serde(default = "default_walkable")]
    pub walkable: bool,
    #[serde(default)]
    pub opaque: bool,
    #[serde(default = "default_floor_type")]
    pub floor_type: String,
}

impl Tile {
    /// The tile synthesized for any in-bounds position without an explicit entry.
    pub fn open() -> Self {
        Self {
            walkable: true,
            opaque: false,
            floor_type: default_floor_type(),
        }
    }

    /// The sentinel returned for any out-of-bounds lookup.
    pub fn boundary() -> Self {
        Self {
            walkable: false,
            opaque: true,
            floor_type: "void".to_string(),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::open()
    }
}

fn default_walkable() -> bool {
    true
}

fn default_floor_type() -> String {
    "stone".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Inventory {
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn count(&self, item_type: &str) -> u32 {
        self.items.get(item_type).copied().unwrap_or(0)
    }

    pub fn has(&self, item_type: &str, amount: u32) -> bool {
        self.count(item_type) >= amount
    }

    pub fn add(&self, item_type: &str, amount: u32) -> Inventory {
        let mut items = self.items.clone();
        *items.entry(item_type.to_string()).or_insert(0) += amount;
        Inventory { items }
    }

    /// Returns the reduced inventory, or None when undersupplied. Entries
    /// that reach zero are dropped rather than kept at zero.
    pub fn remove(&self, item_type: &str, amount: u32) -> Option<Inventory> {
        let current = self.count(item_type);
        if current < amount {
            return None;
        }
        let mut items = self.items.clone();
        let remaining = current - amount;
        if remaining == 0 {
            items.remove(item_type);
        } else {
            items.insert(item_type.to_string(), remaining);
        }
        Some(Inventory { items })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entity {
    pub entity_id: String,
    pub position: Position,
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub status_bits: u32,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub spawn_tick: u64,
}

impl Entity {
    pub fn with_position(&self, position: Position) -> Entity {
        Entity {
            position,
            ..self.clone()
        }
    }

    pub fn with_inventory(&self, inventory: Inventory) -> Entity {
        Entity {
            inventory,
            ..self.clone()
        }
    }
}

fn default_entity_type() -> String {
    "agent".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldObject {
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

impl WorldObject {
    pub fn state_field(&self, key: &str) -> Option<&str> {
        self.state.get(key).map(String::as_str)
    }

    pub fn with_field(&self, key: &str, value: impl Into<String>) -> WorldObject {
        let mut state = self.state.clone();
        state.insert(key.to_string(), value.into());
        WorldObject {
            state,
            ..self.clone()
        }
    }
}
