use std::fmt;

use contracts::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    OutOfBounds(Position),
    NotWalkable(Position),
    PositionOccupied {
        position: Position,
        occupant: String,
    },
    EntityExists(String),
    EntityNotFound(String),
    ObjectExists(String),
    ObjectNotFound(String),
    Undersupplied {
        entity_id: String,
        item_type: String,
        requested: u32,
        available: u32,
    },
    /// A post-transition check failed. The tick that produced it must be
    /// rolled back; recovery is not permitted.
    InvariantViolation(String),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds(position) => write!(f, "position {position} is out of bounds"),
            Self::NotWalkable(position) => write!(f, "position {position} is not walkable"),
            Self::PositionOccupied { position, occupant } => {
                write!(f, "position {position} is occupied by {occupant}")
            }
            Self::EntityExists(entity_id) => write!(f, "entity {entity_id} already exists"),
            Self::EntityNotFound(entity_id) => write!(f, "entity {entity_id} not found"),
            Self::ObjectExists(object_id) => write!(f, "object {object_id} already exists"),
            Self::ObjectNotFound(object_id) => write!(f, "object {object_id} not found"),
            Self::Undersupplied {
                entity_id,
                item_type,
                requested,
                available,
            } => write!(
                f,
                "entity {entity_id} holds {available} {item_type}, needs {requested}"
            ),
            Self::InvariantViolation(message) => write!(f, "invariant violation: {message}"),
        }
    }
}

impl std::error::Error for WorldError {}
