//! Player and per-match PlayerStats data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches, slots and lookups).
pub type PlayerId = Uuid;

/// Optional statistics a scorer can attach to one side of a match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Three-dart average over the match.
    pub average: Option<f64>,
    pub one_eighties: u32,
    pub highest_checkout: Option<u32>,
}

/// A registered player. Registration order is the position in `Tournament::players`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    /// Create a new player with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
