//! Match (game), Slot, Side and Stage for 1v1 leg-based matches.

use crate::models::group::GroupId;
use crate::models::player::{PlayerId, PlayerStats};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which side of a match (slot 1 or slot 2).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    One,
    Two,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

/// A position in a match: empty, a concrete player, or a bye marker.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "player")]
pub enum Slot {
    #[default]
    Empty,
    Player(PlayerId),
    Bye,
}

impl Slot {
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Slot::Player(id) => Some(*id),
            Slot::Empty | Slot::Bye => None,
        }
    }

    pub fn is_filled(&self) -> bool {
        !matches!(self, Slot::Empty)
    }
}

/// Match lifecycle. Only admin corrections move a match backwards.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Phase of the tournament this match belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum Stage {
    /// Round-robin match; `round` is the 1-based round of the group schedule.
    Group { group: GroupId, round: usize },
    /// Bracket match; `round` 0 is the first round, `position` counts from the top.
    Playoff { round: usize, position: usize },
}

/// A reported result: legs per side plus optional statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub legs_1: u32,
    pub legs_2: u32,
    #[serde(default)]
    pub stats_1: Option<PlayerStats>,
    #[serde(default)]
    pub stats_2: Option<PlayerStats>,
}

impl MatchResult {
    pub fn new(legs_1: u32, legs_2: u32) -> Self {
        Self {
            legs_1,
            legs_2,
            ..Self::default()
        }
    }

    /// Side with more legs, if any.
    pub fn leader(&self) -> Option<Side> {
        match self.legs_1.cmp(&self.legs_2) {
            std::cmp::Ordering::Greater => Some(Side::One),
            std::cmp::Ordering::Less => Some(Side::Two),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// A single 1v1 match between two slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub stage: Stage,
    pub slot_1: Slot,
    pub slot_2: Slot,
    pub state: MatchState,
    pub legs_1: u32,
    pub legs_2: u32,
    pub stats_1: Option<PlayerStats>,
    pub stats_2: Option<PlayerStats>,
    /// Set iff `state == Completed`.
    pub winner: Option<Side>,
}

impl GameMatch {
    pub fn new(slot_1: Slot, slot_2: Slot, stage: Stage) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage,
            slot_1,
            slot_2,
            state: MatchState::Pending,
            legs_1: 0,
            legs_2: 0,
            stats_1: None,
            stats_2: None,
            winner: None,
        }
    }

    pub fn slot(&self, side: Side) -> Slot {
        match side {
            Side::One => self.slot_1,
            Side::Two => self.slot_2,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::One => &mut self.slot_1,
            Side::Two => &mut self.slot_2,
        }
    }

    /// Both slots hold a player, so the match can be played.
    pub fn is_ready(&self) -> bool {
        self.slot_1.player().is_some() && self.slot_2.player().is_some()
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.slot_1.player() == Some(player) || self.slot_2.player() == Some(player)
    }

    pub fn winner_id(&self) -> Option<PlayerId> {
        self.winner.and_then(|side| self.slot(side).player())
    }

    pub fn loser_id(&self) -> Option<PlayerId> {
        self.winner.and_then(|side| self.slot(side.other()).player())
    }

    /// Legs won and lost from `player`'s point of view, if they play in this match.
    pub fn legs_for(&self, player: PlayerId) -> Option<(u32, u32)> {
        if self.slot_1.player() == Some(player) {
            Some((self.legs_1, self.legs_2))
        } else if self.slot_2.player() == Some(player) {
            Some((self.legs_2, self.legs_1))
        } else {
            None
        }
    }

    /// Current legs and statistics as a result value.
    pub fn result(&self) -> MatchResult {
        MatchResult {
            legs_1: self.legs_1,
            legs_2: self.legs_2,
            stats_1: self.stats_1.clone(),
            stats_2: self.stats_2.clone(),
        }
    }

    /// Write a final result. Callers validate first.
    pub fn complete(&mut self, result: MatchResult, winner: Side) {
        self.legs_1 = result.legs_1;
        self.legs_2 = result.legs_2;
        self.stats_1 = result.stats_1;
        self.stats_2 = result.stats_2;
        self.winner = Some(winner);
        self.state = MatchState::Completed;
    }

    /// Back to pending with no legs, statistics or winner. Slots are kept.
    pub fn reset(&mut self) {
        self.legs_1 = 0;
        self.legs_2 = 0;
        self.stats_1 = None;
        self.stats_2 = None;
        self.winner = None;
        self.state = MatchState::Pending;
    }
}
