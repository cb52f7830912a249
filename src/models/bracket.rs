//! Playoff bracket: rounds of matches, first-round byes and the qualifiers it was seeded from.

use crate::models::config::SeedingPolicy;
use crate::models::game::{GameMatch, MatchId, MatchState, Side, Slot, Stage};
use crate::models::group::GroupId;
use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

/// A player advancing from the group stage, with group provenance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    pub player: PlayerId,
    pub group: GroupId,
    /// 0-based index of the group in `Tournament::groups`.
    pub group_index: usize,
    /// 1-based rank inside the group.
    pub group_rank: usize,
    /// 1-based overall seed.
    pub seed: usize,
}

/// A first-round line that advanced without a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bye {
    pub seed: usize,
    pub player: PlayerId,
    /// Position in round 0 (the same numbering matches use).
    pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketRound {
    pub index: usize,
    /// Real matches, ordered by position. Round 0 skips positions taken by byes.
    pub matches: Vec<GameMatch>,
    /// Only ever non-empty in round 0.
    pub byes: Vec<Bye>,
}

impl BracketRound {
    /// Every match of the round has both players.
    pub fn is_ready(&self) -> bool {
        self.matches.iter().all(GameMatch::is_ready)
    }

    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(|m| m.state == MatchState::Completed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayoffBracket {
    /// Number of first-round lines, always a power of two.
    pub size: usize,
    pub seeding: SeedingPolicy,
    pub qualifiers: Vec<Qualifier>,
    pub rounds: Vec<BracketRound>,
    pub champion: Option<PlayerId>,
}

impl PlayoffBracket {
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn bye_count(&self) -> usize {
        self.rounds.first().map_or(0, |r| r.byes.len())
    }

    /// (round, index in `rounds[round].matches`) of a match.
    pub fn locate(&self, match_id: MatchId) -> Option<(usize, usize)> {
        self.rounds.iter().enumerate().find_map(|(r, round)| {
            round
                .matches
                .iter()
                .position(|m| m.id == match_id)
                .map(|i| (r, i))
        })
    }

    pub fn match_at(&self, round: usize, position: usize) -> Option<&GameMatch> {
        self.rounds
            .get(round)?
            .matches
            .iter()
            .find(|m| position_of(m) == Some(position))
    }

    pub fn match_at_mut(&mut self, round: usize, position: usize) -> Option<&mut GameMatch> {
        self.rounds
            .get_mut(round)?
            .matches
            .iter_mut()
            .find(|m| position_of(m) == Some(position))
    }

    /// Where the winner of (round, position) goes, or None for the final.
    pub fn successor(&self, round: usize, position: usize) -> Option<(usize, usize, Side)> {
        if round + 1 >= self.rounds.len() {
            return None;
        }
        let side = if position % 2 == 0 { Side::One } else { Side::Two };
        Some((round + 1, position / 2, side))
    }

    pub fn is_round_ready(&self, round: usize) -> bool {
        self.rounds.get(round).is_some_and(BracketRound::is_ready)
    }

    pub fn final_match(&self) -> Option<&GameMatch> {
        self.rounds.last()?.matches.first()
    }

    /// Every first-round line pair in bracket order, byes included.
    pub fn first_round_lines(&self) -> Vec<(Slot, Slot)> {
        let Some(first) = self.rounds.first() else {
            return Vec::new();
        };
        (0..self.size / 2)
            .map(|position| {
                if let Some(bye) = first.byes.iter().find(|b| b.position == position) {
                    (Slot::Player(bye.player), Slot::Bye)
                } else if let Some(m) = self.match_at(0, position) {
                    (m.slot_1, m.slot_2)
                } else {
                    (Slot::Empty, Slot::Empty)
                }
            })
            .collect()
    }

    pub fn seed_of(&self, player: PlayerId) -> Option<usize> {
        self.qualifiers
            .iter()
            .find(|q| q.player == player)
            .map(|q| q.seed)
    }
}

fn position_of(m: &GameMatch) -> Option<usize> {
    match m.stage {
        Stage::Playoff { position, .. } => Some(position),
        Stage::Group { .. } => None,
    }
}
