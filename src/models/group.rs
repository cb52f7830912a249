//! Group: members and their round-robin matches.

use crate::models::game::{GameMatch, MatchState};
use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a group.
pub type GroupId = Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Display name: "Group A", "Group B", ...
    pub name: String,
    /// Members in registration order (used as the final standings tie-break).
    pub members: Vec<PlayerId>,
    pub matches: Vec<GameMatch>,
}

impl Group {
    pub fn new(index: usize, members: Vec<PlayerId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: group_name(index),
            members,
            matches: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(|m| m.state == MatchState::Completed)
    }

    pub fn pending_matches(&self) -> usize {
        self.matches
            .iter()
            .filter(|m| m.state != MatchState::Completed)
            .count()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }
}

/// "Group A" .. "Group Z", then "Group 27", "Group 28", ...
pub fn group_name(index: usize) -> String {
    if index < 26 {
        format!("Group {}", (b'A' + index as u8) as char)
    } else {
        format!("Group {}", index + 1)
    }
}
