//! Tournament configuration supplied at creation time.

use crate::models::tournament::TournamentError;
use serde::{Deserialize, Serialize};

/// How the registered players are split into groups (mutually exclusive).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// Fixed number of groups.
    GroupCount(usize),
    /// Fixed maximum group size; the group count follows from the player count.
    GroupSize(usize),
}

impl Default for GroupingMode {
    fn default() -> Self {
        GroupingMode::GroupCount(1)
    }
}

/// How many players advance from each group to the playoffs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceCount {
    /// Top n by standings. More than the group size means everyone.
    Top(usize),
    /// Every group member advances.
    All,
}

impl Default for AdvanceCount {
    fn default() -> Self {
        AdvanceCount::Top(2)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingPolicy {
    /// 1 vs N, 2 vs N-1, ... laid out so top seeds meet as late as possible.
    #[default]
    Standard,
    /// Avoid same-group first-round pairings wherever a cross-group opponent exists.
    GroupBased,
}

/// Explicit first-round cross-over between two groups (0-based group indices).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupMatchup {
    pub group_a: usize,
    pub group_b: usize,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    pub legs_to_win: u32,
    pub starting_score: u32,
    pub playoffs_enabled: bool,
    pub grouping: GroupingMode,
    pub advance: AdvanceCount,
    pub seeding: SeedingPolicy,
    /// Only used with `SeedingPolicy::GroupBased`.
    pub group_matchups: Vec<GroupMatchup>,
    /// Shuffle players before dealing them into groups.
    pub shuffle_groups: bool,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            legs_to_win: 3,
            starting_score: 501,
            playoffs_enabled: true,
            grouping: GroupingMode::default(),
            advance: AdvanceCount::default(),
            seeding: SeedingPolicy::default(),
            group_matchups: Vec::new(),
            shuffle_groups: false,
        }
    }
}

impl TournamentConfig {
    /// Check the values that do not depend on the player list.
    pub fn validate(&self) -> Result<(), TournamentError> {
        if self.legs_to_win == 0 {
            return Err(TournamentError::Configuration(
                "legs to win must be at least 1".into(),
            ));
        }
        if self.starting_score == 0 {
            return Err(TournamentError::Configuration(
                "starting score must be at least 1".into(),
            ));
        }
        match self.grouping {
            GroupingMode::GroupCount(0) => {
                return Err(TournamentError::Configuration(
                    "group count must be at least 1".into(),
                ))
            }
            GroupingMode::GroupSize(size) if size < 2 => {
                return Err(TournamentError::Configuration(
                    "group size must be at least 2".into(),
                ))
            }
            _ => {}
        }
        if self.advance == AdvanceCount::Top(0) {
            return Err(TournamentError::Configuration(
                "advance count must be at least 1".into(),
            ));
        }
        for m in &self.group_matchups {
            if m.group_a == m.group_b {
                return Err(TournamentError::Configuration(format!(
                    "group matchup pairs group {} with itself",
                    m.group_a + 1
                )));
            }
        }
        Ok(())
    }
}
