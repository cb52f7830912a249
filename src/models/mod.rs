//! Data structures for the dart tournament: players, groups, matches, bracket, tournament state.

mod bracket;
mod config;
mod game;
mod group;
mod player;
mod tournament;

pub use bracket::{BracketRound, Bye, PlayoffBracket, Qualifier};
pub use config::{AdvanceCount, GroupMatchup, GroupingMode, SeedingPolicy, TournamentConfig};
pub use game::{GameMatch, MatchId, MatchResult, MatchState, Side, Slot, Stage};
pub use group::{group_name, Group, GroupId};
pub use player::{Player, PlayerId, PlayerStats};
pub use tournament::{MatchLocation, Tournament, TournamentError, TournamentId, TournamentStatus};
