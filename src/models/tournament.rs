//! Tournament, TournamentStatus and TournamentError.

use crate::models::bracket::PlayoffBracket;
use crate::models::config::TournamentConfig;
use crate::models::game::{GameMatch, MatchId, MatchState};
use crate::models::group::{Group, GroupId};
use crate::models::player::{Player, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Invalid setup, e.g. a group would end up with fewer than 2 players.
    Configuration(String),
    /// Qualifiers requested while group matches are still open.
    IncompleteGroupStage { group: String, pending: usize },
    /// Bracket build with fewer than 2 qualifiers.
    InsufficientQualifiers { found: usize },
    /// Recorded legs or statistics don't satisfy the win condition.
    InvalidResult { match_id: MatchId, reason: String },
    /// Non-privileged actor invoking an admin operation.
    Unauthorized { actor: String },
    /// Re-entrant bracket build or a conflicting completion.
    Conflict(String),
    /// Tournament is not in a state that allows this action.
    InvalidState(String),
    TournamentNotFound(Uuid),
    MatchNotFound(MatchId),
    PlayerNotFound(PlayerId),
    /// A playoff match still waits for one of its players.
    MatchNotReady(MatchId),
    /// A player with this name already exists (names are unique, case-insensitive).
    DuplicatePlayerName(String),
    /// CSV player import could not be read.
    PlayerImport(String),
    /// A tournament lock was poisoned by a panicking writer.
    LockPoisoned,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::Configuration(reason) => write!(f, "Invalid configuration: {}", reason),
            TournamentError::IncompleteGroupStage { group, pending } => {
                write!(f, "{} still has {} unfinished match(es)", group, pending)
            }
            TournamentError::InsufficientQualifiers { found } => {
                write!(f, "Need at least 2 qualifiers for a bracket (found {})", found)
            }
            TournamentError::InvalidResult { match_id, reason } => {
                write!(f, "Invalid result for match {}: {}", match_id, reason)
            }
            TournamentError::Unauthorized { actor } => {
                write!(f, "'{}' is not allowed to perform admin operations", actor)
            }
            TournamentError::Conflict(reason) => write!(f, "Conflict: {}", reason),
            TournamentError::InvalidState(reason) => write!(f, "Invalid state for this action: {}", reason),
            TournamentError::TournamentNotFound(_) => write!(f, "Tournament not found"),
            TournamentError::MatchNotFound(_) => write!(f, "Match not found"),
            TournamentError::PlayerNotFound(_) => write!(f, "Player not found"),
            TournamentError::MatchNotReady(_) => write!(f, "Match is still waiting for a player"),
            TournamentError::DuplicatePlayerName(name) => {
                write!(f, "A player named '{}' already exists", name)
            }
            TournamentError::PlayerImport(reason) => write!(f, "Could not import players: {}", reason),
            TournamentError::LockPoisoned => write!(f, "lock error"),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Adding players; no groups yet.
    #[default]
    Registration,
    /// Group stage and (optionally) playoffs in progress.
    Active,
    /// Final played, or last group match played when playoffs are disabled.
    Completed,
}

/// Where a match lives inside a tournament.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchLocation {
    Group { group: usize, index: usize },
    Playoff { round: usize, index: usize },
}

#[derive(Debug, Deserialize)]
struct PlayerRow {
    name: String,
}

/// Full tournament state: players, groups, bracket and phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub config: TournamentConfig,
    pub status: TournamentStatus,
    /// Registered players in registration order.
    pub players: Vec<Player>,
    pub groups: Vec<Group>,
    /// Created once by `start_playoffs`, never rebuilt.
    pub bracket: Option<PlayoffBracket>,
}

impl Tournament {
    /// Create a new tournament in Registration with no players.
    pub fn new(name: impl Into<String>, config: TournamentConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            config,
            status: TournamentStatus::Registration,
            players: Vec::new(),
            groups: Vec::new(),
            bracket: None,
        }
    }

    /// Create a tournament with initial players. Still in Registration until started.
    ///
    /// Player ids are kept; names go through the same checks as [`Tournament::add_player`].
    pub fn with_players(
        name: impl Into<String>,
        players: Vec<Player>,
        config: TournamentConfig,
    ) -> Result<Self, TournamentError> {
        let mut tournament = Self::new(name, config);
        for player in players {
            tournament.register(player)?;
        }
        Ok(tournament)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_of(&self, player: PlayerId) -> Option<&Group> {
        self.groups.iter().find(|g| g.contains(player))
    }

    /// Add a player (Registration only). Names must be unique (case-insensitive).
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId, TournamentError> {
        if self.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState(
                "players can only be added during registration".into(),
            ));
        }
        self.register(Player::new(name))
    }

    fn register(&mut self, mut player: Player) -> Result<PlayerId, TournamentError> {
        let trimmed = player.name.trim();
        if trimmed.is_empty() {
            return Err(TournamentError::InvalidState("player name is empty".into()));
        }
        if self.player_by_name(trimmed).is_some() {
            return Err(TournamentError::DuplicatePlayerName(trimmed.to_string()));
        }
        if self.player(player.id).is_some() {
            return Err(TournamentError::Conflict(format!("player {} is already registered", player.id)));
        }
        player.name = trimmed.to_string();
        let id = player.id;
        self.players.push(player);
        Ok(id)
    }

    /// Remove a player by id (Registration only).
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<(), TournamentError> {
        if self.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState(
                "players can only be removed during registration".into(),
            ));
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(TournamentError::PlayerNotFound(player_id))?;
        self.players.remove(idx);
        Ok(())
    }

    /// Register players from CSV with a `name` header column. Blank names are skipped.
    ///
    /// All rows are checked before any player is added, so a duplicate anywhere
    /// in the file leaves the registration list untouched.
    pub fn import_players_csv<R: Read>(&mut self, reader: R) -> Result<Vec<PlayerId>, TournamentError> {
        if self.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState(
                "players can only be added during registration".into(),
            ));
        }
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut names: Vec<String> = Vec::new();
        for row in rdr.deserialize::<PlayerRow>() {
            let row = row.map_err(|e| TournamentError::PlayerImport(e.to_string()))?;
            if row.name.is_empty() {
                continue;
            }
            let duplicate = self.player_by_name(&row.name).is_some()
                || names.iter().any(|n| n.eq_ignore_ascii_case(&row.name));
            if duplicate {
                return Err(TournamentError::DuplicatePlayerName(row.name));
            }
            names.push(row.name);
        }
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(self.add_player(name)?);
        }
        Ok(ids)
    }

    /// Find which group or bracket round holds a match.
    pub fn locate_match(&self, match_id: MatchId) -> Option<MatchLocation> {
        for (g, group) in self.groups.iter().enumerate() {
            if let Some(index) = group.matches.iter().position(|m| m.id == match_id) {
                return Some(MatchLocation::Group { group: g, index });
            }
        }
        self.bracket
            .as_ref()
            .and_then(|b| b.locate(match_id))
            .map(|(round, index)| MatchLocation::Playoff { round, index })
    }

    pub fn match_at(&self, location: MatchLocation) -> Option<&GameMatch> {
        match location {
            MatchLocation::Group { group, index } => self.groups.get(group)?.matches.get(index),
            MatchLocation::Playoff { round, index } => {
                self.bracket.as_ref()?.rounds.get(round)?.matches.get(index)
            }
        }
    }

    pub fn match_at_mut(&mut self, location: MatchLocation) -> Option<&mut GameMatch> {
        match location {
            MatchLocation::Group { group, index } => self.groups.get_mut(group)?.matches.get_mut(index),
            MatchLocation::Playoff { round, index } => self
                .bracket
                .as_mut()?
                .rounds
                .get_mut(round)?
                .matches
                .get_mut(index),
        }
    }

    pub fn find_match(&self, match_id: MatchId) -> Option<&GameMatch> {
        self.locate_match(match_id).and_then(|loc| self.match_at(loc))
    }

    pub fn group_stage_complete(&self) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(Group::is_complete)
    }

    /// Any match with legs on the board or a result.
    pub fn has_recorded_results(&self) -> bool {
        let group_matches = self.groups.iter().flat_map(|g| g.matches.iter());
        let bracket_matches = self
            .bracket
            .iter()
            .flat_map(|b| b.rounds.iter())
            .flat_map(|r| r.matches.iter());
        group_matches
            .chain(bracket_matches)
            .any(|m| m.state != MatchState::Pending || m.legs_1 > 0 || m.legs_2 > 0)
    }
}
