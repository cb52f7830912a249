//! Admin corrections: privileged, audited, single-shot mutations outside the normal match flow.
//!
//! Every operation needs an [`AdminCapability`], which only [`authorize`] hands
//! out. Operations run against a copy of the tournament and replace it only on
//! success, so a cascading reset is applied entirely or not at all.

use crate::logic::propagation::{apply_completion, locate, validate_result, validate_stats};
use crate::logic::qualifiers::select_qualifiers;
use crate::models::{
    AdvanceCount, GameMatch, GroupMatchup, GroupingMode, MatchId, MatchLocation, MatchResult,
    MatchState, PlayoffBracket, SeedingPolicy, Side, Slot, Stage, Tournament, TournamentError,
    TournamentId, TournamentStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Decides whether an actor may run admin operations.
pub trait Authorizer: Send + Sync {
    fn is_privileged(&self, actor: &str) -> bool;
}

/// Fixed list of privileged actors (case-sensitive).
#[derive(Clone, Debug, Default)]
pub struct StaticAdmins {
    actors: HashSet<String>,
}

impl StaticAdmins {
    pub fn new<I, S>(actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actors: actors.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list such as `"alice, bob"`.
    pub fn from_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl Authorizer for StaticAdmins {
    fn is_privileged(&self, actor: &str) -> bool {
        self.actors.contains(actor)
    }
}

/// Proof that `actor` passed the privilege check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminCapability {
    actor: String,
}

impl AdminCapability {
    pub fn actor(&self) -> &str {
        &self.actor
    }
}

/// The single privilege check for admin operations.
pub fn authorize(authorizer: &dyn Authorizer, actor: &str) -> Result<AdminCapability, TournamentError> {
    let actor = actor.trim();
    if actor.is_empty() || !authorizer.is_privileged(actor) {
        log::warn!("Non-admin actor attempted admin access: '{}'", actor);
        return Err(TournamentError::Unauthorized {
            actor: actor.to_string(),
        });
    }
    Ok(AdminCapability {
        actor: actor.to_string(),
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum AdminAction {
    ResetMatch { match_id: MatchId },
    CorrectScore { match_id: MatchId, legs_1: u32, legs_2: u32 },
    AdjustLegs { match_id: MatchId, side: Side, delta: i32 },
    ForceComplete { match_id: MatchId, winner: Side },
    EditTournament,
    DeleteTournament,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub actor: String,
    pub tournament: TournamentId,
    pub action: AdminAction,
    pub before: serde_json::Value,
    pub after: serde_json::Value,
    /// Downstream matches reset as a consequence.
    pub cascaded: Vec<MatchId>,
}

impl AuditEntry {
    pub fn new(
        capability: &AdminCapability,
        tournament: TournamentId,
        action: AdminAction,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self {
            at: Utc::now(),
            actor: capability.actor.clone(),
            tournament,
            action,
            before,
            after,
            cascaded: Vec::new(),
        }
    }
}

/// Append-only record of admin operations on one tournament.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn record(&mut self, entry: AuditEntry) -> &AuditEntry {
        log::info!(
            "audit: {} ran {:?} on tournament {} (cascaded: {})",
            entry.actor,
            entry.action,
            entry.tournament,
            entry.cascaded.len()
        );
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Configuration fields an admin can change after creation. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentEdit {
    pub name: Option<String>,
    pub legs_to_win: Option<u32>,
    pub starting_score: Option<u32>,
    pub playoffs_enabled: Option<bool>,
    pub grouping: Option<GroupingMode>,
    pub advance: Option<AdvanceCount>,
    pub seeding: Option<SeedingPolicy>,
    pub group_matchups: Option<Vec<GroupMatchup>>,
    pub shuffle_groups: Option<bool>,
}

fn snapshot<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn match_snapshot(tournament: &Tournament, loc: MatchLocation) -> serde_json::Value {
    tournament
        .match_at(loc)
        .map_or(serde_json::Value::Null, snapshot::<GameMatch>)
}

/// Run `op` on a copy and commit it only if it succeeds.
fn transact<T>(
    tournament: &mut Tournament,
    op: impl FnOnce(&mut Tournament) -> Result<T, TournamentError>,
) -> Result<T, TournamentError> {
    let mut next = tournament.clone();
    let out = op(&mut next)?;
    *tournament = next;
    Ok(out)
}

fn playoff_position(m: &GameMatch) -> Option<(usize, usize)> {
    match m.stage {
        Stage::Playoff { round, position } => Some((round, position)),
        Stage::Group { .. } => None,
    }
}

/// Reset a bracket match; if it had propagated a winner, pull that winner back
/// out and reset every downstream match that already used it.
fn reset_playoff(
    bracket: &mut PlayoffBracket,
    round: usize,
    position: usize,
    cascaded: &mut Vec<MatchId>,
) -> Result<(), TournamentError> {
    let m = bracket
        .match_at_mut(round, position)
        .ok_or_else(|| TournamentError::InvalidState("bracket round is missing a match".into()))?;
    let had_result = m.state == MatchState::Completed;
    m.reset();
    if !had_result {
        return Ok(());
    }
    match bracket.successor(round, position) {
        None => bracket.champion = None,
        Some((next_round, next_position, side)) => {
            let next = bracket
                .match_at(next_round, next_position)
                .ok_or_else(|| TournamentError::InvalidState("bracket round is missing a match".into()))?;
            if next.state != MatchState::Pending || next.legs_1 > 0 || next.legs_2 > 0 {
                cascaded.push(next.id);
                reset_playoff(bracket, next_round, next_position, cascaded)?;
            }
            if let Some(next) = bracket.match_at_mut(next_round, next_position) {
                *next.slot_mut(side) = Slot::Empty;
            }
        }
    }
    Ok(())
}

/// Reset the match at `loc` with the cascade, and fix up the tournament status.
fn reset_at(
    tournament: &mut Tournament,
    loc: MatchLocation,
    cascaded: &mut Vec<MatchId>,
) -> Result<(), TournamentError> {
    let m = tournament
        .match_at(loc)
        .ok_or_else(|| TournamentError::InvalidState("match location is stale".into()))?;
    match loc {
        MatchLocation::Group { .. } => {
            if let Some(m) = tournament.match_at_mut(loc) {
                m.reset();
            }
            if tournament.status == TournamentStatus::Completed && tournament.bracket.is_none() {
                tournament.status = TournamentStatus::Active;
            }
        }
        MatchLocation::Playoff { .. } => {
            let (round, position) = playoff_position(m)
                .ok_or_else(|| TournamentError::InvalidState("bracket match without a position".into()))?;
            let bracket = tournament
                .bracket
                .as_mut()
                .ok_or_else(|| TournamentError::InvalidState("no playoff bracket".into()))?;
            reset_playoff(bracket, round, position, cascaded)?;
            if bracket.champion.is_none() && tournament.status == TournamentStatus::Completed {
                tournament.status = TournamentStatus::Active;
            }
        }
    }
    Ok(())
}

/// Once the bracket exists, a group correction may only go through if the
/// group stage still seeds exactly the same qualifiers.
fn ensure_seeding_holds(t: &Tournament, loc: MatchLocation) -> Result<(), TournamentError> {
    let (MatchLocation::Group { .. }, Some(bracket)) = (loc, t.bracket.as_ref()) else {
        return Ok(());
    };
    let unchanged = select_qualifiers(t).is_ok_and(|q| q == bracket.qualifiers);
    if !unchanged {
        return Err(TournamentError::Conflict(
            "group results are locked once they seed the playoff bracket".into(),
        ));
    }
    Ok(())
}

/// Revert a match to pending, retracting its winner from the bracket (cascading).
/// Group matches can't be reset once the bracket is seeded.
pub fn reset_match(
    tournament: &mut Tournament,
    capability: &AdminCapability,
    audit: &mut AuditLog,
    match_id: MatchId,
) -> Result<AuditEntry, TournamentError> {
    let entry = transact(tournament, |t| {
        let loc = locate(t, match_id)?;
        let before = match_snapshot(t, loc);
        let mut cascaded = Vec::new();
        reset_at(t, loc, &mut cascaded)?;
        ensure_seeding_holds(t, loc)?;
        let mut entry = AuditEntry::new(
            capability,
            t.id,
            AdminAction::ResetMatch { match_id },
            before,
            match_snapshot(t, loc),
        );
        entry.cascaded = cascaded;
        Ok(entry)
    })?;
    Ok(audit.record(entry).clone())
}

/// Shared by `correct_score` and `adjust_legs`: set the legs of a match, re-deciding
/// and re-propagating the result when it changes the winner. A group correction
/// after seeding is rejected unless the qualifiers and their seeds stay the same.
fn set_legs(
    t: &mut Tournament,
    match_id: MatchId,
    legs_1: u32,
    legs_2: u32,
    cascaded: &mut Vec<MatchId>,
) -> Result<MatchLocation, TournamentError> {
    let loc = locate(t, match_id)?;
    let m = t
        .match_at(loc)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    if !m.is_ready() {
        return Err(TournamentError::MatchNotReady(match_id));
    }
    let target = t.config.legs_to_win;
    let result = MatchResult {
        legs_1,
        legs_2,
        stats_1: m.stats_1.clone(),
        stats_2: m.stats_2.clone(),
    };

    if m.state == MatchState::Completed {
        let winner = validate_result(&t.config, match_id, &result)?;
        if m.winner == Some(winner) {
            if let Some(m) = t.match_at_mut(loc) {
                m.legs_1 = legs_1;
                m.legs_2 = legs_2;
            }
        } else {
            reset_at(t, loc, cascaded)?;
            apply_completion(t, loc, result, winner)?;
        }
        ensure_seeding_holds(t, loc)?;
        return Ok(loc);
    }

    if legs_1 > target || legs_2 > target {
        return Err(TournamentError::InvalidResult {
            match_id,
            reason: format!("no side can win more than {} legs", target),
        });
    }
    if legs_1 == target || legs_2 == target {
        let winner = validate_result(&t.config, match_id, &result)?;
        apply_completion(t, loc, result, winner)?;
    } else if let Some(m) = t.match_at_mut(loc) {
        m.legs_1 = legs_1;
        m.legs_2 = legs_2;
        m.state = MatchState::InProgress;
    }
    Ok(loc)
}

/// Overwrite the recorded legs of an in-progress or completed match.
pub fn correct_score(
    tournament: &mut Tournament,
    capability: &AdminCapability,
    audit: &mut AuditLog,
    match_id: MatchId,
    legs_1: u32,
    legs_2: u32,
) -> Result<AuditEntry, TournamentError> {
    let entry = transact(tournament, |t| {
        let loc = locate(t, match_id)?;
        let before = match_snapshot(t, loc);
        let mut cascaded = Vec::new();
        set_legs(t, match_id, legs_1, legs_2, &mut cascaded)?;
        let mut entry = AuditEntry::new(
            capability,
            t.id,
            AdminAction::CorrectScore {
                match_id,
                legs_1,
                legs_2,
            },
            before,
            match_snapshot(t, loc),
        );
        entry.cascaded = cascaded;
        Ok(entry)
    })?;
    Ok(audit.record(entry).clone())
}

/// Add `delta` legs (negative to remove) to one side of a match.
pub fn adjust_legs(
    tournament: &mut Tournament,
    capability: &AdminCapability,
    audit: &mut AuditLog,
    match_id: MatchId,
    side: Side,
    delta: i32,
) -> Result<AuditEntry, TournamentError> {
    let entry = transact(tournament, |t| {
        let loc = locate(t, match_id)?;
        let m = t
            .match_at(loc)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        let current = match side {
            Side::One => m.legs_1,
            Side::Two => m.legs_2,
        };
        let adjusted = current
            .checked_add_signed(delta)
            .ok_or_else(|| TournamentError::InvalidResult {
                match_id,
                reason: format!("cannot adjust {} legs by {}", current, delta),
            })?;
        let (legs_1, legs_2) = match side {
            Side::One => (adjusted, m.legs_2),
            Side::Two => (m.legs_1, adjusted),
        };
        let before = match_snapshot(t, loc);
        let mut cascaded = Vec::new();
        set_legs(t, match_id, legs_1, legs_2, &mut cascaded)?;
        let mut entry = AuditEntry::new(
            capability,
            t.id,
            AdminAction::AdjustLegs {
                match_id,
                side,
                delta,
            },
            before,
            match_snapshot(t, loc),
        );
        entry.cascaded = cascaded;
        Ok(entry)
    })?;
    Ok(audit.record(entry).clone())
}

/// Complete a match for `winner` regardless of the recorded legs, then propagate as usual.
pub fn force_complete_match(
    tournament: &mut Tournament,
    capability: &AdminCapability,
    audit: &mut AuditLog,
    match_id: MatchId,
    winner: Side,
) -> Result<AuditEntry, TournamentError> {
    let entry = transact(tournament, |t| {
        let loc = locate(t, match_id)?;
        let m = t
            .match_at(loc)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        if !m.is_ready() {
            return Err(TournamentError::MatchNotReady(match_id));
        }
        validate_stats(&t.config, match_id, m.stats_1.as_ref())?;
        validate_stats(&t.config, match_id, m.stats_2.as_ref())?;
        let already = m.state == MatchState::Completed;
        let same_winner = m.winner == Some(winner);
        let result = m.result();
        let before = match_snapshot(t, loc);
        let mut cascaded = Vec::new();
        if !(already && same_winner) {
            if already {
                reset_at(t, loc, &mut cascaded)?;
            }
            apply_completion(t, loc, result, winner)?;
        }
        ensure_seeding_holds(t, loc)?;
        let mut entry = AuditEntry::new(
            capability,
            t.id,
            AdminAction::ForceComplete { match_id, winner },
            before,
            match_snapshot(t, loc),
        );
        entry.cascaded = cascaded;
        Ok(entry)
    })?;
    Ok(audit.record(entry).clone())
}

/// Change name or configuration. Settings can only change while the structures
/// they shape don't exist yet: grouping before the start, playoff settings
/// before the bracket, scoring before any leg is recorded.
pub fn edit_tournament(
    tournament: &mut Tournament,
    capability: &AdminCapability,
    audit: &mut AuditLog,
    edit: TournamentEdit,
) -> Result<AuditEntry, TournamentError> {
    let entry = transact(tournament, |t| {
        let before = serde_json::json!({ "name": t.name, "config": snapshot(&t.config) });
        let mut config = t.config.clone();

        if let Some(name) = &edit.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(TournamentError::Configuration("tournament name is empty".into()));
            }
            t.name = name.to_string();
        }
        if edit.legs_to_win.is_some() || edit.starting_score.is_some() {
            if t.has_recorded_results() {
                return Err(TournamentError::InvalidState(
                    "scoring settings are locked once results are recorded".into(),
                ));
            }
            config.legs_to_win = edit.legs_to_win.unwrap_or(config.legs_to_win);
            config.starting_score = edit.starting_score.unwrap_or(config.starting_score);
        }
        if edit.grouping.is_some() || edit.shuffle_groups.is_some() {
            if t.status != TournamentStatus::Registration {
                return Err(TournamentError::InvalidState(
                    "groups are already formed".into(),
                ));
            }
            config.grouping = edit.grouping.unwrap_or(config.grouping);
            config.shuffle_groups = edit.shuffle_groups.unwrap_or(config.shuffle_groups);
        }
        let playoff_edit = edit.playoffs_enabled.is_some()
            || edit.advance.is_some()
            || edit.seeding.is_some()
            || edit.group_matchups.is_some();
        if playoff_edit {
            if t.bracket.is_some() {
                return Err(TournamentError::InvalidState(
                    "playoff settings are locked once the bracket exists".into(),
                ));
            }
            config.playoffs_enabled = edit.playoffs_enabled.unwrap_or(config.playoffs_enabled);
            config.advance = edit.advance.unwrap_or(config.advance);
            config.seeding = edit.seeding.unwrap_or(config.seeding);
            if let Some(matchups) = &edit.group_matchups {
                config.group_matchups = matchups.clone();
            }
        }
        config.validate()?;
        t.config = config;

        // Toggling playoffs after the group stage finished moves the finish line.
        if t.status != TournamentStatus::Registration && t.bracket.is_none() {
            t.status = if !t.config.playoffs_enabled && t.group_stage_complete() {
                TournamentStatus::Completed
            } else {
                TournamentStatus::Active
            };
        }

        let after = serde_json::json!({ "name": t.name, "config": snapshot(&t.config) });
        Ok(AuditEntry::new(
            capability,
            t.id,
            AdminAction::EditTournament,
            before,
            after,
        ))
    })?;
    Ok(audit.record(entry).clone())
}
