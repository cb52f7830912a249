//! Match state machine and winner propagation through the bracket.

use crate::models::{
    MatchId, MatchLocation, MatchResult, MatchState, PlayerStats, Side, Slot, Stage, Tournament,
    TournamentConfig, TournamentError, TournamentStatus,
};
use serde::Serialize;

/// Result of delivering a completion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Completed,
    /// The same result had already been applied; nothing changed.
    AlreadyCompleted,
}

/// Check a final result against the configuration and return the winning side.
///
/// The winner must have exactly `legs_to_win` legs and the loser fewer.
pub fn validate_result(
    config: &TournamentConfig,
    match_id: MatchId,
    result: &MatchResult,
) -> Result<Side, TournamentError> {
    let invalid = |reason: String| TournamentError::InvalidResult { match_id, reason };
    let Some(winner) = result.leader() else {
        return Err(invalid(format!(
            "legs are level at {}-{}",
            result.legs_1, result.legs_2
        )));
    };
    let winner_legs = result.legs_1.max(result.legs_2);
    if winner_legs != config.legs_to_win {
        return Err(invalid(format!(
            "winner needs exactly {} legs (has {})",
            config.legs_to_win, winner_legs
        )));
    }
    validate_stats(config, match_id, result.stats_1.as_ref())?;
    validate_stats(config, match_id, result.stats_2.as_ref())?;
    Ok(winner)
}

pub(crate) fn validate_stats(
    config: &TournamentConfig,
    match_id: MatchId,
    stats: Option<&PlayerStats>,
) -> Result<(), TournamentError> {
    let Some(stats) = stats else {
        return Ok(());
    };
    if let Some(checkout) = stats.highest_checkout {
        if checkout > config.starting_score {
            return Err(TournamentError::InvalidResult {
                match_id,
                reason: format!(
                    "checkout {} exceeds the starting score {}",
                    checkout, config.starting_score
                ),
            });
        }
    }
    if let Some(average) = stats.average {
        if !average.is_finite() || !(0.0..=180.0).contains(&average) {
            return Err(TournamentError::InvalidResult {
                match_id,
                reason: format!("three-dart average {} is out of range", average),
            });
        }
    }
    Ok(())
}

pub(crate) fn locate(tournament: &Tournament, match_id: MatchId) -> Result<MatchLocation, TournamentError> {
    tournament
        .locate_match(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))
}

fn ensure_active(tournament: &Tournament) -> Result<(), TournamentError> {
    match tournament.status {
        TournamentStatus::Active => Ok(()),
        TournamentStatus::Registration => Err(TournamentError::InvalidState(
            "tournament has not started".into(),
        )),
        TournamentStatus::Completed => Err(TournamentError::InvalidState(
            "tournament is already completed".into(),
        )),
    }
}

/// Pending → in progress. Starting an in-progress match again is a no-op.
pub fn start_match(tournament: &mut Tournament, match_id: MatchId) -> Result<(), TournamentError> {
    ensure_active(tournament)?;
    let loc = locate(tournament, match_id)?;
    let m = tournament
        .match_at_mut(loc)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    match m.state {
        MatchState::Pending if !m.is_ready() => Err(TournamentError::MatchNotReady(match_id)),
        MatchState::Pending => {
            m.state = MatchState::InProgress;
            Ok(())
        }
        MatchState::InProgress => Ok(()),
        MatchState::Completed => Err(TournamentError::InvalidState(
            "match is already completed".into(),
        )),
    }
}

/// Live scoring. Reaching `legs_to_win` on either side completes the match.
///
/// Returns the match state after the update.
pub fn record_legs(
    tournament: &mut Tournament,
    match_id: MatchId,
    legs_1: u32,
    legs_2: u32,
) -> Result<MatchState, TournamentError> {
    ensure_active(tournament)?;
    let loc = locate(tournament, match_id)?;
    let target = tournament.config.legs_to_win;
    let m = tournament
        .match_at(loc)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    if m.state == MatchState::Completed {
        return Err(TournamentError::InvalidState(
            "match is already completed; use a score correction".into(),
        ));
    }
    if !m.is_ready() {
        return Err(TournamentError::MatchNotReady(match_id));
    }
    if legs_1 > target || legs_2 > target {
        return Err(TournamentError::InvalidResult {
            match_id,
            reason: format!("no side can win more than {} legs", target),
        });
    }
    if legs_1 == target || legs_2 == target {
        let result = MatchResult {
            legs_1,
            legs_2,
            stats_1: m.stats_1.clone(),
            stats_2: m.stats_2.clone(),
        };
        complete_match(tournament, match_id, result)?;
        return Ok(MatchState::Completed);
    }
    let m = tournament
        .match_at_mut(loc)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    m.legs_1 = legs_1;
    m.legs_2 = legs_2;
    m.state = MatchState::InProgress;
    Ok(MatchState::InProgress)
}

/// Complete a match with a validated result and propagate the winner.
///
/// A ready match may be completed straight from `Pending`; calling
/// [`start_match`] first is optional.
///
/// Delivering the same legs again is a no-op; different legs for a completed
/// match are a conflict (corrections go through the admin operations). An
/// invalid result leaves the match untouched.
pub fn complete_match(
    tournament: &mut Tournament,
    match_id: MatchId,
    result: MatchResult,
) -> Result<CompletionOutcome, TournamentError> {
    let loc = locate(tournament, match_id)?;
    let m = tournament
        .match_at(loc)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    if m.state == MatchState::Completed {
        if m.legs_1 == result.legs_1 && m.legs_2 == result.legs_2 {
            log::debug!("Match {} already completed with {}-{}", match_id, m.legs_1, m.legs_2);
            return Ok(CompletionOutcome::AlreadyCompleted);
        }
        return Err(TournamentError::Conflict(format!(
            "match {} is already completed with {}-{}",
            match_id, m.legs_1, m.legs_2
        )));
    }
    ensure_active(tournament)?;
    if !m.is_ready() {
        return Err(TournamentError::MatchNotReady(match_id));
    }
    let winner = validate_result(&tournament.config, match_id, &result)?;
    apply_completion(tournament, loc, result, winner)?;
    Ok(CompletionOutcome::Completed)
}

/// Write a result and move the winner on. The successor slot is checked before
/// anything changes, so a failure leaves the tournament as it was.
pub(crate) fn apply_completion(
    tournament: &mut Tournament,
    loc: MatchLocation,
    result: MatchResult,
    winner: Side,
) -> Result<(), TournamentError> {
    let m = tournament
        .match_at(loc)
        .ok_or_else(|| TournamentError::InvalidState("match location is stale".into()))?;
    let match_id = m.id;
    let winner_id = m
        .slot(winner)
        .player()
        .ok_or(TournamentError::MatchNotReady(match_id))?;

    let successor = match (loc, m.stage) {
        (MatchLocation::Playoff { .. }, Stage::Playoff { round, position }) => {
            let bracket = tournament
                .bracket
                .as_ref()
                .ok_or_else(|| TournamentError::InvalidState("no playoff bracket".into()))?;
            match bracket.successor(round, position) {
                Some((next_round, next_position, side)) => {
                    let next = bracket
                        .match_at(next_round, next_position)
                        .ok_or_else(|| TournamentError::InvalidState("bracket round is missing a match".into()))?;
                    match next.slot(side) {
                        Slot::Empty => {}
                        Slot::Player(p) if p == winner_id => {}
                        _ => {
                            return Err(TournamentError::Conflict(format!(
                                "next-round slot for match {} is already taken",
                                match_id
                            )))
                        }
                    }
                    Some((next_round, next_position, side))
                }
                None => None,
            }
        }
        _ => None,
    };

    let m = tournament
        .match_at_mut(loc)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    m.complete(result, winner);
    log::debug!("Match {} completed {}-{}", match_id, m.legs_1, m.legs_2);

    match loc {
        MatchLocation::Playoff { .. } => {
            let Some(bracket) = tournament.bracket.as_mut() else {
                return Ok(());
            };
            match successor {
                Some((next_round, next_position, side)) => {
                    if let Some(next) = bracket.match_at_mut(next_round, next_position) {
                        *next.slot_mut(side) = Slot::Player(winner_id);
                        if next.is_ready() {
                            log::debug!("Round {} match {} is ready", next_round, next_position);
                        }
                    }
                }
                None => {
                    bracket.champion = Some(winner_id);
                    tournament.status = TournamentStatus::Completed;
                    log::info!("Tournament {} completed, champion {}", tournament.id, winner_id);
                }
            }
        }
        MatchLocation::Group { .. } => {
            if tournament.group_stage_complete() {
                if tournament.config.playoffs_enabled {
                    log::info!("Tournament {}: group stage complete", tournament.id);
                } else {
                    tournament.status = TournamentStatus::Completed;
                    log::info!("Tournament {} completed after the group stage", tournament.id);
                }
            }
        }
    }
    Ok(())
}
