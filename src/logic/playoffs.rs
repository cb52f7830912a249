//! Playoff start: the one-time transition from group standings to a seeded bracket.

use crate::logic::bracket::build_bracket;
use crate::logic::qualifiers::select_qualifiers;
use crate::models::{PlayoffBracket, Tournament, TournamentError, TournamentStatus};

/// Select qualifiers and build the bracket. A tournament gets at most one bracket;
/// calling this again is a conflict, never a re-seed.
pub fn start_playoffs(tournament: &mut Tournament) -> Result<&PlayoffBracket, TournamentError> {
    if tournament.bracket.is_some() {
        return Err(TournamentError::Conflict(
            "playoff bracket already exists".into(),
        ));
    }
    if tournament.status != TournamentStatus::Active {
        return Err(TournamentError::InvalidState(
            "playoffs can only start in an active tournament".into(),
        ));
    }
    if !tournament.config.playoffs_enabled {
        return Err(TournamentError::InvalidState(
            "playoffs are disabled for this tournament".into(),
        ));
    }
    let qualifiers = select_qualifiers(tournament)?;
    let bracket = build_bracket(
        &qualifiers,
        tournament.config.seeding,
        &tournament.config.group_matchups,
    )?;
    log::info!(
        "Tournament {}: playoffs started with {} qualifiers",
        tournament.id,
        qualifiers.len()
    );
    Ok(tournament.bracket.insert(bracket))
}
