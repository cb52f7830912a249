//! Setup phase: start tournament (transition from Registration to Active with groups).

use crate::logic::group_play::generate_groups;
use crate::models::{Tournament, TournamentError, TournamentStatus};

/// Start the tournament: validate the configuration, build groups and their schedules.
///
/// Groups are created exactly once; a started tournament rejects a second start.
pub fn start_tournament(tournament: &mut Tournament) -> Result<(), TournamentError> {
    if tournament.status != TournamentStatus::Registration {
        return Err(TournamentError::InvalidState(
            "tournament has already started".into(),
        ));
    }
    tournament.config.validate()?;
    let groups = generate_groups(&tournament.config, &tournament.players)?;
    log::info!(
        "Tournament {} started: {} players in {} group(s), {} group matches",
        tournament.id,
        tournament.players.len(),
        groups.len(),
        groups.iter().map(|g| g.matches.len()).sum::<usize>()
    );
    tournament.groups = groups;
    tournament.status = TournamentStatus::Active;
    Ok(())
}
