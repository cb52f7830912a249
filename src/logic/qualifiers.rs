//! Qualifier selection: who advances from each group to the playoff bracket.

use crate::logic::standings::{compute_standings, Standing};
use crate::models::{AdvanceCount, Group, Qualifier, Tournament, TournamentError};

/// Qualifiers of one group in rank order. `Top(n)` beyond the group size takes everyone.
pub fn group_qualifiers(standings: &[Standing], advance: AdvanceCount) -> Vec<&Standing> {
    let take = match advance {
        AdvanceCount::Top(n) => n.min(standings.len()),
        AdvanceCount::All => standings.len(),
    };
    standings.iter().take(take).collect()
}

/// Overall qualifier list: group-major, rank-minor. Seeds are 1-based positions in that list.
///
/// Every group match must be completed first.
pub fn select_qualifiers(tournament: &Tournament) -> Result<Vec<Qualifier>, TournamentError> {
    if let Some(open) = tournament.groups.iter().find(|g| !g.is_complete()) {
        return Err(TournamentError::IncompleteGroupStage {
            group: open.name.clone(),
            pending: open.pending_matches(),
        });
    }
    Ok(qualifiers_from_groups(&tournament.groups, tournament.config.advance))
}

fn qualifiers_from_groups(groups: &[Group], advance: AdvanceCount) -> Vec<Qualifier> {
    let mut qualifiers = Vec::new();
    for (group_index, group) in groups.iter().enumerate() {
        let standings = compute_standings(group);
        for s in group_qualifiers(&standings, advance) {
            qualifiers.push(Qualifier {
                player: s.player,
                group: group.id,
                group_index,
                group_rank: s.rank,
                seed: qualifiers.len() + 1,
            });
        }
    }
    qualifiers
}
