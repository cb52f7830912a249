//! Group stage: splitting players into groups and generating round-robin matches.

use crate::models::{
    GameMatch, Group, GroupingMode, Player, Slot, Stage, TournamentConfig, TournamentError,
};
use rand::seq::SliceRandom;

/// Sizes of the groups `grouping` produces for `player_count` players.
///
/// Sizes differ by at most one and larger groups come first.
pub fn plan_group_sizes(
    grouping: GroupingMode,
    player_count: usize,
) -> Result<Vec<usize>, TournamentError> {
    if player_count < 2 {
        return Err(TournamentError::Configuration(format!(
            "need at least 2 players to form a group (have {})",
            player_count
        )));
    }
    let count = match grouping {
        GroupingMode::GroupCount(n) => n,
        GroupingMode::GroupSize(size) if size >= 2 => player_count.div_ceil(size),
        GroupingMode::GroupSize(size) => {
            return Err(TournamentError::Configuration(format!(
                "group size {} is below the minimum of 2",
                size
            )))
        }
    };
    if count == 0 {
        return Err(TournamentError::Configuration(
            "group count must be at least 1".into(),
        ));
    }
    let base = player_count / count;
    let extra = player_count % count;
    if base < 2 {
        return Err(TournamentError::Configuration(format!(
            "{} players in {} groups leaves a group with fewer than 2 players",
            player_count, count
        )));
    }
    Ok((0..count)
        .map(|g| if g < extra { base + 1 } else { base })
        .collect())
}

/// Every pairing of a round-robin over `n` members as `(round, a, b)` with `a < b`.
///
/// Circle method: member 0 stays put while the others rotate, and an odd
/// member count gets a rest marker so each round one member sits out.
pub fn round_robin_pairings(n: usize) -> Vec<(usize, usize, usize)> {
    if n < 2 {
        return Vec::new();
    }
    let mut circle: Vec<Option<usize>> = (0..n).map(Some).collect();
    if n % 2 == 1 {
        circle.push(None);
    }
    let m = circle.len();
    let mut pairings = Vec::with_capacity(n * (n - 1) / 2);
    for round in 1..m {
        for i in 0..m / 2 {
            if let (Some(a), Some(b)) = (circle[i], circle[m - 1 - i]) {
                pairings.push((round, a.min(b), a.max(b)));
            }
        }
        circle[1..].rotate_right(1);
    }
    pairings
}

/// Split players into groups and create each group's pending round-robin matches.
///
/// Players are dealt in registration order (shuffled first when
/// `shuffle_groups` is set); each group keeps its members in registration order.
pub fn generate_groups(
    config: &TournamentConfig,
    players: &[Player],
) -> Result<Vec<Group>, TournamentError> {
    let sizes = plan_group_sizes(config.grouping, players.len())?;
    let count = sizes.len();

    let mut order: Vec<usize> = (0..players.len()).collect();
    if config.shuffle_groups {
        order.shuffle(&mut rand::thread_rng());
    }

    let mut dealt: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, &player_idx) in order.iter().enumerate() {
        dealt[i % count].push(player_idx);
    }

    let groups = dealt
        .into_iter()
        .enumerate()
        .map(|(g, mut idxs)| {
            idxs.sort_unstable();
            let members = idxs.iter().map(|&i| players[i].id).collect();
            let mut group = Group::new(g, members);
            group.matches = round_robin_pairings(group.members.len())
                .into_iter()
                .map(|(round, a, b)| {
                    GameMatch::new(
                        Slot::Player(group.members[a]),
                        Slot::Player(group.members[b]),
                        Stage::Group {
                            group: group.id,
                            round,
                        },
                    )
                })
                .collect();
            log::debug!(
                "{}: {} players, {} matches",
                group.name,
                group.members.len(),
                group.matches.len()
            );
            group
        })
        .collect();
    Ok(groups)
}
