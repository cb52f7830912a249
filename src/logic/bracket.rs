//! Bracket construction: size, byes, seeding policies and the empty later rounds.

use crate::models::{
    BracketRound, Bye, GameMatch, GroupMatchup, PlayoffBracket, Qualifier, SeedingPolicy, Side,
    Slot, Stage, TournamentError,
};
use std::collections::HashMap;

/// Smallest power of two that fits `qualifiers` lines.
pub fn bracket_size(qualifiers: usize) -> usize {
    qualifiers.max(2).next_power_of_two()
}

/// Seeds in top-to-bottom line order for a bracket of `size` lines.
///
/// Seed s meets seed size+1-s first, and the two best seeds can only meet in
/// the final. For 8 lines: 1, 8, 4, 5, 2, 7, 3, 6.
pub fn standard_line_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    let mut lines = 1;
    while lines < size {
        lines *= 2;
        order = order
            .into_iter()
            .flat_map(|s| [s, lines + 1 - s])
            .collect();
    }
    order
}

/// A first-round line pair before it is placed: the better seed and its opponent (None = bye).
#[derive(Clone, Debug)]
struct Pairing {
    anchor: Qualifier,
    opponent: Option<Qualifier>,
}

/// Build the full bracket skeleton from the overall qualifier list.
///
/// Round 0 is fully seeded, bye holders are already written into round 1 and
/// every later round is a set of empty placeholder matches.
pub fn build_bracket(
    qualifiers: &[Qualifier],
    policy: SeedingPolicy,
    matchups: &[GroupMatchup],
) -> Result<PlayoffBracket, TournamentError> {
    if qualifiers.len() < 2 {
        return Err(TournamentError::InsufficientQualifiers {
            found: qualifiers.len(),
        });
    }
    let mut seeded = qualifiers.to_vec();
    seeded.sort_by_key(|q| q.seed);

    let size = bracket_size(seeded.len());
    let bye_count = size - seeded.len();

    let mut pairings = match policy {
        SeedingPolicy::Standard => standard_pairings(&seeded, size),
        SeedingPolicy::GroupBased => group_based_pairings(&seeded, bye_count, matchups),
    };
    pairings.sort_by_key(|p| p.anchor.seed);

    // The k-th best anchor takes the pair position standard seeding gives seed k+1.
    let order = standard_line_order(size);
    let mut position_of_rank: HashMap<usize, usize> = HashMap::new();
    for (position, pair) in order.chunks_exact(2).enumerate() {
        position_of_rank.insert(pair[0].min(pair[1]), position);
    }

    let round_count = size.trailing_zeros() as usize;
    let mut rounds: Vec<BracketRound> = (0..round_count)
        .map(|r| BracketRound {
            index: r,
            matches: Vec::new(),
            byes: Vec::new(),
        })
        .collect();
    for r in 1..round_count {
        rounds[r].matches = (0..size >> (r + 1))
            .map(|position| GameMatch::new(Slot::Empty, Slot::Empty, Stage::Playoff { round: r, position }))
            .collect();
    }

    for (k, pairing) in pairings.into_iter().enumerate() {
        let position = position_of_rank.get(&(k + 1)).copied().unwrap_or(k);
        match pairing.opponent {
            Some(opponent) => rounds[0].matches.push(GameMatch::new(
                Slot::Player(pairing.anchor.player),
                Slot::Player(opponent.player),
                Stage::Playoff { round: 0, position },
            )),
            None => {
                rounds[0].byes.push(Bye {
                    seed: pairing.anchor.seed,
                    player: pairing.anchor.player,
                    position,
                });
                // A bye can only exist when there is a round after round 0.
                let side = if position % 2 == 0 { Side::One } else { Side::Two };
                if let Some(next) = rounds
                    .get_mut(1)
                    .and_then(|r| r.matches.get_mut(position / 2))
                {
                    *next.slot_mut(side) = Slot::Player(pairing.anchor.player);
                }
            }
        }
    }
    rounds[0].matches.sort_by_key(|m| match m.stage {
        Stage::Playoff { position, .. } => position,
        Stage::Group { .. } => 0,
    });
    rounds[0].byes.sort_by_key(|b| b.position);

    log::info!(
        "Built {:?} bracket: {} qualifiers, {} lines, {} bye(s), {} round(s)",
        policy,
        seeded.len(),
        size,
        bye_count,
        round_count
    );

    Ok(PlayoffBracket {
        size,
        seeding: policy,
        qualifiers: seeded,
        rounds,
        champion: None,
    })
}

/// Seed s against seed size+1-s; missing high seeds are byes for the top seeds.
fn standard_pairings(seeded: &[Qualifier], size: usize) -> Vec<Pairing> {
    (1..=size / 2)
        .map(|s| Pairing {
            anchor: seeded[s - 1].clone(),
            opponent: seeded.get(size - s).cloned(),
        })
        .collect()
}

/// Byes for the top seeds, then explicit group matchups, then automatic cross-group pairing.
fn group_based_pairings(
    seeded: &[Qualifier],
    bye_count: usize,
    matchups: &[GroupMatchup],
) -> Vec<Pairing> {
    let mut pairings: Vec<Pairing> = seeded[..bye_count]
        .iter()
        .map(|q| Pairing {
            anchor: q.clone(),
            opponent: None,
        })
        .collect();
    let mut remaining: Vec<Qualifier> = seeded[bye_count..].to_vec();

    for matchup in matchups {
        let side_a = take_group(&mut remaining, matchup.group_a);
        let side_b = take_group(&mut remaining, matchup.group_b);
        let k = side_a.len().min(side_b.len());
        if side_a.len() != side_b.len() {
            log::warn!(
                "Seeding relaxed: matchup group {} ({}) vs group {} ({}) is uneven, {} left for automatic pairing",
                matchup.group_a + 1,
                side_a.len(),
                matchup.group_b + 1,
                side_b.len(),
                side_a.len().abs_diff(side_b.len())
            );
        }
        // Group A's i-th best against group B's i-th worst.
        for i in 0..k {
            pairings.push(ordered_pair(side_a[i].clone(), side_b[k - 1 - i].clone()));
        }
        remaining.extend(side_a.into_iter().skip(k));
        remaining.extend(side_b.into_iter().skip(k));
        remaining.sort_by_key(|q| q.seed);
    }

    while !remaining.is_empty() {
        let feasible = cross_pairing_feasible(&remaining);
        let anchor = remaining.remove(0);

        // Lowest-ranked cross-group opponent that keeps a full cross pairing possible.
        let keeps_feasible = remaining.iter().rposition(|c| {
            c.group_index != anchor.group_index && (!feasible || {
                let mut rest = remaining.clone();
                rest.retain(|q| q.player != c.player);
                cross_pairing_feasible(&rest)
            })
        });
        let cross = remaining
            .iter()
            .rposition(|c| c.group_index != anchor.group_index);
        let pick = match keeps_feasible.or(cross) {
            Some(idx) => idx,
            None => {
                let Some(last) = remaining.len().checked_sub(1) else {
                    log::warn!("Seeding relaxed: seed {} has no opponent left", anchor.seed);
                    break;
                };
                log::warn!(
                    "Seeding relaxed: no cross-group opponent left for seed {}, pairing within group {}",
                    anchor.seed,
                    anchor.group_index + 1
                );
                last
            }
        };
        let opponent = remaining.remove(pick);
        pairings.push(Pairing {
            anchor,
            opponent: Some(opponent),
        });
    }
    pairings
}

fn take_group(remaining: &mut Vec<Qualifier>, group_index: usize) -> Vec<Qualifier> {
    let (mut taken, rest): (Vec<_>, Vec<_>) = remaining
        .drain(..)
        .partition(|q| q.group_index == group_index);
    *remaining = rest;
    taken.sort_by_key(|q| q.group_rank);
    taken
}

fn ordered_pair(a: Qualifier, b: Qualifier) -> Pairing {
    if a.seed <= b.seed {
        Pairing {
            anchor: a,
            opponent: Some(b),
        }
    } else {
        Pairing {
            anchor: b,
            opponent: Some(a),
        }
    }
}

/// A perfect pairing with no same-group pair exists iff no group holds more than half.
fn cross_pairing_feasible(pool: &[Qualifier]) -> bool {
    let mut per_group: HashMap<usize, usize> = HashMap::new();
    for q in pool {
        *per_group.entry(q.group_index).or_default() += 1;
    }
    per_group.values().all(|&c| c * 2 <= pool.len())
}
