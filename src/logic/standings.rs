//! Group standings, derived from completed matches only.

use crate::models::{Group, GroupId, MatchState, PlayerId, Tournament};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Record against one opponent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub wins: u32,
    pub losses: u32,
}

/// One row of a group table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player: PlayerId,
    pub group: GroupId,
    /// 1-based, unique within the group.
    pub rank: usize,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub legs_won: u32,
    pub legs_lost: u32,
    pub leg_difference: i64,
    pub head_to_head: BTreeMap<PlayerId, HeadToHead>,
}

impl Standing {
    fn empty(player: PlayerId, group: GroupId) -> Self {
        Self {
            player,
            group,
            rank: 0,
            played: 0,
            wins: 0,
            losses: 0,
            legs_won: 0,
            legs_lost: 0,
            leg_difference: 0,
            head_to_head: BTreeMap::new(),
        }
    }

    fn primary_key(&self) -> (Reverse<u32>, Reverse<i64>, Reverse<u32>) {
        (
            Reverse(self.wins),
            Reverse(self.leg_difference),
            Reverse(self.legs_won),
        )
    }

    fn h2h_wins_against(&self, opponent: PlayerId) -> u32 {
        self.head_to_head.get(&opponent).map_or(0, |h| h.wins)
    }
}

/// Compute the ranked table for a group.
///
/// Order: wins, leg difference, legs won (all descending). Two tied players who
/// played each other are split by that result; a block of three or more tied
/// players is split by head-to-head wins inside the block. Whatever is still
/// tied falls back to registration order, so ranks are always unique.
pub fn compute_standings(group: &Group) -> Vec<Standing> {
    let mut table: Vec<Standing> = group
        .members
        .iter()
        .map(|&p| Standing::empty(p, group.id))
        .collect();

    for m in group.matches.iter().filter(|m| m.state == MatchState::Completed) {
        let (Some(p1), Some(p2)) = (m.slot_1.player(), m.slot_2.player()) else {
            continue;
        };
        let winner = m.winner_id();
        for (me, opponent) in [(p1, p2), (p2, p1)] {
            let Some(row) = table.iter_mut().find(|s| s.player == me) else {
                continue;
            };
            let (won, lost) = m.legs_for(me).unwrap_or((0, 0));
            row.played += 1;
            row.legs_won += won;
            row.legs_lost += lost;
            let h2h = row.head_to_head.entry(opponent).or_default();
            if winner == Some(me) {
                row.wins += 1;
                h2h.wins += 1;
            } else {
                row.losses += 1;
                h2h.losses += 1;
            }
        }
    }
    for row in &mut table {
        row.leg_difference = i64::from(row.legs_won) - i64::from(row.legs_lost);
    }

    // Stable sort: equal primary keys stay in registration order.
    table.sort_by_key(Standing::primary_key);

    let mut start = 0;
    while start < table.len() {
        let key = table[start].primary_key();
        let end = start + table[start..].iter().take_while(|s| s.primary_key() == key).count();
        break_tie(&mut table[start..end]);
        start = end;
    }

    for (i, row) in table.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    table
}

fn break_tie(block: &mut [Standing]) {
    match block.len() {
        0 | 1 => {}
        2 => {
            let second = block[1].player;
            let first = block[0].player;
            if block[1].h2h_wins_against(first) > block[0].h2h_wins_against(second) {
                block.swap(0, 1);
            }
        }
        _ => {
            let ids: Vec<PlayerId> = block.iter().map(|s| s.player).collect();
            block.sort_by_key(|s| {
                let mini: u32 = ids.iter().map(|&o| s.h2h_wins_against(o)).sum();
                Reverse(mini)
            });
        }
    }
}

/// Standings of every group, in group order.
pub fn tournament_standings(tournament: &Tournament) -> Vec<Vec<Standing>> {
    tournament.groups.iter().map(compute_standings).collect()
}
