//! Shared helpers for the integration tests.
#![allow(dead_code)]

use dart_tournament_engine::{
    complete_match, start_tournament, AdvanceCount, GroupingMode, MatchId, MatchResult,
    MatchState, Player, PlayerId, Qualifier, SeedingPolicy, Side, Tournament, TournamentConfig,
};
use uuid::Uuid;

pub fn config(grouping: GroupingMode, advance: AdvanceCount, seeding: SeedingPolicy) -> TournamentConfig {
    TournamentConfig {
        grouping,
        advance,
        seeding,
        ..TournamentConfig::default()
    }
}

pub fn tournament_with_players(n: usize, config: TournamentConfig) -> Tournament {
    let players: Vec<Player> = (0..n).map(|i| Player::new(format!("P{i}"))).collect();
    Tournament::with_players("Test Open", players, config).unwrap()
}

pub fn started(n: usize, config: TournamentConfig) -> Tournament {
    let mut t = tournament_with_players(n, config);
    start_tournament(&mut t).unwrap();
    t
}

pub fn player_id(t: &Tournament, name: &str) -> PlayerId {
    t.player_by_name(name).unwrap().id
}

/// Id of the group match between two players.
pub fn match_between(t: &Tournament, a: PlayerId, b: PlayerId) -> MatchId {
    t.groups
        .iter()
        .flat_map(|g| g.matches.iter())
        .find(|m| m.involves(a) && m.involves(b))
        .unwrap()
        .id
}

/// Complete the group match between `winner` and `loser` with the given legs.
pub fn win(t: &mut Tournament, winner: PlayerId, loser: PlayerId, winner_legs: u32, loser_legs: u32) {
    let id = match_between(t, winner, loser);
    let m = t.find_match(id).unwrap();
    let result = if m.slot_1.player() == Some(winner) {
        MatchResult::new(winner_legs, loser_legs)
    } else {
        MatchResult::new(loser_legs, winner_legs)
    };
    complete_match(t, id, result).unwrap();
}

/// Result where the given side wins to nil.
pub fn clean_win(t: &Tournament, side: Side) -> MatchResult {
    let target = t.config.legs_to_win;
    match side {
        Side::One => MatchResult::new(target, 0),
        Side::Two => MatchResult::new(0, target),
    }
}

/// Complete every group match with slot 1 (the earlier registered player) winning.
pub fn finish_group_stage(t: &mut Tournament) {
    let ids: Vec<MatchId> = t
        .groups
        .iter()
        .flat_map(|g| g.matches.iter())
        .filter(|m| m.state != MatchState::Completed)
        .map(|m| m.id)
        .collect();
    for id in ids {
        let result = clean_win(t, Side::One);
        complete_match(t, id, result).unwrap();
    }
}

/// Complete every ready match of a bracket round with the given side winning.
pub fn play_round(t: &mut Tournament, round: usize, side: Side) {
    let ids: Vec<MatchId> = t.bracket.as_ref().unwrap().rounds[round]
        .matches
        .iter()
        .filter(|m| m.is_ready() && m.state != MatchState::Completed)
        .map(|m| m.id)
        .collect();
    for id in ids {
        let result = clean_win(t, side);
        complete_match(t, id, result).unwrap();
    }
}

/// Synthetic qualifier; players get fresh ids, groups a fixed id per index.
pub fn qualifier(seed: usize, group_index: usize, group_rank: usize) -> Qualifier {
    Qualifier {
        player: Uuid::new_v4(),
        group: Uuid::from_u128(group_index as u128 + 1),
        group_index,
        group_rank,
        seed,
    }
}

/// Group-major qualifier list: `groups` groups with `per_group` qualifiers each.
pub fn group_major(groups: usize, per_group: usize) -> Vec<Qualifier> {
    let mut out = Vec::new();
    for g in 0..groups {
        for r in 1..=per_group {
            out.push(qualifier(out.len() + 1, g, r));
        }
    }
    out
}
