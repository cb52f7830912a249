//! Integration tests for registration and the group stage: grouping and round-robin generation.

mod common;

use common::{config, started, tournament_with_players};
use dart_tournament_engine::{
    plan_group_sizes, round_robin_pairings, start_tournament, AdvanceCount, GroupingMode,
    MatchState, Player, SeedingPolicy, Slot, Stage, Tournament, TournamentConfig,
    TournamentError, TournamentStatus,
};
use std::collections::HashSet;

fn groups_of(count: usize) -> TournamentConfig {
    config(GroupingMode::GroupCount(count), AdvanceCount::Top(2), SeedingPolicy::Standard)
}

#[test]
fn round_robin_has_every_pair_exactly_once() {
    for n in 2..=12 {
        let pairings = round_robin_pairings(n);
        assert_eq!(pairings.len(), n * (n - 1) / 2, "n = {n}");
        let pairs: HashSet<(usize, usize)> = pairings.iter().map(|&(_, a, b)| (a, b)).collect();
        assert_eq!(pairs.len(), pairings.len(), "duplicate pair for n = {n}");
        assert!(pairings.iter().all(|&(_, a, b)| a < b && b < n));
    }
}

#[test]
fn round_robin_rounds_use_each_player_once() {
    for n in [4, 5, 7] {
        let pairings = round_robin_pairings(n);
        let rounds: HashSet<usize> = pairings.iter().map(|&(r, _, _)| r).collect();
        for round in rounds {
            let mut seen = HashSet::new();
            for &(_, a, b) in pairings.iter().filter(|&&(r, _, _)| r == round) {
                assert!(seen.insert(a) && seen.insert(b), "player twice in round {round}");
            }
        }
    }
}

#[test]
fn start_splits_players_evenly_into_groups() {
    let t = started(10, groups_of(3));
    assert_eq!(t.status, TournamentStatus::Active);
    let sizes: Vec<usize> = t.groups.iter().map(|g| g.members.len()).collect();
    assert_eq!(sizes, vec![4, 3, 3]);
    assert_eq!(t.groups[0].name, "Group A");
    assert_eq!(t.groups[2].name, "Group C");

    let mut everyone = HashSet::new();
    for g in &t.groups {
        for p in &g.members {
            assert!(everyone.insert(*p), "player in two groups");
        }
        let n = g.members.len();
        assert_eq!(g.matches.len(), n * (n - 1) / 2);
        for m in &g.matches {
            assert_eq!(m.state, MatchState::Pending);
            assert_eq!((m.legs_1, m.legs_2), (0, 0));
            assert!(m.winner.is_none());
            assert_ne!(m.slot_1, m.slot_2);
            assert!(matches!(m.stage, Stage::Group { group, .. } if group == g.id));
            assert!(matches!(m.slot_1, Slot::Player(p) if g.contains(p)));
            assert!(matches!(m.slot_2, Slot::Player(p) if g.contains(p)));
        }
    }
    assert_eq!(everyone.len(), 10);
}

#[test]
fn group_size_mode_derives_group_count() {
    assert_eq!(plan_group_sizes(GroupingMode::GroupSize(4), 10).unwrap(), vec![4, 3, 3]);
    assert_eq!(plan_group_sizes(GroupingMode::GroupSize(4), 8).unwrap(), vec![4, 4]);
    assert_eq!(plan_group_sizes(GroupingMode::GroupSize(5), 32).unwrap().len(), 7);
    let t = started(
        9,
        config(GroupingMode::GroupSize(3), AdvanceCount::All, SeedingPolicy::Standard),
    );
    assert_eq!(t.groups.len(), 3);
    assert!(t.groups.iter().all(|g| g.matches.len() == 3));
}

#[test]
fn group_smaller_than_two_is_a_configuration_error() {
    assert!(matches!(
        plan_group_sizes(GroupingMode::GroupCount(3), 5),
        Err(TournamentError::Configuration(_))
    ));
    assert!(matches!(
        plan_group_sizes(GroupingMode::GroupSize(2), 3),
        Err(TournamentError::Configuration(_))
    ));
    assert!(matches!(
        plan_group_sizes(GroupingMode::GroupCount(1), 1),
        Err(TournamentError::Configuration(_))
    ));

    let mut t = tournament_with_players(5, groups_of(3));
    assert!(matches!(
        start_tournament(&mut t),
        Err(TournamentError::Configuration(_))
    ));
    assert_eq!(t.status, TournamentStatus::Registration);
    assert!(t.groups.is_empty());
}

#[test]
fn groups_are_created_once() {
    let mut t = started(6, groups_of(2));
    let groups = t.groups.clone();
    assert!(matches!(
        start_tournament(&mut t),
        Err(TournamentError::InvalidState(_))
    ));
    assert_eq!(t.groups, groups);
}

#[test]
fn shuffled_groups_keep_sizes_and_registration_order() {
    let mut cfg = groups_of(4);
    cfg.shuffle_groups = true;
    let t = started(18, cfg);
    let sizes: Vec<usize> = t.groups.iter().map(|g| g.members.len()).collect();
    assert_eq!(sizes, vec![5, 5, 4, 4]);
    let index = |id: uuid::Uuid| t.players.iter().position(|p| p.id == id).unwrap();
    for g in &t.groups {
        let order: Vec<usize> = g.members.iter().map(|&p| index(p)).collect();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(order, sorted);
    }
}

#[test]
fn player_names_are_unique_and_registration_closes_on_start() {
    let mut t = Tournament::new("Club Night", TournamentConfig::default());
    let anna = t.add_player("  Anna ").unwrap();
    assert_eq!(t.player(anna).unwrap().name, "Anna");
    assert!(matches!(
        t.add_player("anna"),
        Err(TournamentError::DuplicatePlayerName(_))
    ));
    assert!(matches!(t.add_player("   "), Err(TournamentError::InvalidState(_))));
    t.add_player("Ben").unwrap();
    t.remove_player(anna).unwrap();
    t.add_player("Anna").unwrap();
    start_tournament(&mut t).unwrap();
    assert!(matches!(t.add_player("Cleo"), Err(TournamentError::InvalidState(_))));
    let ben = t.player_by_name("Ben").unwrap().id;
    assert!(matches!(t.remove_player(ben), Err(TournamentError::InvalidState(_))));
}

#[test]
fn initial_players_get_the_same_name_checks() {
    let anna = Player::new(" Anna  ");
    let anna_id = anna.id;
    let t = Tournament::with_players(
        "Club Night",
        vec![anna, Player::new("Ben")],
        TournamentConfig::default(),
    )
    .unwrap();
    assert_eq!(t.player(anna_id).unwrap().name, "Anna");
    assert_eq!(t.players.len(), 2);
    assert_eq!(t.status, TournamentStatus::Registration);

    let duplicate = vec![Player::new("Anna"), Player::new("ANNA ")];
    assert!(matches!(
        Tournament::with_players("Club Night", duplicate, TournamentConfig::default()),
        Err(TournamentError::DuplicatePlayerName(name)) if name == "ANNA"
    ));
    let blank = vec![Player::new("Anna"), Player::new("  ")];
    assert!(matches!(
        Tournament::with_players("Club Night", blank, TournamentConfig::default()),
        Err(TournamentError::InvalidState(_))
    ));
}

#[test]
fn csv_import_registers_players_in_file_order() {
    let mut t = Tournament::new("Club Night", TournamentConfig::default());
    t.add_player("Anna").unwrap();
    let csv = "name\nBen\nCleo\n  Dana  \n";
    let ids = t.import_players_csv(csv.as_bytes()).unwrap();
    assert_eq!(ids.len(), 3);
    let names: Vec<&str> = t.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Anna", "Ben", "Cleo", "Dana"]);

    let dup = "name\nEmil\nANNA\n";
    assert!(matches!(
        t.import_players_csv(dup.as_bytes()),
        Err(TournamentError::DuplicatePlayerName(_))
    ));
    assert_eq!(t.players.len(), 4, "failed import must not add anyone");
}
