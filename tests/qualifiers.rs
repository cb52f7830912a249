mod common;

use common::{config, finish_group_stage, player_id, started, win};
use dart_tournament_engine::{
    compute_standings, group_qualifiers, select_qualifiers, AdvanceCount, GroupingMode,
    SeedingPolicy, TournamentError,
};

#[test]
fn qualifiers_need_a_finished_group_stage() {
    let mut t = started(
        8,
        config(GroupingMode::GroupCount(2), AdvanceCount::Top(2), SeedingPolicy::Standard),
    );
    match select_qualifiers(&t) {
        Err(TournamentError::IncompleteGroupStage { group, pending }) => {
            assert_eq!(group, "Group A");
            assert_eq!(pending, 6);
        }
        other => panic!("expected IncompleteGroupStage, got {other:?}"),
    }

    // Finish group A only: group B is now the one reported.
    let (p0, p2, p4, p6) = (
        player_id(&t, "P0"),
        player_id(&t, "P2"),
        player_id(&t, "P4"),
        player_id(&t, "P6"),
    );
    for (w, l) in [(p0, p2), (p0, p4), (p0, p6), (p2, p4), (p2, p6), (p4, p6)] {
        win(&mut t, w, l, 3, 1);
    }
    assert!(matches!(
        select_qualifiers(&t),
        Err(TournamentError::IncompleteGroupStage { ref group, pending: 6 }) if group == "Group B"
    ));
}

#[test]
fn top_two_from_each_group_in_group_major_order() {
    let mut t = started(
        8,
        config(GroupingMode::GroupCount(2), AdvanceCount::Top(2), SeedingPolicy::Standard),
    );
    finish_group_stage(&mut t);
    let qualifiers = select_qualifiers(&t).unwrap();

    let names: Vec<&str> = qualifiers
        .iter()
        .map(|q| t.player(q.player).unwrap().name.as_str())
        .collect();
    // Players are dealt alternately: group A holds P0, P2, P4, P6.
    assert_eq!(names, vec!["P0", "P2", "P1", "P3"]);
    let provenance: Vec<(usize, usize, usize)> = qualifiers
        .iter()
        .map(|q| (q.seed, q.group_index, q.group_rank))
        .collect();
    assert_eq!(provenance, vec![(1, 0, 1), (2, 0, 2), (3, 1, 1), (4, 1, 2)]);
    assert_eq!(qualifiers[0].group, t.groups[0].id);
    assert_eq!(qualifiers[3].group, t.groups[1].id);
}

#[test]
fn advance_count_above_group_size_takes_everyone() {
    let mut t = started(
        7,
        config(GroupingMode::GroupCount(2), AdvanceCount::Top(10), SeedingPolicy::Standard),
    );
    finish_group_stage(&mut t);
    let qualifiers = select_qualifiers(&t).unwrap();
    assert_eq!(qualifiers.len(), 7);
    let seeds: Vec<usize> = qualifiers.iter().map(|q| q.seed).collect();
    assert_eq!(seeds, (1..=7).collect::<Vec<_>>());
}

#[test]
fn all_advances_every_member() {
    let mut t = started(
        9,
        config(GroupingMode::GroupCount(3), AdvanceCount::All, SeedingPolicy::Standard),
    );
    finish_group_stage(&mut t);
    let qualifiers = select_qualifiers(&t).unwrap();
    assert_eq!(qualifiers.len(), 9);
    for (g, group) in t.groups.iter().enumerate() {
        let ranks: Vec<usize> = qualifiers
            .iter()
            .filter(|q| q.group_index == g)
            .map(|q| q.group_rank)
            .collect();
        assert_eq!(ranks, vec![1, 2, 3], "{}", group.name);
    }
}

#[test]
fn group_qualifiers_follow_rank_order() {
    let mut t = started(
        4,
        config(GroupingMode::GroupCount(1), AdvanceCount::Top(2), SeedingPolicy::Standard),
    );
    let [a, b, c, d] = ["P0", "P1", "P2", "P3"].map(|n| player_id(&t, n));
    win(&mut t, d, a, 3, 0);
    win(&mut t, d, b, 3, 0);
    win(&mut t, d, c, 3, 0);
    win(&mut t, c, a, 3, 0);
    win(&mut t, c, b, 3, 0);
    win(&mut t, b, a, 3, 0);

    let standings = compute_standings(&t.groups[0]);
    let top: Vec<_> = group_qualifiers(&standings, AdvanceCount::Top(2))
        .iter()
        .map(|s| s.player)
        .collect();
    assert_eq!(top, vec![d, c]);
    assert_eq!(group_qualifiers(&standings, AdvanceCount::All).len(), 4);
    assert!(group_qualifiers(&standings, AdvanceCount::Top(0)).is_empty());
}
