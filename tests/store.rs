//! Concurrency tests for the tournament store.

mod common;

use common::{clean_win, config, finish_group_stage};
use dart_tournament_engine::{
    authorize, complete_match, reset_match, start_playoffs, start_tournament, AdminAction,
    AdvanceCount, CompletionOutcome, GroupingMode, SeedingPolicy, Side, StaticAdmins,
    TournamentConfig, TournamentError, TournamentId, TournamentStore,
};
use std::sync::Arc;
use std::time::Duration;

fn league() -> TournamentConfig {
    config(GroupingMode::GroupCount(2), AdvanceCount::Top(2), SeedingPolicy::Standard)
}

fn registered(store: &TournamentStore, players: usize) -> TournamentId {
    let id = store.create("Pub League", league()).unwrap().id;
    store
        .mutate(id, |e| {
            for i in 0..players {
                e.tournament.add_player(format!("P{i}"))?;
            }
            Ok(())
        })
        .unwrap();
    id
}

fn ready_for_playoffs(store: &TournamentStore) -> TournamentId {
    let id = registered(store, 8);
    store
        .mutate(id, |e| {
            start_tournament(&mut e.tournament)?;
            finish_group_stage(&mut e.tournament);
            Ok(())
        })
        .unwrap();
    id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_playoff_starts_build_one_bracket() {
    let store = Arc::new(TournamentStore::new());
    let id = ready_for_playoffs(&store);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::task::spawn_blocking(move || {
            store.mutate(id, |e| start_playoffs(&mut e.tournament).map(|b| b.rounds[0].matches[0].id))
        }));
    }
    let mut built = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(first_match) => built.push(first_match),
            Err(TournamentError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(built.len(), 1);
    assert_eq!(conflicts, 7);

    let t = store.snapshot(id).unwrap();
    assert_eq!(t.bracket.unwrap().rounds[0].matches[0].id, built[0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_completions_apply_once() {
    let store = Arc::new(TournamentStore::new());
    let id = ready_for_playoffs(&store);
    let match_id = store
        .mutate(id, |e| start_playoffs(&mut e.tournament).map(|b| b.rounds[0].matches[0].id))
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let store = Arc::clone(&store);
        handles.push(tokio::task::spawn_blocking(move || {
            store.mutate(id, |e| {
                let result = clean_win(&e.tournament, Side::Two);
                complete_match(&mut e.tournament, match_id, result)
            })
        }));
    }
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }
    let applied = outcomes
        .iter()
        .filter(|&&o| o == CompletionOutcome::Completed)
        .count();
    assert_eq!(applied, 1);
    assert_eq!(outcomes.len() - applied, 5);

    let t = store.snapshot(id).unwrap();
    let m = t.find_match(match_id).unwrap();
    assert_eq!((m.legs_1, m.legs_2), (0, 3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tournaments_do_not_interfere() {
    let store = Arc::new(TournamentStore::new());
    let ids: Vec<TournamentId> = (0..4).map(|_| registered(&store, 6)).collect();

    let mut handles = Vec::new();
    for &id in &ids {
        let store = Arc::clone(&store);
        handles.push(tokio::task::spawn_blocking(move || {
            store.mutate(id, |e| {
                start_tournament(&mut e.tournament)?;
                finish_group_stage(&mut e.tournament);
                start_playoffs(&mut e.tournament).map(|b| b.size)
            })
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 4);
    }
    assert_eq!(store.len(), 4);
    for id in ids {
        let t = store.snapshot(id).unwrap();
        assert_eq!(t.players.len(), 6);
        assert!(t.bracket.is_some());
    }
}

#[test]
fn failed_mutation_is_not_committed() {
    let store = TournamentStore::new();
    let id = registered(&store, 3);
    let err = store
        .mutate(id, |e| {
            e.tournament.add_player("Late Entry")?;
            e.tournament.add_player("p0")?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, TournamentError::DuplicatePlayerName(_)));
    assert_eq!(store.read(id, |e| e.tournament.players.len()).unwrap(), 3);
}

#[test]
fn create_validates_name_and_configuration() {
    let store = TournamentStore::new();
    assert!(matches!(
        store.create("  ", TournamentConfig::default()),
        Err(TournamentError::Configuration(_))
    ));
    let broken = TournamentConfig {
        legs_to_win: 0,
        ..TournamentConfig::default()
    };
    assert!(matches!(
        store.create("Cup", broken),
        Err(TournamentError::Configuration(_))
    ));
    assert!(store.is_empty());

    let t = store.create(" Cup ", TournamentConfig::default()).unwrap();
    assert_eq!(t.name, "Cup");
    assert!(store.contains(t.id));
    assert!(matches!(store.insert(t), Err(TournamentError::Conflict(_))));
}

#[test]
fn admin_corrections_go_through_the_entry_audit_trail() {
    let store = TournamentStore::new();
    let id = ready_for_playoffs(&store);
    let cap = authorize(&StaticAdmins::from_list("referee"), "referee").unwrap();
    let group_match = store
        .read(id, |e| e.tournament.groups[0].matches[0].id)
        .unwrap();

    store
        .mutate(id, |e| reset_match(&mut e.tournament, &cap, &mut e.audit, group_match))
        .unwrap();
    let audit_len = store.read(id, |e| e.audit.len()).unwrap();
    assert_eq!(audit_len, 1);

    // A failed admin call leaves no audit record behind.
    assert!(store
        .mutate(id, |e| reset_match(&mut e.tournament, &cap, &mut e.audit, uuid::Uuid::new_v4()))
        .is_err());
    assert_eq!(store.read(id, |e| e.audit.len()).unwrap(), 1);
}

#[test]
fn delete_removes_everything() {
    let store = TournamentStore::new();
    let id = registered(&store, 4);
    let cap = authorize(&StaticAdmins::from_list("referee"), "referee").unwrap();
    let record = store.delete(id, &cap).unwrap();
    assert_eq!(record.action, AdminAction::DeleteTournament);
    assert_eq!(record.tournament, id);
    assert_eq!(record.before["players"], 4);

    assert!(!store.contains(id));
    assert!(matches!(
        store.snapshot(id),
        Err(TournamentError::TournamentNotFound(missing)) if missing == id
    ));
    assert!(matches!(
        store.delete(id, &cap),
        Err(TournamentError::TournamentNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_racing_with_writers_loses_no_committed_write() {
    let store = Arc::new(TournamentStore::new());
    let id = registered(&store, 2);
    let cap = authorize(&StaticAdmins::from_list("referee"), "referee").unwrap();

    let mut writers = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        writers.push(tokio::task::spawn_blocking(move || {
            store.mutate(id, |e| e.tournament.add_player(format!("Walk-in {i}")).map(|_| ()))
        }));
    }
    let deleter = {
        let store = Arc::clone(&store);
        tokio::task::spawn_blocking(move || store.delete(id, &cap))
    };

    let mut committed = 0;
    for writer in writers {
        match writer.await.unwrap() {
            Ok(()) => committed += 1,
            Err(TournamentError::TournamentNotFound(missing)) => assert_eq!(missing, id),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    let record = deleter.await.unwrap().unwrap();
    // Every write reported as committed is part of the deleted state.
    assert_eq!(record.before["players"], 2 + committed);

    assert!(matches!(
        store.mutate(id, |e| e.tournament.add_player("Too Late").map(|_| ())),
        Err(TournamentError::TournamentNotFound(_))
    ));
}

#[test]
fn purge_drops_only_idle_tournaments() {
    let store = TournamentStore::new();
    registered(&store, 2);
    registered(&store, 2);
    assert_eq!(store.purge_inactive(Duration::from_secs(3600)), 0);
    assert_eq!(store.len(), 2);
    assert_eq!(store.purge_inactive(Duration::ZERO), 2);
    assert!(store.is_empty());
}
