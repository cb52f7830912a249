//! In-memory tournament store with one lock per tournament.
//!
//! The map lock is only held to look up, insert or remove a handle, so work on
//! different tournaments never waits on each other. Mutations on one tournament
//! are serialized by its write lock and run against a copy that is committed
//! only on success; readers see the last committed state. A removed tournament's
//! entry is emptied under its write lock, so callers still holding the handle get
//! `TournamentNotFound` instead of writing into a detached copy.

use crate::logic::{AdminAction, AdminCapability, AuditEntry, AuditLog};
use crate::models::{Tournament, TournamentConfig, TournamentError, TournamentId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Per-tournament state: tournament data plus its admin audit trail.
#[derive(Clone, Debug)]
pub struct TournamentEntry {
    pub tournament: Tournament,
    pub audit: AuditLog,
}

struct TournamentSlot {
    /// `None` once the tournament was deleted or purged.
    entry: RwLock<Option<TournamentEntry>>,
    /// Last access time (for auto-cleanup).
    last_activity: Mutex<Instant>,
}

impl TournamentSlot {
    fn touch(&self) {
        if let Ok(mut at) = self.last_activity.lock() {
            *at = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|at| at.elapsed())
            .unwrap_or_default()
    }

    /// Empty the entry, waiting for an in-flight mutation to commit first.
    fn detach(&self) -> Option<TournamentEntry> {
        match self.entry.write() {
            Ok(mut entry) => entry.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

#[derive(Default)]
pub struct TournamentStore {
    tournaments: RwLock<HashMap<TournamentId, Arc<TournamentSlot>>>,
}

impl TournamentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and register a new tournament in Registration.
    pub fn create(
        &self,
        name: impl Into<String>,
        config: TournamentConfig,
    ) -> Result<Tournament, TournamentError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::Configuration("tournament name is empty".into()));
        }
        config.validate()?;
        let tournament = Tournament::new(name, config);
        self.insert(tournament.clone())?;
        log::info!("Created tournament {} '{}'", tournament.id, tournament.name);
        Ok(tournament)
    }

    /// Add an existing tournament. An id already present is a conflict.
    pub fn insert(&self, tournament: Tournament) -> Result<TournamentId, TournamentError> {
        let id = tournament.id;
        let mut map = self
            .tournaments
            .write()
            .map_err(|_| TournamentError::LockPoisoned)?;
        if map.contains_key(&id) {
            return Err(TournamentError::Conflict(format!("tournament {} already exists", id)));
        }
        map.insert(
            id,
            Arc::new(TournamentSlot {
                entry: RwLock::new(Some(TournamentEntry {
                    tournament,
                    audit: AuditLog::default(),
                })),
                last_activity: Mutex::new(Instant::now()),
            }),
        );
        Ok(id)
    }

    fn slot(&self, id: TournamentId) -> Result<Arc<TournamentSlot>, TournamentError> {
        let map = self
            .tournaments
            .read()
            .map_err(|_| TournamentError::LockPoisoned)?;
        let slot = map
            .get(&id)
            .cloned()
            .ok_or(TournamentError::TournamentNotFound(id))?;
        slot.touch();
        Ok(slot)
    }

    /// Run `f` against the last committed state. Concurrent readers don't block each other.
    pub fn read<R>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&TournamentEntry) -> R,
    ) -> Result<R, TournamentError> {
        let slot = self.slot(id)?;
        let entry = slot.entry.read().map_err(|_| TournamentError::LockPoisoned)?;
        let entry = entry.as_ref().ok_or(TournamentError::TournamentNotFound(id))?;
        Ok(f(entry))
    }

    pub fn snapshot(&self, id: TournamentId) -> Result<Tournament, TournamentError> {
        self.read(id, |e| e.tournament.clone())
    }

    /// Apply one serialized mutation. On error nothing is committed.
    pub fn mutate<R>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&mut TournamentEntry) -> Result<R, TournamentError>,
    ) -> Result<R, TournamentError> {
        let slot = self.slot(id)?;
        let mut guard = slot.entry.write().map_err(|_| TournamentError::LockPoisoned)?;
        let entry = guard.as_mut().ok_or(TournamentError::TournamentNotFound(id))?;
        let mut next = entry.clone();
        let out = f(&mut next)?;
        *entry = next;
        Ok(out)
    }

    /// Remove a tournament with its groups, bracket and audit trail.
    ///
    /// Waits for an in-flight mutation on it to finish; mutations that arrive
    /// later fail with `TournamentNotFound`. The returned entry is the last
    /// audit record of the tournament.
    pub fn delete(
        &self,
        id: TournamentId,
        capability: &AdminCapability,
    ) -> Result<AuditEntry, TournamentError> {
        let slot = {
            let mut map = self
                .tournaments
                .write()
                .map_err(|_| TournamentError::LockPoisoned)?;
            map.remove(&id).ok_or(TournamentError::TournamentNotFound(id))?
        };
        let entry = slot.detach().ok_or(TournamentError::TournamentNotFound(id))?;
        let before = serde_json::json!({
            "name": entry.tournament.name,
            "status": entry.tournament.status,
            "players": entry.tournament.players.len(),
            "audit_entries": entry.audit.len(),
        });
        let mut trail = entry.audit;
        let record = trail
            .record(AuditEntry::new(
                capability,
                id,
                AdminAction::DeleteTournament,
                before,
                serde_json::Value::Null,
            ))
            .clone();
        Ok(record)
    }

    pub fn contains(&self, id: TournamentId) -> bool {
        self.tournaments
            .read()
            .map(|map| map.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.tournaments.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop tournaments not accessed for `timeout`. Returns how many were removed.
    pub fn purge_inactive(&self, timeout: Duration) -> usize {
        let idle: Vec<Arc<TournamentSlot>> = {
            let Ok(mut map) = self.tournaments.write() else {
                return 0;
            };
            let ids: Vec<TournamentId> = map
                .iter()
                .filter(|(_, slot)| slot.idle_for() >= timeout)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| map.remove(id)).collect()
        };
        for slot in &idle {
            slot.detach();
        }
        idle.len()
    }
}
