//! Global Engine State
//!
//! Thread-safe holder for the engine's runtime state, used by the JSON API
//! layer to keep the working set between calls. The engine operations
//! themselves are methods on [`Tournament`] and never touch this module.

use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

use crate::models::RegisteredTeam;
use crate::store::TournamentSave;
use crate::tournament::Tournament;

/// Global engine state singleton
pub static ENGINE_STATE: Lazy<Arc<RwLock<EngineState>>> =
    Lazy::new(|| Arc::new(RwLock::new(EngineState::default())));

/// Runtime engine state: the registered roster and, once the Swiss phase has
/// been initialized, the working tournament. Convertible to and from
/// [`TournamentSave`] for persistence.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub roster: Vec<RegisteredTeam>,
    pub tournament: Option<Tournament>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert runtime state to the snapshot format.
    pub fn to_save(&self) -> TournamentSave {
        let mut save = TournamentSave::new();
        save.roster = self.roster.clone();
        save.tournament = self.tournament.clone();
        save
    }

    /// Restore runtime state from a snapshot.
    pub fn from_save(save: &TournamentSave) -> Self {
        Self { roster: save.roster.clone(), tournament: save.tournament.clone() }
    }
}

// ========================
// Global State Access Functions
// ========================

/// Get a read lock on the global engine state
pub fn get_state() -> std::sync::RwLockReadGuard<'static, EngineState> {
    ENGINE_STATE.read().expect("ENGINE_STATE lock poisoned")
}

/// Get a write lock on the global engine state
pub fn get_state_mut() -> std::sync::RwLockWriteGuard<'static, EngineState> {
    ENGINE_STATE.write().expect("ENGINE_STATE lock poisoned")
}

/// Reset the global state to default (the reset signal: back to an
/// uninitialized roster)
pub fn reset_state() {
    *ENGINE_STATE.write().expect("ENGINE_STATE lock poisoned") = EngineState::new();
}

/// Replace the entire global state
pub fn set_state(new_state: EngineState) {
    *ENGINE_STATE.write().expect("ENGINE_STATE lock poisoned") = new_state;
}
