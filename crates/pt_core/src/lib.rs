//! # pt_core - Petanca Tournament Engine
//!
//! Pairing, standings, and phase progression for a multi-phase amateur
//! petanca tournament: a five-round Swiss qualification stage, a
//! reclassification round that splits the skill bands, and seeded
//! single-elimination knockout brackets.
//!
//! ## Features
//! - Deterministic pairing (same roster + seed + results = same rounds)
//! - Standings derived by refolding the match history, safe under result
//!   correction
//! - Explicit phase state machine with guarded one-shot transitions
//! - JSON API for easy integration with a UI front end

pub mod api;
pub mod categories;
pub mod error;
pub mod export;
pub mod knockout;
pub mod models;
pub mod pairing;
pub mod standings;
pub mod state;
pub mod store;
pub mod tournament;

// Re-export main API functions
pub use api::{
    brackets_json, build_brackets_json, finish_qualification_json, generate_round_json,
    init_tournament_json, record_result_json, reset_json, rollback_round_json, save_roster_json,
    standings_json, start_reclassification_json,
};
pub use error::{EngineError, Result};

// Re-export model types
pub use models::{
    Category, GameMatch, KnockoutRound, MatchStage, RegisteredTeam, Team, TeamId, MAX_TEAMS,
};

// Re-export the standings ledger
pub use standings::{rank, recompute_team_stats, TeamStats};

// Re-export the store
pub use store::{StoreError, StoreManager, TournamentSave, SAVE_VERSION};

// Re-export state management
pub use state::{get_state, get_state_mut, reset_state, set_state, EngineState, ENGINE_STATE};

// Re-export the aggregate
pub use categories::CategorySplit;
pub use export::{standings_rows, StandingsRow};
pub use knockout::BracketMap;
pub use tournament::{Tournament, TournamentPhase, BYE_SCORE_MARGIN, SWISS_ROUNDS};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
