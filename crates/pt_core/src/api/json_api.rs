//! JSON API for the tournament front end.
//!
//! String-in/string-out endpoints over the global engine state. Every
//! request carries a `schema_version`; errors come back as `CODE: message`
//! strings so the UI can match on the code.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::EngineError;
use crate::export;
use crate::models::{Category, GameMatch, RegisteredTeam, MAX_TEAMS};
use crate::state;
use crate::tournament::Tournament;

pub const API_SCHEMA_VERSION: u8 = 1;

mod error_codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const INVALID_SCORE: &str = "INVALID_SCORE";
    pub const EMPTY_ROSTER: &str = "EMPTY_ROSTER";
    pub const NOT_INITIALIZED: &str = "NOT_INITIALIZED";
    pub const ENGINE: &str = "ENGINE";
}

fn err_code(code: &str, message: impl std::fmt::Display) -> String {
    format!("{code}: {message}")
}

fn engine_err(err: EngineError) -> String {
    err_code(error_codes::ENGINE, err)
}

fn parse_request<'a, T: Deserialize<'a>>(request_json: &'a str) -> Result<T, String> {
    serde_json::from_str(request_json).map_err(|e| err_code(error_codes::INVALID_REQUEST, e))
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RosterRequest {
    pub schema_version: u8,
    pub teams: Vec<RegisteredTeam>,
}

#[derive(Debug, Deserialize)]
pub struct InitRequest {
    pub schema_version: u8,
    /// Shuffle seed for round 1; defaults to 0.
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Deserialize)]
pub struct BasicRequest {
    pub schema_version: u8,
}

#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub schema_version: u8,
    pub match_id: String,
    pub score1: ScoreInput,
    pub score2: ScoreInput,
}

/// Score input: the raw text of the UI's score field, or an already numeric
/// value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScoreInput {
    Number(u32),
    Text(String),
}

impl ScoreInput {
    fn parse(&self) -> Result<u32, String> {
        match self {
            ScoreInput::Number(n) => Ok(*n),
            ScoreInput::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(err_code(error_codes::INVALID_SCORE, "score is blank"));
                }
                trimmed.parse::<u32>().map_err(|_| {
                    err_code(
                        error_codes::INVALID_SCORE,
                        format!("score '{trimmed}' is not a number"),
                    )
                })
            }
        }
    }
}

// ============================================================================
// Views
// ============================================================================

/// Match record resolved for display: ids plus team names.
#[derive(Debug, Serialize)]
pub struct MatchView {
    pub id: String,
    pub team1: String,
    pub team1_name: String,
    pub team2: String,
    pub team2_name: String,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub winner_name: Option<String>,
    pub played: bool,
    pub round_label: String,
}

impl MatchView {
    fn build(m: &GameMatch, tournament: &Tournament) -> Self {
        let name_of = |id| {
            tournament
                .team(id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        Self {
            id: m.id.clone(),
            team1: m.team1.to_string(),
            team1_name: name_of(m.team1),
            team2: m.team2.to_string(),
            team2_name: name_of(m.team2),
            score1: m.score1,
            score2: m.score2,
            winner_name: m.winner.map(name_of),
            played: m.played,
            round_label: m.stage.round_label(),
        }
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Store the registered roster. At least one team, at most the registration
/// cap; every entry must validate.
pub fn save_roster_json(request_json: &str) -> Result<String, String> {
    let request: RosterRequest = parse_request(request_json)?;
    if request.teams.is_empty() {
        return Err(err_code(error_codes::EMPTY_ROSTER, "register at least one team"));
    }
    if request.teams.len() > MAX_TEAMS {
        return Err(err_code(
            error_codes::INVALID_REQUEST,
            format!("at most {MAX_TEAMS} teams can register"),
        ));
    }
    for team in &request.teams {
        team.validate().map_err(|e| err_code(error_codes::INVALID_REQUEST, e))?;
    }

    let mut state = state::get_state_mut();
    let count = request.teams.len();
    state.roster = request.teams;
    Ok(json!({ "schema_version": API_SCHEMA_VERSION, "team_count": count }).to_string())
}

/// Adopt the stored roster into a new Swiss-phase tournament.
pub fn init_tournament_json(request_json: &str) -> Result<String, String> {
    let request: InitRequest = parse_request(request_json)?;
    let mut state = state::get_state_mut();
    let tournament = Tournament::from_roster(&state.roster, request.seed).map_err(engine_err)?;
    let team_count = tournament.teams.len();
    state.tournament = Some(tournament);
    Ok(json!({
        "schema_version": API_SCHEMA_VERSION,
        "phase": "swiss",
        "team_count": team_count,
    })
    .to_string())
}

/// Generate the next Swiss round and return its pairings.
pub fn generate_round_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    let mut state = state::get_state_mut();
    let tournament = state
        .tournament
        .as_mut()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    let round = tournament.generate_next_round().map_err(engine_err)?;
    let matches: Vec<MatchView> = tournament
        .round_matches(round)
        .into_iter()
        .map(|m| MatchView::build(m, tournament))
        .collect();
    let bye_name = tournament.bye_team.and_then(|id| tournament.team(id)).map(|t| t.name.clone());

    Ok(json!({
        "schema_version": API_SCHEMA_VERSION,
        "round": round,
        "bye_team": bye_name,
        "matches": matches,
    })
    .to_string())
}

/// Record (or correct) a match result. Blank or non-numeric score text is
/// rejected here, ties by the engine.
pub fn record_result_json(request_json: &str) -> Result<String, String> {
    let request: RecordResultRequest = parse_request(request_json)?;
    let score1 = request.score1.parse()?;
    let score2 = request.score2.parse()?;

    let mut state = state::get_state_mut();
    let tournament = state
        .tournament
        .as_mut()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    tournament.record_result(&request.match_id, score1, score2).map_err(engine_err)?;
    let view = tournament
        .match_by_id(&request.match_id)
        .map(|m| MatchView::build(m, tournament));

    Ok(json!({ "schema_version": API_SCHEMA_VERSION, "match": view }).to_string())
}

/// Revert the Swiss phase to the previous round.
pub fn rollback_round_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    let mut state = state::get_state_mut();
    let tournament = state
        .tournament
        .as_mut()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    tournament.rollback_round().map_err(engine_err)?;
    Ok(json!({
        "schema_version": API_SCHEMA_VERSION,
        "round": tournament.current_round,
    })
    .to_string())
}

/// Close qualification: assign Day-1 categories and ranks.
pub fn finish_qualification_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    let mut state = state::get_state_mut();
    let tournament = state
        .tournament
        .as_mut()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    tournament.finish_qualification().map_err(engine_err)?;
    Ok(json!({
        "schema_version": API_SCHEMA_VERSION,
        "phase": tournament.phase.to_string(),
    })
    .to_string())
}

/// Start the reclassification round; returns its matches.
pub fn start_reclassification_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    let mut state = state::get_state_mut();
    let tournament = state
        .tournament
        .as_mut()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    tournament.start_reclassification().map_err(engine_err)?;
    let matches: Vec<MatchView> = tournament
        .unplayed_matches()
        .into_iter()
        .map(|m| MatchView::build(m, tournament))
        .collect();

    Ok(json!({
        "schema_version": API_SCHEMA_VERSION,
        "phase": tournament.phase.to_string(),
        "matches": matches,
    })
    .to_string())
}

/// Build the knockout brackets; returns the bracket view.
pub fn build_brackets_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    let mut state = state::get_state_mut();
    let tournament = state
        .tournament
        .as_mut()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    tournament.build_knockout_brackets().map_err(engine_err)?;
    Ok(brackets_view(tournament))
}

/// Current standings as export rows.
pub fn standings_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    let state = state::get_state();
    let tournament = state
        .tournament
        .as_ref()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    let rows = export::standings_rows(tournament);
    Ok(json!({ "schema_version": API_SCHEMA_VERSION, "standings": rows }).to_string())
}

/// Current bracket structure, band by band.
pub fn brackets_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    let state = state::get_state();
    let tournament = state
        .tournament
        .as_ref()
        .ok_or_else(|| err_code(error_codes::NOT_INITIALIZED, "tournament not started"))?;

    Ok(brackets_view(tournament))
}

/// The reset signal: discard all engine state.
pub fn reset_json(request_json: &str) -> Result<String, String> {
    let _request: BasicRequest = parse_request(request_json)?;
    state::reset_state();
    Ok(json!({ "schema_version": API_SCHEMA_VERSION, "reset": true }).to_string())
}

fn brackets_view(tournament: &Tournament) -> String {
    let mut bands = serde_json::Map::new();
    for band in Category::ALL {
        let matches: Vec<MatchView> = tournament
            .bracket_matches(band)
            .into_iter()
            .map(|m| MatchView::build(m, tournament))
            .collect();
        bands.insert(band.to_string(), json!(matches));
    }
    json!({
        "schema_version": API_SCHEMA_VERSION,
        "phase": tournament.phase.to_string(),
        "brackets": bands,
    })
    .to_string()
}
