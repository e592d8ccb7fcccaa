pub mod json_api;

pub use json_api::{
    brackets_json, build_brackets_json, finish_qualification_json, generate_round_json,
    init_tournament_json, record_result_json, reset_json, rollback_round_json, save_roster_json,
    standings_json, start_reclassification_json, InitRequest, MatchView, RecordResultRequest,
    RosterRequest, ScoreInput,
};
