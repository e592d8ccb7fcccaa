//! Standings export rows for the spreadsheet collaborator.

use serde::Serialize;

use crate::tournament::Tournament;

/// One row of the exported standings table.
#[derive(Debug, Clone, Serialize)]
pub struct StandingsRow {
    pub position: usize,
    pub team: String,
    pub captain: String,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
    /// Rendered with two decimal places, as the export sheet shows it.
    pub coefficient: String,
    /// Band label, or "N/A" before categories are assigned.
    pub category: String,
}

/// Snapshot the phase-appropriate ranking as export rows. Pure read; no
/// engine state is touched.
pub fn standings_rows(tournament: &Tournament) -> Vec<StandingsRow> {
    tournament
        .ranked_teams()
        .iter()
        .enumerate()
        .map(|(i, team)| StandingsRow {
            position: i + 1,
            team: team.name.clone(),
            captain: team.captain.clone(),
            wins: team.wins,
            losses: team.losses,
            points: team.points,
            coefficient: format!("{:.2}", team.coefficient as f64),
            category: team
                .category
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        })
        .collect()
}
