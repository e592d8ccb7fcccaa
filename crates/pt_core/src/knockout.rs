//! Knockout bracket generation, seeded by Day-1 rank.

use std::collections::BTreeMap;

use crate::categories::{band_members, cross_pairs};
use crate::models::{Category, GameMatch, KnockoutRound, MatchStage, Team, TeamId};

/// Band label → ordered match ids (quarterfinals first; band C also semis).
/// The matches themselves live in the history, which stays the single
/// source of truth for scores.
pub type BracketMap = BTreeMap<Category, Vec<String>>;

/// Build the knockout brackets once reclassification has settled the bands.
///
/// Bands A, AA, B, and BB get cross-seeded quarterfinals; a band with fewer
/// than two members produces no matches. Band C's quarterfinals were created
/// with the reclassification round and are already played, so their winners
/// are paired consecutively into semifinals here (an odd winner count leaves
/// the last winner waiting for the next round).
///
/// Returns the new matches to append to the history plus the bracket map
/// referencing every bracket match by id.
pub fn build_brackets(teams: &[Team], history: &[GameMatch]) -> (Vec<GameMatch>, BracketMap) {
    let mut new_matches = Vec::new();
    let mut brackets = BracketMap::new();

    for band in [Category::A, Category::AA, Category::B, Category::BB] {
        let members = band_members(teams, band);
        let mut ids = Vec::new();
        if members.len() >= 2 {
            for (i, (team1, team2)) in cross_pairs(&members).into_iter().enumerate() {
                let m = GameMatch::new(
                    format!("knockout-{band}-{i}"),
                    team1,
                    team2,
                    MatchStage::Knockout { band, round: KnockoutRound::QuarterFinal },
                );
                ids.push(m.id.clone());
                new_matches.push(m);
            }
        }
        brackets.insert(band, ids);
    }

    let mut ids = Vec::new();
    let mut winners: Vec<TeamId> = Vec::new();
    for m in history {
        if m.stage
            == (MatchStage::Knockout { band: Category::C, round: KnockoutRound::QuarterFinal })
        {
            ids.push(m.id.clone());
            if let Some(winner) = m.winner {
                winners.push(winner);
            }
        }
    }
    for (i, pair) in winners.chunks_exact(2).enumerate() {
        let m = GameMatch::new(
            format!("knockout-C-sf-{i}"),
            pair[0],
            pair[1],
            MatchStage::Knockout { band: Category::C, round: KnockoutRound::SemiFinal },
        );
        ids.push(m.id.clone());
        new_matches.push(m);
    }
    brackets.insert(Category::C, ids);

    (new_matches, brackets)
}
