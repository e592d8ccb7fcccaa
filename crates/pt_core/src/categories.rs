//! Day-1 category assignment and the reclassification round.

use serde::{Deserialize, Serialize};

use crate::models::{Category, GameMatch, KnockoutRound, MatchStage, Team, TeamId};
use crate::standings;
use crate::tournament::TournamentPhase;

/// Band thresholds applied to the Day-1 ranking: the first `first` ranks
/// become band A, the next `second` band B, the remainder band C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySplit {
    pub first: usize,
    pub second: usize,
}

impl CategorySplit {
    /// The standard 40-team split: 16 / 16 / remainder.
    pub const STANDARD: CategorySplit = CategorySplit { first: 16, second: 16 };

    /// Thresholds for a roster of `n` teams.
    ///
    /// Rosters near the standard 40 keep the fixed 16/16/rest convention;
    /// smaller ones scale the same 40/40/20 shape, rounded down to even band
    /// sizes so reclassification can cross-pair a whole band.
    pub fn for_roster(n: usize) -> Self {
        if n >= 36 {
            Self::STANDARD
        } else {
            let band = (n * 2 / 5) & !1;
            CategorySplit { first: band, second: band }
        }
    }

    pub fn category_for_rank(&self, rank_index: usize) -> Category {
        if rank_index < self.first {
            Category::A
        } else if rank_index < self.first + self.second {
            Category::B
        } else {
            Category::C
        }
    }
}

impl Default for CategorySplit {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Assign Day-1 categories and 1-based ranks from the final Swiss standings.
pub fn assign_categories(teams: &mut [Team], split: CategorySplit) {
    let order: Vec<TeamId> =
        standings::rank(teams, TournamentPhase::Swiss).iter().map(|t| t.id).collect();
    for (idx, id) in order.iter().enumerate() {
        if let Some(team) = teams.iter_mut().find(|t| t.id == *id) {
            team.category = Some(split.category_for_rank(idx));
            team.day1_rank = (idx + 1) as u32;
        }
    }
}

/// Members of one band, sorted by Day-1 rank ascending.
pub(crate) fn band_members(teams: &[Team], band: Category) -> Vec<&Team> {
    let mut members: Vec<&Team> =
        teams.iter().filter(|t| t.category == Some(band)).collect();
    members.sort_by_key(|t| t.day1_rank);
    members
}

/// Cross-pair a rank-sorted band: best vs worst, second vs second-worst.
/// An odd band leaves its middle member without a match.
pub(crate) fn cross_pairs(members: &[&Team]) -> Vec<(TeamId, TeamId)> {
    let n = members.len();
    (0..n / 2).map(|i| (members[i].id, members[n - 1 - i].id)).collect()
}

/// Build the reclassification round.
///
/// Bands A and B each play one best-vs-worst match that splits them into
/// upper/lower sub-bands. Band C plays no reclassification match; its
/// knockout quarterfinals are created here instead, alongside the rest of
/// the round.
pub fn build_reclassification_matches(teams: &[Team]) -> Vec<GameMatch> {
    let mut matches = Vec::new();
    for band in [Category::A, Category::B] {
        let members = band_members(teams, band);
        for (i, (team1, team2)) in cross_pairs(&members).into_iter().enumerate() {
            matches.push(GameMatch::new(
                format!("reclass-{band}-{i}"),
                team1,
                team2,
                MatchStage::Reclassification { band },
            ));
        }
    }

    let members = band_members(teams, Category::C);
    for (i, (team1, team2)) in cross_pairs(&members).into_iter().enumerate() {
        matches.push(GameMatch::new(
            format!("knockout-C-{i}"),
            team1,
            team2,
            MatchStage::Knockout { band: Category::C, round: KnockoutRound::QuarterFinal },
        ));
    }
    matches
}
