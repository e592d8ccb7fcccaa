use std::fmt;

use serde::{Deserialize, Serialize};

use super::team::{Category, TeamId};

/// Which stage of the tournament a match belongs to.
///
/// A tagged variant instead of loose optional round/category fields: the
/// stage is what round filtering, rollback, and reclassification key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchStage {
    Swiss { round: u32 },
    Reclassification { band: Category },
    Knockout { band: Category, round: KnockoutRound },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockoutRound {
    QuarterFinal,
    SemiFinal,
}

impl MatchStage {
    pub fn is_reclassification(&self) -> bool {
        matches!(self, MatchStage::Reclassification { .. })
    }

    /// Display label for grouping matches in a UI.
    pub fn round_label(&self) -> String {
        match self {
            MatchStage::Swiss { round } => format!("Round {round}"),
            MatchStage::Reclassification { band } => format!("Reclassification {band}"),
            MatchStage::Knockout { band, round: KnockoutRound::QuarterFinal } => {
                format!("Quarter-finals {band}")
            }
            MatchStage::Knockout { band, round: KnockoutRound::SemiFinal } => {
                format!("Semi-finals {band}")
            }
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.round_label())
    }
}

/// A single match record.
///
/// Teams are referenced by id; the `Team` entries in the working set stay the
/// source of truth for everything beyond who played and what the score was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMatch {
    /// Encodes stage, round, and sequence (`swiss-3-2`, `reclass-A-0`,
    /// `knockout-C-sf-1`); result recording addresses matches by this id.
    pub id: String,
    pub team1: TeamId,
    pub team2: TeamId,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub winner: Option<TeamId>,
    pub played: bool,
    pub stage: MatchStage,
}

impl GameMatch {
    pub fn new(id: String, team1: TeamId, team2: TeamId, stage: MatchStage) -> Self {
        Self { id, team1, team2, score1: None, score2: None, winner: None, played: false, stage }
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.team1 == team || self.team2 == team
    }

    /// The other side of this match, if `team` played in it.
    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if self.team1 == team {
            Some(self.team2)
        } else if self.team2 == team {
            Some(self.team1)
        } else {
            None
        }
    }

    pub fn swiss_round(&self) -> Option<u32> {
        match self.stage {
            MatchStage::Swiss { round } => Some(round),
            _ => None,
        }
    }
}
