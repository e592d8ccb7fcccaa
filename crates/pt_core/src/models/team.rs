use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roster::RegisteredTeam;

/// Unique identifier for a team.
pub type TeamId = Uuid;

/// Skill band assigned after the qualification day.
///
/// Variant order is the bracket seeding order (A before AA before B and so
/// on); `Ord` relies on it, so do not reorder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    A,
    AA,
    B,
    BB,
    C,
}

impl Category {
    /// All bands in seeding order.
    pub const ALL: [Category; 5] =
        [Category::A, Category::AA, Category::B, Category::BB, Category::C];

    /// The Day-1 band this sub-band descends from (AA was seeded as A, BB as B).
    pub fn base_band(self) -> Category {
        match self {
            Category::AA => Category::A,
            Category::BB => Category::B,
            other => other,
        }
    }

    /// The lower sub-band a reclassification loss drops into. C has no lower band.
    pub fn demoted(self) -> Category {
        match self {
            Category::A => Category::AA,
            Category::B => Category::BB,
            other => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::A => "A",
            Category::AA => "AA",
            Category::B => "B",
            Category::BB => "BB",
            Category::C => "C",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A competing team and its derived tournament statistics.
///
/// Everything below `attended` is derived from the match history plus the
/// bye ledger. `Tournament` refreshes these fields by refolding the history;
/// they are never edited by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub captain: String,
    /// Player names, 1 to 4 entries.
    pub players: Vec<String>,
    pub attended: bool,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
    pub score_difference: i32,
    /// Tie-break metric: points plus cumulative score difference.
    pub coefficient: i32,
    pub past_opponents: HashSet<TeamId>,
    pub received_bye: bool,
    pub category: Option<Category>,
    /// 1-based qualification rank; 0 until categories are assigned.
    pub day1_rank: u32,
}

impl Team {
    /// Adopt a roster entry into the working set with zeroed statistics.
    pub fn from_registered(reg: &RegisteredTeam) -> Self {
        Self {
            id: reg.id,
            name: reg.name.clone(),
            captain: reg.captain.clone(),
            players: reg.player_names(),
            attended: reg.attended,
            wins: 0,
            losses: 0,
            points: 0,
            score_difference: 0,
            coefficient: 0,
            past_opponents: HashSet::new(),
            received_bye: false,
            category: None,
            day1_rank: 0,
        }
    }
}
