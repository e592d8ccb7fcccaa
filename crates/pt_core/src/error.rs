use std::fmt;

use uuid::Uuid;

use crate::tournament::TournamentPhase;

/// Errors produced by engine operations.
///
/// Every operation validates before mutating, so a returned error means the
/// tournament state is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Scores are equal; petanca has no draws.
    DrawNotAllowed { score: u32 },
    /// No match with this id exists in the history.
    MatchNotFound(String),
    /// No team with this id exists in the working set.
    TeamNotFound(Uuid),
    /// Fewer than two attended teams available for pairing.
    NotEnoughTeams { found: usize },
    /// Roster import contained no teams.
    EmptyRoster,
    /// Roster import exceeded the registration cap.
    RosterTooLarge { found: usize, max: usize },
    /// A roster entry failed validation.
    InvalidRosterEntry(String),
    /// Operation is not valid in the current phase.
    PhaseMismatch { expected: TournamentPhase, found: TournamentPhase },
    /// Outstanding unplayed matches block this step.
    RoundInProgress { unplayed: usize },
    /// The Swiss stage is capped at a fixed number of rounds.
    RoundLimitReached { limit: u32 },
    /// Qualification cannot close before the final Swiss round.
    SwissNotFinished { round: u32 },
    /// No round to roll back (Swiss round counter is zero).
    NothingToRollBack,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::DrawNotAllowed { score } => {
                write!(f, "Draws are not allowed: both teams scored {}", score)
            }
            EngineError::MatchNotFound(id) => write!(f, "Match not found: {}", id),
            EngineError::TeamNotFound(id) => write!(f, "Team not found: {}", id),
            EngineError::NotEnoughTeams { found } => {
                write!(f, "Need at least 2 attended teams to pair, found {}", found)
            }
            EngineError::EmptyRoster => write!(f, "Roster is empty"),
            EngineError::RosterTooLarge { found, max } => {
                write!(f, "Roster holds {} teams, the registration cap is {}", found, max)
            }
            EngineError::InvalidRosterEntry(msg) => write!(f, "Invalid roster entry: {}", msg),
            EngineError::PhaseMismatch { expected, found } => {
                write!(f, "Operation requires the {} phase, current phase is {}", expected, found)
            }
            EngineError::RoundInProgress { unplayed } => {
                write!(f, "{} matches still unplayed", unplayed)
            }
            EngineError::RoundLimitReached { limit } => {
                write!(f, "The Swiss stage is capped at {} rounds", limit)
            }
            EngineError::SwissNotFinished { round } => {
                write!(f, "Qualification runs through round 5, currently at round {}", round)
            }
            EngineError::NothingToRollBack => write!(f, "No round to roll back"),
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;
