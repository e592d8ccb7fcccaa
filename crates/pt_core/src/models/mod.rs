pub mod game_match;
pub mod roster;
pub mod team;

pub use game_match::{GameMatch, KnockoutRound, MatchStage};
pub use roster::{RegisteredTeam, MAX_TEAMS};
pub use team::{Category, Team, TeamId};
