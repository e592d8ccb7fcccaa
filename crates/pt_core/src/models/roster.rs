use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::team::TeamId;

/// Registration caps the roster at the standard tournament size.
pub const MAX_TEAMS: usize = 40;

/// What the registration front end hands over at Swiss initialization.
///
/// The registration form exposes four fixed player slots, so blank entries
/// are tolerated on the wire and stripped by [`RegisteredTeam::player_names`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredTeam {
    #[serde(default = "Uuid::new_v4")]
    pub id: TeamId,
    pub name: String,
    pub captain: String,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default = "default_attended")]
    pub attended: bool,
}

fn default_attended() -> bool {
    true
}

impl RegisteredTeam {
    pub fn new(name: impl Into<String>, captain: impl Into<String>, players: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            captain: captain.into(),
            players,
            attended: true,
        }
    }

    /// Non-blank player names, trimmed, in form order.
    pub fn player_names(&self) -> Vec<String> {
        self.players
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Team name and captain are mandatory; a team fields 1 to 4 players.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("team name is required".to_string());
        }
        if self.captain.trim().is_empty() {
            return Err(format!("captain name is required for team '{}'", self.name.trim()));
        }
        let players = self.player_names();
        if players.is_empty() || players.len() > 4 {
            return Err(format!(
                "team '{}' must field 1 to 4 players, found {}",
                self.name.trim(),
                players.len()
            ));
        }
        Ok(())
    }
}
