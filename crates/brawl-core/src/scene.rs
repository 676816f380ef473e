use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game_trait::{FighterIndex, PlayerId};

/// How the two input slots map onto fighters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Two fighters, one per player.
    #[default]
    Versus,
    /// Both players share one body against a rival.
    Cooperative,
}

/// Payload received from the selection scene on match entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSetup {
    pub mode: MatchMode,
    /// Stage/background name. Unknown names fall back to the default stage.
    pub map: String,
    /// Roster index per fighter. Out-of-range indices fall back to the default archetype.
    pub characters: [u8; 2],
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            mode: MatchMode::Versus,
            map: "dojo".to_string(),
            characters: [0, 1],
        }
    }
}

/// Payload handed to the scene host when the match ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: Uuid,
    pub mode: MatchMode,
    /// Winning fighter, `None` for a draw.
    pub winner: Option<FighterIndex>,
    /// Player controlling the winning fighter, `None` for a draw or a bot win.
    pub winner_player: Option<PlayerId>,
    pub characters: [u8; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_defaults_to_versus_on_dojo() {
        let setup = MatchSetup::default();
        assert_eq!(setup.mode, MatchMode::Versus);
        assert_eq!(setup.map, "dojo");
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&MatchMode::Cooperative).unwrap();
        assert_eq!(json, "\"cooperative\"");
    }

    #[test]
    fn partial_setup_fills_defaults() {
        let setup: MatchSetup = serde_json::from_str(r#"{"mode":"cooperative"}"#).unwrap();
        assert_eq!(setup.mode, MatchMode::Cooperative);
        assert_eq!(setup.characters, [0, 1]);
    }
}
