use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scene::{MatchOutcome, MatchSetup};

/// Unique identifier for a player in the game.
pub type PlayerId = u64;

/// Position of a fighter within a match: 0 is the left spawn, 1 the right.
pub type FighterIndex = usize;

/// Core trait that every Brawl match implementation must provide.
///
/// The host owns rendering, physics presentation, input hardware and scene
/// navigation; the game only handles combat state.
pub trait BrawlGame: Send + Sync {
    /// Game metadata for the character/map selection screen.
    fn metadata(&self) -> GameMetadata;

    /// Called once on scene entry with the selection payload.
    fn init(&mut self, players: &[super::player::Player], config: &GameConfig);

    /// Called each frame. Returns a list of game events.
    fn update(&mut self, dt: f32, inputs: &PlayerInputs) -> Vec<GameEvent>;

    /// Serialize the authoritative match state.
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace the match state with a previously serialized snapshot.
    fn apply_state(&mut self, state: &[u8]);

    /// Queue a player's raw input for the next update.
    fn apply_input(&mut self, player_id: PlayerId, input: &[u8]);

    /// Called when a player disconnects or quits to the menu.
    fn player_left(&mut self, player_id: PlayerId);

    /// Update rate in Hz the host should drive `update` at.
    fn tick_rate(&self) -> f32 {
        60.0
    }

    /// Freeze simulation (menu overlay, focus loss).
    fn pause(&mut self);

    /// Continue simulation after a pause.
    fn resume(&mut self);

    /// Whether the match has reached its terminal state.
    fn is_match_complete(&self) -> bool;

    /// Scene transition payload once the match is complete.
    fn outcome(&self) -> Option<MatchOutcome>;
}

/// Game metadata for the selection screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub min_players: u8,
    pub max_players: u8,
    pub estimated_match_duration: Duration,
}

/// Configuration handed over by the selection scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    pub setup: MatchSetup,
    pub custom: HashMap<String, serde_json::Value>,
}

/// Collected inputs from all players for a single tick.
#[derive(Debug, Default)]
pub struct PlayerInputs {
    pub inputs: HashMap<PlayerId, Vec<u8>>,
}

/// Events emitted by a match during update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Damaged {
        fighter: FighterIndex,
        amount: f32,
        health: f32,
    },
    AbilityUsed {
        fighter: FighterIndex,
        ability: String,
    },
    AbilityStolen {
        thief: FighterIndex,
        victim: FighterIndex,
        ability: String,
    },
    Immobilized {
        fighter: FighterIndex,
    },
    MatchComplete {
        outcome: MatchOutcome,
    },
}

/// Generates the boilerplate `BrawlGame` methods shared by every match type:
/// `serialize_state`, `apply_state`, `pause`, `resume`, `is_match_complete`.
///
/// Requires the implementing struct to have `state: $StateType` and `paused: bool` fields,
/// and `$StateType` to have a `match_complete: bool` field. The calling crate must depend
/// on `rmp-serde` and `tracing`.
#[macro_export]
macro_rules! brawl_game_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Match state serialization failed");
                Vec::new()
            })
        }

        fn apply_state(&mut self, state: &[u8]) {
            if let Ok(s) = rmp_serde::from_slice::<$StateType>(state) {
                self.state = s;
            }
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn is_match_complete(&self) -> bool {
            self.state.match_complete
        }
    };
}
