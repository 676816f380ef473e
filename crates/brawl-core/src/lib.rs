pub mod codec;
pub mod game_trait;
pub mod player;
pub mod scene;
pub mod timed;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashMap;

    use crate::game_trait::{BrawlGame, GameConfig, GameEvent, PlayerId, PlayerInputs};
    use crate::player::{ControlSlot, KeyProfile, Player, PlayerColor};
    use crate::scene::{MatchMode, MatchSetup};

    /// Create `n` test players with sequential IDs starting at 1.
    ///
    /// Player 1 reads WASD and gamepad 0, player 2 reads the arrow profile and gamepad 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player {
                id: i as PlayerId + 1,
                display_name: format!("Player{}", i + 1),
                color: PlayerColor::PALETTE[i % PlayerColor::PALETTE.len()],
                slot: ControlSlot {
                    keys: if i == 0 {
                        KeyProfile::Wasd
                    } else {
                        KeyProfile::Arrows
                    },
                    gamepad: Some(i as u8),
                },
                is_spectator: false,
            })
            .collect()
    }

    /// Create a config for the given mode with the default stage and characters.
    pub fn default_config(mode: MatchMode) -> GameConfig {
        GameConfig {
            setup: MatchSetup {
                mode,
                ..MatchSetup::default()
            },
            custom: HashMap::new(),
        }
    }

    /// Create a config with explicit roster picks.
    pub fn config_with_characters(mode: MatchMode, characters: [u8; 2]) -> GameConfig {
        GameConfig {
            setup: MatchSetup {
                mode,
                characters,
                ..MatchSetup::default()
            },
            custom: HashMap::new(),
        }
    }

    /// Run N game ticks with empty inputs, returning all accumulated events.
    pub fn run_game_ticks(game: &mut dyn BrawlGame, n: usize, dt: f32) -> Vec<GameEvent> {
        let empty = PlayerInputs::default();
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(game.update(dt, &empty));
        }
        all_events
    }

    // ================================================================
    // Game Trait Contract Tests
    // ================================================================
    // Every BrawlGame implementation must pass these. Game crates call them
    // from their own #[cfg(test)] modules with a concrete game instance.

    /// After init(), serialize_state() must return non-empty bytes.
    pub fn contract_init_creates_fighter_state(game: &mut dyn BrawlGame) {
        let players = make_players(2);
        game.init(&players, &default_config(MatchMode::Versus));
        let state = game.serialize_state();
        assert!(
            !state.is_empty(),
            "serialize_state() must return non-empty bytes after init"
        );
    }

    /// apply_input() with valid data followed by update() must change state.
    pub fn contract_apply_input_changes_state(
        game: &mut dyn BrawlGame,
        valid_input: &[u8],
        player_id: PlayerId,
    ) {
        let before = game.serialize_state();
        game.apply_input(player_id, valid_input);
        game.update(0.1, &PlayerInputs::default());
        let after = game.serialize_state();
        assert_ne!(before, after, "State must change after apply_input + update");
    }

    /// update() with dt>0 must advance the match clock.
    pub fn contract_update_advances_clock(game: &mut dyn BrawlGame) {
        let before = game.serialize_state();
        game.update(1.0, &PlayerInputs::default());
        let after = game.serialize_state();
        assert_ne!(before, after, "update(dt>0) must advance match state (clock)");
    }

    /// serialize → apply → serialize must be stable after one roundtrip.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn BrawlGame) {
        let state_a = game.serialize_state();
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        game.apply_state(&state_b);
        let state_c = game.serialize_state();
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// pause() must freeze the match, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(game: &mut dyn BrawlGame) {
        let empty = PlayerInputs::default();
        game.pause();
        let before = game.serialize_state();
        game.update(1.0, &empty);
        let during_pause = game.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        game.resume();
        game.update(1.0, &empty);
        let after_resume = game.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }

    /// A player leaving must end the match in favour of the other side.
    pub fn contract_player_left_forfeits(game: &mut dyn BrawlGame, leaving: PlayerId) {
        assert!(!game.is_match_complete(), "Match must be running before forfeit");
        game.player_left(leaving);
        assert!(game.is_match_complete(), "player_left must end the match");
        let outcome = game.outcome().expect("completed match must report an outcome");
        assert_ne!(
            outcome.winner_player,
            Some(leaving),
            "Leaving player cannot be recorded as winner"
        );
    }

    /// outcome() must be absent while the match is still running.
    pub fn contract_no_outcome_while_running(game: &dyn BrawlGame) {
        assert!(!game.is_match_complete());
        assert!(
            game.outcome().is_none(),
            "outcome() must be None until the match completes"
        );
    }
}
