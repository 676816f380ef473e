use serde::{Deserialize, Serialize};

use crate::game_trait::PlayerId;

/// A player taking part in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub color: PlayerColor,
    pub slot: ControlSlot,
    pub is_spectator: bool,
}

/// Which keyboard layout a player reads from the shared keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyProfile {
    /// A/D move, W jump, F punch, G block, H shoot.
    #[default]
    Wasd,
    /// Arrow keys move/jump, Numpad1 punch, Numpad2 block, Numpad3 shoot.
    Arrows,
    /// Gamepad only.
    None,
}

/// Input source binding for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSlot {
    pub keys: KeyProfile,
    /// Index of the gamepad the host polls for this player, if any.
    pub gamepad: Option<u8>,
}

/// HUD tint color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::PALETTE[0]
    }
}

impl PlayerColor {
    /// Predefined palette colors for player selection.
    pub const PALETTE: &[PlayerColor] = &[
        PlayerColor {
            r: 255,
            g: 87,
            b: 87,
        }, // Red
        PlayerColor {
            r: 83,
            g: 152,
            b: 255,
        }, // Blue
        PlayerColor {
            r: 255,
            g: 195,
            b: 18,
        }, // Yellow
        PlayerColor {
            r: 46,
            g: 213,
            b: 115,
        }, // Green
    ];
}
