use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use brawl_core::player::KeyProfile;

use crate::config::FightConfig;

/// Normalized input alphabet shared by movement and combo recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Left,
    Right,
    Punch,
    Block,
    Jump,
    Shoot,
}

/// Standard-layout gamepad button indices.
pub mod buttons {
    pub const JUMP: usize = 0;
    pub const SHOOT: usize = 1;
    pub const PUNCH: usize = 2;
    pub const BLOCK_LEFT: usize = 4;
    pub const BLOCK_RIGHT: usize = 5;
    /// Buttons the tracker follows.
    pub const COUNT: usize = 6;
}

/// One polled gamepad as reported by the input host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamepadSnapshot {
    /// Left stick `[x, y]`, each in -1..1 with negative y pointing up.
    pub axes: [f32; 2],
    pub buttons: Vec<bool>,
}

/// Raw per-player input sent by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// Key codes currently held.
    #[serde(default)]
    pub keys_down: Vec<String>,
    /// Key codes that went down since the previous host frame.
    #[serde(default)]
    pub keys_just_pressed: Vec<String>,
    #[serde(default)]
    pub gamepad: Option<GamepadSnapshot>,
}

impl RawInput {
    /// Fold a newer snapshot into this one.
    ///
    /// Held keys and gamepad state are overwritten with the latest; just-pressed
    /// edges accumulate until the next tick consumes them.
    pub fn merge(&mut self, newer: RawInput) {
        self.keys_down = newer.keys_down;
        self.gamepad = newer.gamepad;
        for key in newer.keys_just_pressed {
            if !self.keys_just_pressed.contains(&key) {
                self.keys_just_pressed.push(key);
            }
        }
    }

    /// Drop edge-triggered data after a tick has sampled it.
    pub fn clear_edges(&mut self) {
        self.keys_just_pressed.clear();
    }

    /// Replace non-finite stick values so they cannot corrupt positions.
    pub fn sanitize(&mut self) {
        if let Some(pad) = &mut self.gamepad {
            for axis in &mut pad.axes {
                if !axis.is_finite() {
                    *axis = 0.0;
                }
            }
        }
    }

    fn is_down(&self, key: &str) -> bool {
        self.keys_down.iter().any(|k| k == key)
    }

    fn just_pressed(&self, key: &str) -> bool {
        self.keys_just_pressed.iter().any(|k| k == key)
    }
}

/// Key codes for one keyboard profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub left: &'static str,
    pub right: &'static str,
    pub up: &'static str,
    pub down: &'static str,
    pub punch: &'static str,
    pub block: &'static str,
    pub shoot: &'static str,
}

impl KeyBindings {
    pub fn for_profile(profile: KeyProfile) -> Option<Self> {
        match profile {
            KeyProfile::Wasd => Some(Self {
                left: "KeyA",
                right: "KeyD",
                up: "KeyW",
                down: "KeyS",
                punch: "KeyF",
                block: "KeyG",
                shoot: "KeyH",
            }),
            KeyProfile::Arrows => Some(Self {
                left: "ArrowLeft",
                right: "ArrowRight",
                up: "ArrowUp",
                down: "ArrowDown",
                punch: "Numpad1",
                block: "Numpad2",
                shoot: "Numpad3",
            }),
            KeyProfile::None => None,
        }
    }
}

/// Horizontal stick zone used for direction edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum StickZone {
    Left,
    #[default]
    Neutral,
    Right,
}

/// Normalized input for one fighter for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Walk intent in -1..1, zero inside the walk deadzone.
    pub move_x: f32,
    /// Vertical intent in -1..1, positive up. Only the reticle reads it.
    pub move_y: f32,
    pub jump: bool,
    pub punch: bool,
    pub shoot: bool,
    pub block_held: bool,
    pub shoot_held: bool,
    /// Rising-edge symbols this frame, in fixed priority order.
    pub symbols: SmallVec<[Symbol; 4]>,
}

/// Per-player edge tracking for gamepad buttons and stick zones.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    pressed: [bool; buttons::COUNT],
    last_pressed: [bool; buttons::COUNT],
    zone: StickZone,
    stick_up: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample one frame of input for a player using the given keyboard profile.
    pub fn sample(
        &mut self,
        raw: &RawInput,
        profile: KeyProfile,
        config: &FightConfig,
    ) -> FrameInput {
        let keys = KeyBindings::for_profile(profile);
        let pad = raw.gamepad.as_ref();

        self.last_pressed = self.pressed;
        for (i, slot) in self.pressed.iter_mut().enumerate() {
            *slot = pad.and_then(|p| p.buttons.get(i).copied()).unwrap_or(false);
        }
        let rising = |tracker: &Self, i: usize| tracker.pressed[i] && !tracker.last_pressed[i];

        let [ax, ay] = pad.map(|p| p.axes).unwrap_or([0.0, 0.0]);

        let zone = if ax < -config.sequence_axis_threshold {
            StickZone::Left
        } else if ax > config.sequence_axis_threshold {
            StickZone::Right
        } else {
            StickZone::Neutral
        };
        let zone_entered = |z: StickZone| zone == z && self.zone != z;
        let stick_left = zone_entered(StickZone::Left);
        let stick_right = zone_entered(StickZone::Right);
        self.zone = zone;

        let up_now = ay < -config.jump_axis_threshold;
        let stick_jump = up_now && !self.stick_up;
        self.stick_up = up_now;

        let key_down = |key: Option<&str>| key.is_some_and(|k| raw.is_down(k));
        let key_edge = |key: Option<&str>| key.is_some_and(|k| raw.just_pressed(k));

        let key_x = match (key_down(keys.map(|k| k.left)), key_down(keys.map(|k| k.right))) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        let move_x = if key_x != 0.0 {
            key_x
        } else if ax.abs() > config.walk_axis_threshold {
            ax.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let key_y = match (key_down(keys.map(|k| k.up)), key_down(keys.map(|k| k.down))) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        let move_y = if key_y != 0.0 {
            key_y
        } else if ay.abs() > config.walk_axis_threshold {
            (-ay).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let left = key_edge(keys.map(|k| k.left)) || stick_left;
        let right = key_edge(keys.map(|k| k.right)) || stick_right;
        let punch = key_edge(keys.map(|k| k.punch)) || rising(self, buttons::PUNCH);
        let shoot = key_edge(keys.map(|k| k.shoot)) || rising(self, buttons::SHOOT);
        let jump = key_edge(keys.map(|k| k.up)) || rising(self, buttons::JUMP) || stick_jump;
        let block_edge = key_edge(keys.map(|k| k.block))
            || rising(self, buttons::BLOCK_LEFT)
            || rising(self, buttons::BLOCK_RIGHT);

        let block_held = key_down(keys.map(|k| k.block))
            || self.pressed[buttons::BLOCK_LEFT]
            || self.pressed[buttons::BLOCK_RIGHT];
        let shoot_held = key_down(keys.map(|k| k.shoot)) || self.pressed[buttons::SHOOT];

        let mut symbols = SmallVec::new();
        for (hit, symbol) in [
            (left, Symbol::Left),
            (right, Symbol::Right),
            (punch, Symbol::Punch),
            (shoot, Symbol::Shoot),
            (jump, Symbol::Jump),
            (block_edge, Symbol::Block),
        ] {
            if hit {
                symbols.push(symbol);
            }
        }

        FrameInput {
            move_x,
            move_y,
            jump,
            punch,
            shoot,
            block_held,
            shoot_held,
            symbols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(down: &[&str], pressed: &[&str]) -> RawInput {
        RawInput {
            keys_down: down.iter().map(|s| s.to_string()).collect(),
            keys_just_pressed: pressed.iter().map(|s| s.to_string()).collect(),
            gamepad: None,
        }
    }

    fn pad(axes: [f32; 2], pressed: &[usize]) -> RawInput {
        let mut buttons = vec![false; buttons::COUNT];
        for &b in pressed {
            buttons[b] = true;
        }
        RawInput {
            gamepad: Some(GamepadSnapshot { axes, buttons }),
            ..Default::default()
        }
    }

    #[test]
    fn keyboard_walk_and_punch_edge() {
        let config = FightConfig::default();
        let mut tracker = InputTracker::new();
        let frame = tracker.sample(
            &keys(&["KeyD", "KeyF"], &["KeyF"]),
            KeyProfile::Wasd,
            &config,
        );
        assert_eq!(frame.move_x, 1.0);
        assert!(frame.punch);
        assert_eq!(frame.symbols.as_slice(), &[Symbol::Punch]);

        // Held but no new edge
        let frame = tracker.sample(&keys(&["KeyD", "KeyF"], &[]), KeyProfile::Wasd, &config);
        assert!(!frame.punch);
        assert!(frame.symbols.is_empty());
    }

    #[test]
    fn other_profile_keys_are_ignored() {
        let config = FightConfig::default();
        let mut tracker = InputTracker::new();
        let frame = tracker.sample(
            &keys(&["ArrowLeft"], &["ArrowLeft", "Numpad1"]),
            KeyProfile::Wasd,
            &config,
        );
        assert_eq!(frame.move_x, 0.0);
        assert!(frame.symbols.is_empty());
    }

    #[test]
    fn block_is_level_triggered() {
        let config = FightConfig::default();
        let mut tracker = InputTracker::new();
        let first = tracker.sample(&keys(&["KeyG"], &["KeyG"]), KeyProfile::Wasd, &config);
        let second = tracker.sample(&keys(&["KeyG"], &[]), KeyProfile::Wasd, &config);
        assert!(first.block_held && second.block_held);
        assert_eq!(first.symbols.as_slice(), &[Symbol::Block]);
        assert!(second.symbols.is_empty());
    }

    #[test]
    fn gamepad_buttons_fire_on_rising_edge_only() {
        let config = FightConfig::default();
        let mut tracker = InputTracker::new();
        let first = tracker.sample(&pad([0.0, 0.0], &[buttons::PUNCH]), KeyProfile::None, &config);
        let held = tracker.sample(&pad([0.0, 0.0], &[buttons::PUNCH]), KeyProfile::None, &config);
        let released = tracker.sample(&pad([0.0, 0.0], &[]), KeyProfile::None, &config);
        let again = tracker.sample(&pad([0.0, 0.0], &[buttons::PUNCH]), KeyProfile::None, &config);
        assert!(first.punch);
        assert!(!held.punch);
        assert!(!released.punch);
        assert!(again.punch);
    }

    #[test]
    fn stick_walk_deadzone_and_direction_symbols() {
        let config = FightConfig::default();
        let mut tracker = InputTracker::new();

        let drift = tracker.sample(&pad([0.2, 0.0], &[]), KeyProfile::None, &config);
        assert_eq!(drift.move_x, 0.0);

        let walk = tracker.sample(&pad([0.5, 0.0], &[]), KeyProfile::None, &config);
        assert_eq!(walk.move_x, 0.5);
        assert!(walk.symbols.is_empty(), "0.5 is below the combo threshold");

        let hard = tracker.sample(&pad([0.9, 0.0], &[]), KeyProfile::None, &config);
        assert_eq!(hard.symbols.as_slice(), &[Symbol::Right]);

        let still = tracker.sample(&pad([0.9, 0.0], &[]), KeyProfile::None, &config);
        assert!(still.symbols.is_empty(), "holding the stick is not a new symbol");

        let flick = tracker.sample(&pad([-0.8, 0.0], &[]), KeyProfile::None, &config);
        assert_eq!(flick.symbols.as_slice(), &[Symbol::Left]);
    }

    #[test]
    fn stick_up_jumps_once() {
        let config = FightConfig::default();
        let mut tracker = InputTracker::new();
        let up = tracker.sample(&pad([0.0, -0.8], &[]), KeyProfile::None, &config);
        let held = tracker.sample(&pad([0.0, -0.8], &[]), KeyProfile::None, &config);
        assert!(up.jump);
        assert!(!held.jump);
        assert!(up.move_y > 0.0);
    }

    #[test]
    fn merge_accumulates_edges_and_overwrites_levels() {
        let mut pending = keys(&["KeyF"], &["KeyF"]);
        pending.merge(keys(&["KeyA"], &["KeyA"]));
        assert_eq!(pending.keys_down, vec!["KeyA".to_string()]);
        assert_eq!(pending.keys_just_pressed.len(), 2);
        pending.clear_edges();
        assert!(pending.keys_just_pressed.is_empty());
        assert_eq!(pending.keys_down, vec!["KeyA".to_string()]);
    }

    #[test]
    fn sanitize_zeroes_nan_axes() {
        let mut raw = pad([f32::NAN, f32::INFINITY], &[]);
        raw.sanitize();
        assert_eq!(raw.gamepad.unwrap().axes, [0.0, 0.0]);
    }
}
