use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::BrawlState;
use crate::fighter::{Fighter, Guard};

/// Per-fighter HUD readout. Pools are fractions in `0..=1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterHud {
    pub archetype: String,
    pub health: f32,
    /// Failsafe bar, present only for the cooperative body.
    pub secondary_health: Option<f32>,
    pub energy: f32,
    pub guard: Guard,
    pub stunned: bool,
    pub immobilized: bool,
    pub transformed: bool,
    /// Ability running in the effect slot.
    pub effect: Option<String>,
    /// Stolen ability and milliseconds until it returns.
    pub stolen: Option<(String, u64)>,
    pub lost: Vec<String>,
}

/// Everything the host draws on top of the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub fighters: [FighterHud; 2],
    pub reticle: Option<Vec2>,
    pub clock_ms: u64,
    pub match_complete: bool,
}

pub fn snapshot(state: &BrawlState) -> HudSnapshot {
    let now = state.clock_ms;
    HudSnapshot {
        fighters: [
            fighter_hud(&state.fighters[0], now),
            fighter_hud(&state.fighters[1], now),
        ],
        reticle: state.reticle,
        clock_ms: now,
        match_complete: state.match_complete,
    }
}

fn fighter_hud(f: &Fighter, now: u64) -> FighterHud {
    let v = &f.vitals;
    FighterHud {
        archetype: f.archetype.name().to_string(),
        health: fraction(v.health, v.max_health),
        secondary_health: v
            .has_failsafe()
            .then(|| fraction(v.secondary_health, v.max_secondary_health)),
        energy: fraction(v.energy, v.max_energy),
        guard: f.guard,
        stunned: f.is_stunned(now),
        immobilized: f.immobilized,
        transformed: f.is_transformed(now),
        effect: f.effect.ability().map(|a| a.name().to_string()),
        stolen: f
            .stolen
            .filter(|s| !s.is_expired(now))
            .map(|s| (s.kind.name().to_string(), s.remaining(now))),
        lost: f
            .lost
            .iter()
            .filter(|&(_, &until)| now < until)
            .map(|(a, _)| a.name().to_string())
            .collect(),
    }
}

fn fraction(value: f32, max: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}
