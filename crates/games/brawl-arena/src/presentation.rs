//! Thin adapter between combat state and the rendering host.
//!
//! Gameplay code never touches sprites. It records [`Cue`]s for discrete
//! moments (a punch, a hit, a special) and the host adapter replays them,
//! together with per-frame body placement read from [`BrawlState`].

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use brawl_core::game_trait::FighterIndex;

use crate::BrawlState;
use crate::fighter::Guard;
use crate::roster::{AbilityId, Archetype};

/// Animation identifiers, resolved per archetype by the [`AssetCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anim {
    Idle,
    Walk,
    Jump,
    Punch,
    Block,
    Charge,
    Hurt,
    Shoot,
    Special(AbilityId),
    Victory,
    Defeat,
}

impl Anim {
    pub fn key(self) -> String {
        match self {
            Self::Idle => "idle".to_string(),
            Self::Walk => "walk".to_string(),
            Self::Jump => "jump".to_string(),
            Self::Punch => "punch".to_string(),
            Self::Block => "block".to_string(),
            Self::Charge => "charge".to_string(),
            Self::Hurt => "hurt".to_string(),
            Self::Shoot => "shoot".to_string(),
            Self::Special(ability) => format!("special_{}", ability.name()),
            Self::Victory => "victory".to_string(),
            Self::Defeat => "defeat".to_string(),
        }
    }
}

/// A discrete presentation moment recorded during an update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cue {
    Animation { fighter: FighterIndex, anim: Anim },
    CameraShake { intensity: f32, duration_ms: u64 },
    Flash { duration_ms: u64 },
}

/// Rendering/physics host operations the adapter drives.
pub trait PresentationHost {
    fn set_texture(&mut self, fighter: FighterIndex, texture: &str);

    /// Start an animation. Returns false if the host has no such asset.
    fn play_animation(&mut self, fighter: FighterIndex, key: &str) -> bool;

    fn place_body(&mut self, fighter: FighterIndex, pos: Vec2, facing: f32);

    fn place_projectile(&mut self, id: u32, pos: Vec2);

    fn shake_camera(&mut self, intensity: f32, duration_ms: u64);

    fn flash(&mut self, duration_ms: u64);
}

/// Texture and animation keys known to the host.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    pub default_texture: String,
    /// Texture per roster index.
    pub textures: Vec<String>,
    /// Registered `{archetype}_{anim}` keys.
    pub animations: HashSet<String>,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        let base = [
            Anim::Idle,
            Anim::Walk,
            Anim::Jump,
            Anim::Punch,
            Anim::Block,
            Anim::Charge,
            Anim::Hurt,
            Anim::Shoot,
            Anim::Victory,
            Anim::Defeat,
        ];
        let mut animations = HashSet::new();
        for archetype in Archetype::ROSTER {
            for anim in base {
                animations.insert(format!("{}_{}", archetype.name(), anim.key()));
            }
            for &ability in archetype.abilities() {
                animations.insert(format!(
                    "{}_{}",
                    archetype.name(),
                    Anim::Special(ability).key()
                ));
            }
        }
        Self {
            default_texture: "fighter_default".to_string(),
            textures: Archetype::ROSTER
                .iter()
                .map(|a| format!("fighter_{}", a.name()))
                .collect(),
            animations,
        }
    }
}

impl AssetCatalog {
    /// Texture for a roster index, falling back to the default texture.
    pub fn texture_for(&self, index: u8) -> &str {
        self.textures
            .get(index as usize)
            .map(String::as_str)
            .unwrap_or(&self.default_texture)
    }

    /// Animation key for an archetype, if the host registered one.
    pub fn animation_for(&self, archetype: Archetype, anim: Anim) -> Option<String> {
        let key = format!("{}_{}", archetype.name(), anim.key());
        self.animations.contains(&key).then_some(key)
    }
}

/// Bind fighter textures on scene entry.
pub fn bind_textures(host: &mut dyn PresentationHost, catalog: &AssetCatalog, characters: [u8; 2]) {
    for (fighter, index) in characters.into_iter().enumerate() {
        host.set_texture(fighter, catalog.texture_for(index));
    }
}

/// Looping animation implied by a fighter's current state.
pub fn ambient_anim(state: &BrawlState, fighter: FighterIndex) -> Anim {
    let f = &state.fighters[fighter];
    match f.guard {
        Guard::Blocking => Anim::Block,
        Guard::Charging => Anim::Charge,
        Guard::Open if !f.grounded => Anim::Jump,
        Guard::Open if f.vel.x.abs() > f32::EPSILON => Anim::Walk,
        Guard::Open => Anim::Idle,
    }
}

/// Sync host bodies with the state and replay this frame's cues.
///
/// Cues whose animation asset is missing are skipped; game state is unaffected.
pub fn present(
    host: &mut dyn PresentationHost,
    catalog: &AssetCatalog,
    state: &BrawlState,
    cues: &[Cue],
) {
    for (i, f) in state.fighters.iter().enumerate() {
        host.place_body(i, f.pos, f.facing);
    }
    for p in &state.projectiles {
        host.place_projectile(p.id, p.pos);
    }

    let mut animated = [false; 2];
    for cue in cues {
        match *cue {
            Cue::Animation { fighter, anim } => {
                if play(host, catalog, state, fighter, anim) {
                    animated[fighter] = true;
                }
            },
            Cue::CameraShake {
                intensity,
                duration_ms,
            } => host.shake_camera(intensity, duration_ms),
            Cue::Flash { duration_ms } => host.flash(duration_ms),
        }
    }
    for (fighter, done) in animated.into_iter().enumerate() {
        if !done {
            play(host, catalog, state, fighter, ambient_anim(state, fighter));
        }
    }
}

fn play(
    host: &mut dyn PresentationHost,
    catalog: &AssetCatalog,
    state: &BrawlState,
    fighter: FighterIndex,
    anim: Anim,
) -> bool {
    let Some(f) = state.fighters.get(fighter) else {
        return false;
    };
    let Some(key) = catalog.animation_for(f.archetype, anim) else {
        tracing::trace!(fighter, anim = ?anim, "No animation registered, skipping");
        return false;
    };
    let played = host.play_animation(fighter, &key);
    if !played {
        tracing::trace!(fighter, key = %key, "Host missing animation asset, skipping");
    }
    played
}
