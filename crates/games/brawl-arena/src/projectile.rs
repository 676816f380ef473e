use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use brawl_core::game_trait::FighterIndex;

use crate::config::FightConfig;
use crate::fighter::Fighter;

/// A kinematic projectile with constant velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Body that fired it. Never damages that body.
    pub owner: FighterIndex,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Piercing projectiles survive hits.
    pub piercing: bool,
    pub spawned_at: u64,
    /// Fighters already damaged by this projectile.
    pub struck: SmallVec<[FighterIndex; 2]>,
}

impl Projectile {
    /// Spawn heading from `origin` toward `target` at `speed`.
    ///
    /// A degenerate direction falls back to horizontal along `facing`.
    #[allow(clippy::too_many_arguments)]
    pub fn toward(
        id: u32,
        owner: FighterIndex,
        origin: Vec2,
        target: Vec2,
        facing: f32,
        speed: f32,
        damage: f32,
        piercing: bool,
        now: u64,
    ) -> Self {
        let dir = (target - origin)
            .try_normalize()
            .unwrap_or(Vec2::new(facing.signum(), 0.0));
        Self {
            id,
            owner,
            pos: origin,
            vel: dir * speed,
            damage,
            piercing,
            spawned_at: now,
            struck: SmallVec::new(),
        }
    }

    pub fn is_expired(&self, now: u64, lifetime_ms: u64) -> bool {
        now.saturating_sub(self.spawned_at) >= lifetime_ms
    }
}

/// A projectile overlapping a fighter this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileHit {
    pub projectile: u32,
    pub owner: FighterIndex,
    pub target: FighterIndex,
    pub damage: f32,
}

/// Move projectiles and retire those past their lifetime or outside `[0, stage_width]`.
pub fn advance_projectiles(
    projectiles: &mut Vec<Projectile>,
    dt: f32,
    now: u64,
    stage_width: f32,
    config: &FightConfig,
) {
    for p in projectiles.iter_mut() {
        p.pos += p.vel * dt;
    }
    projectiles.retain(|p| {
        !p.is_expired(now, config.projectile_lifetime_ms) && p.pos.x >= 0.0 && p.pos.x <= stage_width
    });
}

/// Resolve overlaps against fighters. Non-piercing projectiles are removed on hit.
pub fn resolve_projectile_hits(
    projectiles: &mut Vec<Projectile>,
    fighters: &[Fighter; 2],
    config: &FightConfig,
) -> Vec<ProjectileHit> {
    let mut hits = Vec::new();
    projectiles.retain_mut(|p| {
        for (target, fighter) in fighters.iter().enumerate() {
            if target == p.owner || p.struck.contains(&target) {
                continue;
            }
            if fighter.hitbox_contains(p.pos, config.projectile_radius, config) {
                p.struck.push(target);
                hits.push(ProjectileHit {
                    projectile: p.id,
                    owner: p.owner,
                    target,
                    damage: p.damage,
                });
                if !p.piercing {
                    return false;
                }
            }
        }
        true
    });
    hits
}
