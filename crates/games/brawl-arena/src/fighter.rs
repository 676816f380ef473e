use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use brawl_core::game_trait::PlayerId;
use brawl_core::timed::Timed;

use crate::config::FightConfig;
use crate::input::Symbol;
use crate::roster::{AbilityId, Archetype, INVOKE_STOLEN_PATTERN};
use crate::sequence::SequenceMatcher;

/// Health and energy pools. Every mutation clamps to `[0, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    /// Failsafe pool, consumed once primary health is gone. Zero-capacity outside cooperative mode.
    pub secondary_health: f32,
    pub max_secondary_health: f32,
    pub energy: f32,
    pub max_energy: f32,
}

impl Vitals {
    pub fn new(config: &FightConfig, with_failsafe: bool) -> Self {
        let max_secondary_health = if with_failsafe {
            config.max_secondary_health
        } else {
            0.0
        };
        Self {
            health: config.max_health,
            max_health: config.max_health,
            secondary_health: max_secondary_health,
            max_secondary_health,
            energy: config.initial_energy.clamp(0.0, config.max_energy),
            max_energy: config.max_energy,
        }
    }

    pub fn has_failsafe(&self) -> bool {
        self.max_secondary_health > 0.0
    }

    pub fn set_health(&mut self, value: f32) {
        self.health = clamp_pool(value, self.max_health);
    }

    pub fn set_secondary_health(&mut self, value: f32) {
        self.secondary_health = clamp_pool(value, self.max_secondary_health);
    }

    pub fn add_energy(&mut self, amount: f32) {
        self.energy = clamp_pool(self.energy + amount, self.max_energy);
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.energy >= cost
    }

    /// Deduct `cost` if affordable.
    pub fn spend_energy(&mut self, cost: f32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.energy = clamp_pool(self.energy - cost, self.max_energy);
        true
    }
}

fn clamp_pool(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}

/// What the guard button is doing this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Guard {
    #[default]
    Open,
    /// Guard held with the opponent close: attacks are blocked.
    Blocking,
    /// Guard held with the opponent far: energy charges.
    Charging,
}

/// The single windup/channel slot of a fighter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveEffect {
    #[default]
    Idle,
    Windup {
        ability: AbilityId,
        resolve_at: u64,
    },
    Channel {
        ability: AbilityId,
        /// When the trigger was last seen released, if it currently is.
        released_since: Option<u64>,
    },
}

impl ActiveEffect {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn locks_movement(&self) -> bool {
        matches!(self, Self::Windup { .. })
    }

    pub fn ability(&self) -> Option<AbilityId> {
        match self {
            Self::Idle => None,
            Self::Windup { ability, .. } | Self::Channel { ability, .. } => Some(*ability),
        }
    }
}

/// Timed self-buffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Buff {
    /// Punches hit harder.
    Transformed,
}

/// Damage-over-time debuff, applied by breaking a guard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageOverTime {
    pub dps: f32,
}

/// A special ability and its combo buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: AbilityId,
    pub matcher: SequenceMatcher<Symbol>,
}

/// Punch streak bookkeeping for knockback and guard break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub landed: u32,
    pub blocked: u32,
    pub last_at: Option<u64>,
}

/// One physical combat body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub archetype: Archetype,
    /// Player driving movement and melee. `None` for the cooperative rival bot.
    pub controller: Option<PlayerId>,
    /// Feet position; y = 0 is the ground.
    pub pos: Vec2,
    pub vel: Vec2,
    pub grounded: bool,
    /// +1 facing right, -1 facing left.
    pub facing: f32,
    pub vitals: Vitals,
    pub guard: Guard,
    pub stunned_until: u64,
    /// Cooperative failsafe latch: primary health ran out.
    pub immobilized: bool,
    pub last_punch_at: Option<u64>,
    pub last_shot_at: Option<u64>,
    pub streak: Streak,
    pub abilities: Vec<AbilitySlot>,
    /// Buffer for firing a stolen ability. Only tricksters have one.
    pub invoke_stolen: Option<SequenceMatcher<Symbol>>,
    pub effect: ActiveEffect,
    pub buffs: Vec<Timed<Buff>>,
    pub dot: Option<Timed<DamageOverTime>>,
    pub stolen: Option<Timed<AbilityId>>,
    /// Abilities taken by the opponent, with the time they return.
    pub lost: BTreeMap<AbilityId, u64>,
}

impl Fighter {
    pub fn new(
        archetype: Archetype,
        controller: Option<PlayerId>,
        spawn_x: f32,
        config: &FightConfig,
        with_failsafe: bool,
    ) -> Self {
        let window = config.sequence_window_ms;
        let abilities = archetype
            .abilities()
            .iter()
            .map(|&ability| AbilitySlot {
                ability,
                matcher: SequenceMatcher::new(ability.pattern(), window),
            })
            .collect();
        let invoke_stolen = (archetype == Archetype::Trickster)
            .then(|| SequenceMatcher::new(INVOKE_STOLEN_PATTERN, window));
        Self {
            archetype,
            controller,
            pos: Vec2::new(spawn_x, 0.0),
            vel: Vec2::ZERO,
            grounded: true,
            facing: 1.0,
            vitals: Vitals::new(config, with_failsafe),
            guard: Guard::Open,
            stunned_until: 0,
            immobilized: false,
            last_punch_at: None,
            last_shot_at: None,
            streak: Streak::default(),
            abilities,
            invoke_stolen,
            effect: ActiveEffect::Idle,
            buffs: Vec::new(),
            dot: None,
            stolen: None,
            lost: BTreeMap::new(),
        }
    }

    pub fn is_stunned(&self, now: u64) -> bool {
        now < self.stunned_until
    }

    /// Extend hit-stun to at least `now + stun_ms`.
    pub fn stun(&mut self, now: u64, stun_ms: u64) {
        if stun_ms > 0 {
            self.stunned_until = self.stunned_until.max(now.saturating_add(stun_ms));
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.guard == Guard::Blocking
    }

    pub fn is_transformed(&self, now: u64) -> bool {
        self.buffs
            .iter()
            .any(|b| b.kind == Buff::Transformed && !b.is_expired(now))
    }

    /// Whether this fighter currently has access to one of its own abilities.
    pub fn has_ability(&self, ability: AbilityId, now: u64) -> bool {
        self.abilities.iter().any(|s| s.ability == ability)
            && self.lost.get(&ability).is_none_or(|&until| now >= until)
    }

    /// Center of the hitbox.
    pub fn center(&self, config: &FightConfig) -> Vec2 {
        self.pos + Vec2::new(0.0, config.body_height * 0.5)
    }

    /// Point projectiles leave from.
    pub fn muzzle(&self, config: &FightConfig) -> Vec2 {
        self.pos
            + Vec2::new(
                self.facing * config.body_half_width,
                config.body_height * 0.55,
            )
    }

    pub fn distance_to(&self, other: &Fighter) -> f32 {
        self.pos.distance(other.pos)
    }

    /// Point-in-hitbox test with a margin for the projectile radius.
    pub fn hitbox_contains(&self, point: Vec2, margin: f32, config: &FightConfig) -> bool {
        let half = config.body_half_width + margin;
        point.x >= self.pos.x - half
            && point.x <= self.pos.x + half
            && point.y >= self.pos.y - margin
            && point.y <= self.pos.y + config.body_height + margin
    }

    /// Whether primary (and failsafe, if any) health are exhausted.
    pub fn is_knocked_out(&self) -> bool {
        self.vitals.health <= 0.0
            && (!self.vitals.has_failsafe() || self.vitals.secondary_health <= 0.0)
    }
}
