use serde::{Deserialize, Serialize};

/// Data-driven tuning for a Brawl match. Times in milliseconds, distances in
/// pixels, rates per second.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FightConfig {
    /// Primary health every fighter starts with.
    pub max_health: f32,
    /// Failsafe pool of the shared body in cooperative mode.
    pub max_secondary_health: f32,
    pub max_energy: f32,
    pub initial_energy: f32,
    /// Energy gained per second while charging.
    pub charge_rate: f32,

    pub walk_speed: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    /// Half width of a fighter's hitbox.
    pub body_half_width: f32,
    pub body_height: f32,

    /// Opponent distance at or below which the guard button blocks instead of charging.
    pub block_range: f32,
    pub punch_range: f32,
    pub punch_damage: f32,
    /// Punch damage while the transformed buff is active.
    pub transformed_punch_damage: f32,
    pub punch_cooldown_ms: u64,
    pub punch_stun_ms: u64,
    /// Every Nth consecutive landed or blocked punch triggers knockback / damage over time.
    pub streak_length: u32,
    /// Gap after which a punch streak is forgotten.
    pub streak_window_ms: u64,
    pub knockback_distance: f32,
    pub guard_break_dps: f32,
    pub guard_break_duration_ms: u64,

    pub shot_cost: f32,
    pub shot_cooldown_ms: u64,
    pub shot_damage: f32,
    pub shot_stun_ms: u64,
    pub versus_shot_speed: f32,
    pub coop_shot_speed: f32,
    pub projectile_lifetime_ms: u64,
    pub projectile_radius: f32,
    /// Fraction of projectile damage a blocking fighter still takes.
    pub block_projectile_factor: f32,
    pub reticle_speed: f32,

    /// Maximum gap between consecutive combo inputs, and maximum span of a combo.
    pub sequence_window_ms: u64,
    /// Stick deflection that registers a direction for combo input.
    pub sequence_axis_threshold: f32,
    /// Stick deflection that starts walking.
    pub walk_axis_threshold: f32,
    /// Upward stick deflection (negative y) that counts as jump.
    pub jump_axis_threshold: f32,

    /// Re-arm delay of the match-end signal.
    pub match_end_rearm_ms: u64,

    pub abilities: AbilityTuning,
}

/// Per-ability effect tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    pub transform_cost: f32,
    pub transform_duration_ms: u64,

    pub ground_slam_cost: f32,
    pub ground_slam_windup_ms: u64,
    pub ground_slam_damage: f32,
    pub ground_slam_radius: f32,
    pub ground_slam_stun_ms: u64,

    pub drain_beam_cost: f32,
    pub drain_beam_energy_per_sec: f32,
    pub drain_beam_dps: f32,
    pub drain_beam_radius: f32,
    /// Channel ends once the trigger has been released for longer than this.
    pub drain_beam_release_grace_ms: u64,

    pub mend_cost: f32,
    pub mend_amount: f32,

    pub piercing_shot_cost: f32,
    pub piercing_shot_damage: f32,

    pub volley_cost: f32,
    pub volley_damage: f32,
    pub volley_spread_deg: f32,

    pub blink_cost: f32,
    pub blink_offset: f32,

    pub steal_cost: f32,
    pub steal_duration_ms: u64,
}

impl Default for FightConfig {
    fn default() -> Self {
        Self {
            max_health: 1000.0,
            max_secondary_health: 500.0,
            max_energy: 500.0,
            initial_energy: 100.0,
            charge_rate: 150.0,
            walk_speed: 260.0,
            jump_velocity: 650.0,
            gravity: 1600.0,
            body_half_width: 40.0,
            body_height: 160.0,
            block_range: 140.0,
            punch_range: 90.0,
            punch_damage: 50.0,
            transformed_punch_damage: 80.0,
            punch_cooldown_ms: 400,
            punch_stun_ms: 300,
            streak_length: 3,
            streak_window_ms: 1200,
            knockback_distance: 100.0,
            guard_break_dps: 30.0,
            guard_break_duration_ms: 3000,
            shot_cost: 100.0,
            shot_cooldown_ms: 500,
            shot_damage: 70.0,
            shot_stun_ms: 400,
            versus_shot_speed: 450.0,
            coop_shot_speed: 600.0,
            projectile_lifetime_ms: 2200,
            projectile_radius: 10.0,
            block_projectile_factor: 0.25,
            reticle_speed: 500.0,
            sequence_window_ms: 1000,
            sequence_axis_threshold: 0.6,
            walk_axis_threshold: 0.3,
            jump_axis_threshold: 0.6,
            match_end_rearm_ms: 1000,
            abilities: AbilityTuning::default(),
        }
    }
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            transform_cost: 200.0,
            transform_duration_ms: 8000,
            ground_slam_cost: 250.0,
            ground_slam_windup_ms: 700,
            ground_slam_damage: 150.0,
            ground_slam_radius: 220.0,
            ground_slam_stun_ms: 400,
            drain_beam_cost: 100.0,
            drain_beam_energy_per_sec: 80.0,
            drain_beam_dps: 120.0,
            drain_beam_radius: 260.0,
            drain_beam_release_grace_ms: 700,
            mend_cost: 200.0,
            mend_amount: 180.0,
            piercing_shot_cost: 150.0,
            piercing_shot_damage: 120.0,
            volley_cost: 200.0,
            volley_damage: 60.0,
            volley_spread_deg: 10.0,
            blink_cost: 120.0,
            blink_offset: 80.0,
            steal_cost: 200.0,
            steal_duration_ms: 30_000,
        }
    }
}

impl FightConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("BRAWL_FIGHT_CONFIG")
            && let Some(config) = Self::read(&path)
        {
            return config;
        }
        Self::read("config/fight.toml").unwrap_or_default()
    }

    fn read(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Self>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path, error = %e, "Ignoring malformed fight config");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: FightConfig = toml::from_str(
            r#"
            punch_damage = 75.0
            [abilities]
            steal_duration_ms = 10000
            "#,
        )
        .unwrap();
        assert_eq!(config.punch_damage, 75.0);
        assert_eq!(config.max_health, 1000.0);
        assert_eq!(config.abilities.steal_duration_ms, 10_000);
        assert_eq!(config.abilities.transform_cost, 200.0);
    }

    #[test]
    fn defaults_match_stock_tuning() {
        let config = FightConfig::default();
        assert_eq!(config.sequence_window_ms, 1000);
        assert_eq!(config.projectile_lifetime_ms, 2200);
        assert_eq!(config.abilities.steal_duration_ms, 30_000);
    }
}
