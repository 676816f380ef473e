//! Per-fighter stance, melee, shooting, and kinematics.

use glam::Vec2;

use brawl_core::game_trait::FighterIndex;
use brawl_core::timed::Timed;

use crate::config::FightConfig;
use crate::fighter::{DamageOverTime, Guard, Streak};
use crate::input::FrameInput;
use crate::presentation::{Anim, Cue};
use crate::projectile::{advance_projectiles, resolve_projectile_hits};
use crate::{BrawlState, TickOutput};

/// Resolve the guard stance of `idx` from the block button and opponent distance.
///
/// Stunned fighters cannot guard. Charging refills energy.
pub fn update_stance(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    input: &FrameInput,
    dt: f32,
    now: u64,
) {
    let dist = state.distance();
    let fighter = &mut state.fighters[idx];
    fighter.guard = if fighter.is_stunned(now) || !input.block_held {
        Guard::Open
    } else if dist <= config.block_range {
        Guard::Blocking
    } else {
        Guard::Charging
    };
    if fighter.guard == Guard::Charging {
        fighter.vitals.add_energy(config.charge_rate * dt);
    }
}

/// Attempt a punch. Returns false when out of range, on cooldown, or the target is stunned.
pub fn try_punch(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    now: u64,
    out: &mut TickOutput,
) -> bool {
    let opp = BrawlState::opponent(idx);
    let attacker = &state.fighters[idx];
    let target = &state.fighters[opp];

    let ready = attacker
        .last_punch_at
        .is_none_or(|at| now.saturating_sub(at) >= config.punch_cooldown_ms);
    if !ready || attacker.distance_to(target) > config.punch_range || target.is_stunned(now) {
        return false;
    }
    let damage = if attacker.is_transformed(now) {
        config.transformed_punch_damage
    } else {
        config.punch_damage
    };
    let blocked = target.is_blocking();
    let streak_length = config.streak_length.max(1);

    let attacker = &mut state.fighters[idx];
    attacker.last_punch_at = Some(now);
    if attacker
        .streak
        .last_at
        .is_some_and(|at| now.saturating_sub(at) > config.streak_window_ms)
    {
        attacker.streak = Streak::default();
    }
    attacker.streak.last_at = Some(now);
    out.cues.push(Cue::Animation {
        fighter: idx,
        anim: Anim::Punch,
    });

    if blocked {
        attacker.streak.landed = 0;
        attacker.streak.blocked += 1;
        if attacker.streak.blocked % streak_length == 0 {
            state.fighters[opp].dot = Some(Timed::start(
                DamageOverTime {
                    dps: config.guard_break_dps,
                },
                now,
                config.guard_break_duration_ms,
            ));
            tracing::debug!(attacker = idx, "Guard broken");
        }
        return true;
    }

    attacker.streak.blocked = 0;
    attacker.streak.landed += 1;
    let knockback = attacker.streak.landed % streak_length == 0;
    state.strike(opp, damage, config.punch_stun_ms, now, out);

    if knockback {
        let dir = (state.fighters[opp].pos.x - state.fighters[idx].pos.x).signum();
        let fallback = if dir == 0.0 { state.fighters[idx].facing } else { dir };
        let half = config.body_half_width;
        let max_x = (state.stage.width - half).max(half);
        let target = &mut state.fighters[opp];
        target.pos.x = (target.pos.x + fallback * config.knockback_distance).clamp(half, max_x);
        out.cues.push(Cue::CameraShake {
            intensity: 4.0,
            duration_ms: 150,
        });
    }
    true
}

/// Attempt a shot from `idx`'s muzzle. Returns false on cooldown or without energy.
pub fn try_shoot(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    now: u64,
    out: &mut TickOutput,
) -> bool {
    let fighter = &mut state.fighters[idx];
    let ready = fighter
        .last_shot_at
        .is_none_or(|at| now.saturating_sub(at) >= config.shot_cooldown_ms);
    if !ready || !fighter.vitals.spend_energy(config.shot_cost) {
        return false;
    }
    fighter.last_shot_at = Some(now);

    let aim = state.aim(idx, config);
    state.spawn_projectile(
        idx,
        aim.origin,
        aim.target,
        aim.speed,
        config.shot_damage,
        false,
        now,
    );
    out.cues.push(Cue::Animation {
        fighter: idx,
        anim: Anim::Shoot,
    });
    true
}

/// Move the cooperative reticle, clamped to the stage.
pub fn steer_reticle(state: &mut BrawlState, config: &FightConfig, input: &FrameInput, dt: f32) {
    let bounds = Vec2::new(state.stage.width, state.stage.height);
    if let Some(reticle) = &mut state.reticle {
        let step = Vec2::new(input.move_x, input.move_y) * config.reticle_speed * dt;
        *reticle = (*reticle + step).clamp(Vec2::ZERO, bounds);
    }
}

/// Apply gravity and velocity, land on the ground, clamp to the stage, face the opponent.
pub fn integrate(state: &mut BrawlState, config: &FightConfig, dt: f32) {
    let half = config.body_half_width;
    let max_x = (state.stage.width - half).max(half);
    for fighter in &mut state.fighters {
        if !fighter.grounded || fighter.vel.y > 0.0 {
            fighter.vel.y -= config.gravity * dt;
        }
        fighter.pos += fighter.vel * dt;
        if fighter.pos.y <= 0.0 {
            fighter.pos.y = 0.0;
            fighter.vel.y = 0.0;
            fighter.grounded = true;
        } else {
            fighter.grounded = false;
        }
        fighter.pos.x = fighter.pos.x.clamp(half, max_x);
    }

    let dx = state.fighters[1].pos.x - state.fighters[0].pos.x;
    if dx != 0.0 {
        state.fighters[0].facing = dx.signum();
        state.fighters[1].facing = -dx.signum();
    }
}

/// Move projectiles and apply their hits. Blocking targets take reduced damage and no stun.
pub fn resolve_projectiles(
    state: &mut BrawlState,
    config: &FightConfig,
    dt: f32,
    now: u64,
    out: &mut TickOutput,
) {
    advance_projectiles(&mut state.projectiles, dt, now, state.stage.width, config);
    let hits = resolve_projectile_hits(&mut state.projectiles, &state.fighters, config);
    for hit in hits {
        let (amount, stun_ms) = if state.fighters[hit.target].is_blocking() {
            (hit.damage * config.block_projectile_factor, 0)
        } else {
            (hit.damage, config.shot_stun_ms)
        };
        tracing::trace!(projectile = hit.projectile, target = hit.target, amount, "Projectile hit");
        state.strike(hit.target, amount, stun_ms, now, out);
    }
}

/// Tick active damage-over-time debuffs.
pub fn tick_damage_over_time(state: &mut BrawlState, dt: f32, now: u64, out: &mut TickOutput) {
    for idx in 0..state.fighters.len() {
        if let Some(dot) = state.fighters[idx].dot
            && !dot.is_expired(now)
        {
            state.strike(idx, dot.kind.dps * dt, 0, now, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_core::scene::MatchSetup;

    use crate::projectile::Projectile;

    fn close_state() -> BrawlState {
        let mut s = BrawlState::new(&MatchSetup::default(), &[1, 2], &FightConfig::default());
        s.fighters[1].pos.x = s.fighters[0].pos.x + 60.0;
        s
    }

    #[test]
    fn stance_blocks_close_and_charges_far() {
        let config = FightConfig::default();
        let held = FrameInput {
            block_held: true,
            ..FrameInput::default()
        };
        let mut s = close_state();
        update_stance(&mut s, &config, 0, &held, 0.1, 0);
        assert_eq!(s.fighters[0].guard, Guard::Blocking);
        assert_eq!(s.fighters[0].vitals.energy, 100.0);

        s.fighters[1].pos.x = s.fighters[0].pos.x + 400.0;
        update_stance(&mut s, &config, 0, &held, 0.1, 0);
        assert_eq!(s.fighters[0].guard, Guard::Charging);
        assert!((s.fighters[0].vitals.energy - 115.0).abs() < 1e-3);
    }

    #[test]
    fn stunned_fighter_cannot_guard() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[0].stun(0, 500);
        let held = FrameInput {
            block_held: true,
            ..FrameInput::default()
        };
        update_stance(&mut s, &config, 0, &held, 0.1, 100);
        assert_eq!(s.fighters[0].guard, Guard::Open);
    }

    #[test]
    fn punch_respects_cooldown_and_target_stun() {
        let config = FightConfig::default();
        let mut s = close_state();
        let mut out = TickOutput::default();
        assert!(try_punch(&mut s, &config, 0, 0, &mut out));
        assert_eq!(s.fighters[1].vitals.health, 950.0);
        // Target stunned until 300, cooldown until 400.
        assert!(!try_punch(&mut s, &config, 0, 350, &mut out));
        assert!(try_punch(&mut s, &config, 0, 400, &mut out));
        assert_eq!(s.fighters[1].vitals.health, 900.0);
    }

    #[test]
    fn punch_out_of_range_does_not_start_cooldown() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[1].pos.x = s.fighters[0].pos.x + 200.0;
        let mut out = TickOutput::default();
        assert!(!try_punch(&mut s, &config, 0, 0, &mut out));
        assert!(s.fighters[0].last_punch_at.is_none());
    }

    #[test]
    fn blocked_punches_break_guard_on_third() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[1].guard = Guard::Blocking;
        let mut out = TickOutput::default();
        for (i, t) in [0, 400, 800].into_iter().enumerate() {
            assert!(try_punch(&mut s, &config, 0, t, &mut out));
            assert_eq!(s.fighters[1].vitals.health, 1000.0);
            assert_eq!(s.fighters[1].dot.is_some(), i == 2);
        }
        tick_damage_over_time(&mut s, 1.0, 1000, &mut out);
        assert!((s.fighters[1].vitals.health - 970.0).abs() < 1e-3);
        assert!(!s.fighters[1].is_stunned(1000));
        tick_damage_over_time(&mut s, 1.0, 3800, &mut out);
        assert!((s.fighters[1].vitals.health - 970.0).abs() < 1e-3, "expired");
    }

    #[test]
    fn third_landed_punch_knocks_back() {
        let config = FightConfig::default();
        let mut s = close_state();
        let start = s.fighters[1].pos.x;
        let mut out = TickOutput::default();
        try_punch(&mut s, &config, 0, 0, &mut out);
        try_punch(&mut s, &config, 0, 400, &mut out);
        assert_eq!(s.fighters[1].pos.x, start);
        try_punch(&mut s, &config, 0, 800, &mut out);
        assert_eq!(s.fighters[1].pos.x, start + 100.0);
        assert!(out.cues.iter().any(|c| matches!(c, Cue::CameraShake { .. })));
    }

    #[test]
    fn streak_forgotten_after_gap() {
        let config = FightConfig::default();
        let mut s = close_state();
        let start = s.fighters[1].pos.x;
        let mut out = TickOutput::default();
        try_punch(&mut s, &config, 0, 0, &mut out);
        try_punch(&mut s, &config, 0, 400, &mut out);
        try_punch(&mut s, &config, 0, 2000, &mut out);
        assert_eq!(s.fighters[1].pos.x, start);
        assert_eq!(s.fighters[0].streak.landed, 1);
    }

    #[test]
    fn shot_costs_energy_and_cools_down() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[0].vitals.energy = 300.0;
        let mut out = TickOutput::default();
        assert!(try_shoot(&mut s, &config, 0, 0, &mut out));
        assert!(!try_shoot(&mut s, &config, 0, 499, &mut out));
        assert!(try_shoot(&mut s, &config, 0, 500, &mut out));
        assert_eq!(s.fighters[0].vitals.energy, 100.0);
        assert_eq!(s.projectiles.len(), 2);
        assert_eq!(s.projectiles[0].vel, Vec2::new(450.0, 0.0));
    }

    #[test]
    fn shot_without_energy_rejected() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[0].vitals.energy = 99.0;
        let mut out = TickOutput::default();
        assert!(!try_shoot(&mut s, &config, 0, 0, &mut out));
        assert!(s.projectiles.is_empty());
        assert!(s.fighters[0].last_shot_at.is_none());
    }

    #[test]
    fn blocking_target_takes_quarter_projectile_damage() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[1].guard = Guard::Blocking;
        let center = s.fighters[1].center(&config);
        s.projectiles.push(Projectile::toward(
            1, 0, center, center + Vec2::X, 1.0, 0.0, 100.0, false, 0,
        ));
        let mut out = TickOutput::default();
        resolve_projectiles(&mut s, &config, 0.016, 16, &mut out);
        assert_eq!(s.fighters[1].vitals.health, 975.0);
        assert!(!s.fighters[1].is_stunned(16));
        assert!(s.projectiles.is_empty());
    }

    #[test]
    fn jump_arc_lands() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[0].vel.y = config.jump_velocity;
        s.fighters[0].grounded = false;
        integrate(&mut s, &config, 0.1);
        assert!(s.fighters[0].pos.y > 0.0);
        for _ in 0..20 {
            integrate(&mut s, &config, 0.1);
        }
        assert_eq!(s.fighters[0].pos.y, 0.0);
        assert!(s.fighters[0].grounded);
    }

    #[test]
    fn positions_clamped_to_stage() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.fighters[0].vel.x = -100_000.0;
        integrate(&mut s, &config, 0.1);
        assert_eq!(s.fighters[0].pos.x, config.body_half_width);
    }

    #[test]
    fn reticle_clamped_to_stage() {
        let config = FightConfig::default();
        let mut s = close_state();
        s.reticle = Some(Vec2::new(10.0, 10.0));
        let input = FrameInput {
            move_x: -1.0,
            move_y: 1.0,
            ..FrameInput::default()
        };
        steer_reticle(&mut s, &config, &input, 0.1);
        assert_eq!(s.reticle, Some(Vec2::new(0.0, 60.0)));
    }
}
