//! Special-ability recognition, activation, and ongoing effects.
//!
//! Every frame each of a fighter's ability buffers samples the frame's
//! symbols in firing order. A completed pattern activates the ability; windup
//! and channel abilities then run from the fighter's single effect slot.

use glam::Vec2;
use smallvec::SmallVec;

use brawl_core::game_trait::{FighterIndex, GameEvent};
use brawl_core::timed::Timed;

use crate::config::FightConfig;
use crate::fighter::{ActiveEffect, Buff};
use crate::input::{FrameInput, Symbol};
use crate::presentation::{Anim, Cue};
use crate::roster::{AbilityId, AbilityKind};
use crate::sequence::{Observation, PATTERN_LEN};
use crate::{BrawlState, TickOutput};

/// Run every ability buffer of `idx` against this frame's input.
///
/// Returns the finishing symbol of every pattern that matched. Those symbols
/// are spent on the combo and do not also trigger the basic action.
pub fn resolve_specials(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    input: &FrameInput,
    now: u64,
    out: &mut TickOutput,
) -> SmallVec<[Symbol; 2]> {
    let mut finished = SmallVec::new();
    for slot in 0..state.fighters[idx].abilities.len() {
        let fighter = &mut state.fighters[idx];
        let ability = fighter.abilities[slot].ability;
        if !fighter.has_ability(ability, now) {
            fighter.abilities[slot].matcher.clear();
            continue;
        }
        let cost = ability.cost(&config.abilities);
        let affordable = fighter.vitals.can_afford(cost);
        let matcher = &mut fighter.abilities[slot].matcher;
        let finisher = matcher.pattern()[PATTERN_LEN - 1];
        let sample = matcher.sample(&input.symbols);
        if matcher.observe(now, affordable, sample) == Observation::Matched {
            finished.push(finisher);
            activate(state, config, idx, ability, now, out);
        }
    }

    let fighter = &mut state.fighters[idx];
    let held = fighter.stolen.filter(|s| !s.is_expired(now)).map(|s| s.kind);
    let Some(matcher) = fighter.invoke_stolen.as_mut() else {
        return finished;
    };
    let Some(stolen) = held else {
        matcher.clear();
        return finished;
    };
    let affordable = fighter
        .vitals
        .can_afford(stolen.cost(&config.abilities));
    let finisher = matcher.pattern()[PATTERN_LEN - 1];
    let sample = matcher.sample(&input.symbols);
    if matcher.observe(now, affordable, sample) == Observation::Matched {
        finished.push(finisher);
        activate(state, config, idx, stolen, now, out);
    }
    finished
}

/// End a running channel of `idx`. Windups are left to resolve.
pub fn interrupt_channel(state: &mut BrawlState, idx: FighterIndex) {
    let fighter = &mut state.fighters[idx];
    if let ActiveEffect::Channel { ability, .. } = fighter.effect {
        fighter.effect = ActiveEffect::Idle;
        tracing::debug!(fighter = idx, ability = ability.name(), "Channel interrupted");
    }
}

/// Activate `ability` for `idx`, spending its cost. Returns false if rejected.
///
/// Windup and channel abilities are rejected while the effect slot is busy.
/// Steal is rejected while a stolen ability is still held or when the
/// opponent has nothing left to take.
pub fn activate(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    ability: AbilityId,
    now: u64,
    out: &mut TickOutput,
) -> bool {
    let tuning = &config.abilities;
    let opp = BrawlState::opponent(idx);
    let cost = ability.cost(tuning);

    if ability.kind() != AbilityKind::Instant && !state.fighters[idx].effect.is_idle() {
        tracing::debug!(fighter = idx, ability = ability.name(), "Effect slot busy, ignoring");
        return false;
    }

    if ability == AbilityId::Steal {
        return steal(state, config, idx, now, out);
    }

    if !state.fighters[idx].vitals.spend_energy(cost) {
        return false;
    }

    match ability {
        AbilityId::Transform => {
            let fighter = &mut state.fighters[idx];
            fighter.buffs.retain(|b| b.kind != Buff::Transformed);
            fighter
                .buffs
                .push(Timed::start(Buff::Transformed, now, tuning.transform_duration_ms));
        },
        AbilityId::GroundSlam => {
            let fighter = &mut state.fighters[idx];
            fighter.effect = ActiveEffect::Windup {
                ability,
                resolve_at: now.saturating_add(tuning.ground_slam_windup_ms),
            };
            fighter.vel.x = 0.0;
        },
        AbilityId::DrainBeam => {
            state.fighters[idx].effect = ActiveEffect::Channel {
                ability,
                released_since: None,
            };
        },
        AbilityId::Mend => {
            let vitals = &mut state.fighters[idx].vitals;
            if vitals.has_failsafe() && vitals.health <= 0.0 {
                vitals.set_secondary_health(vitals.secondary_health + tuning.mend_amount);
            } else {
                vitals.set_health(vitals.health + tuning.mend_amount);
            }
        },
        AbilityId::PiercingShot => {
            let aim = state.aim(idx, config);
            state.spawn_projectile(
                idx,
                aim.origin,
                aim.target,
                aim.speed,
                tuning.piercing_shot_damage,
                true,
                now,
            );
        },
        AbilityId::Volley => {
            let aim = state.aim(idx, config);
            let dir = (aim.target - aim.origin)
                .try_normalize()
                .unwrap_or(Vec2::new(state.fighters[idx].facing, 0.0));
            let spread = tuning.volley_spread_deg.to_radians();
            for angle in [-spread, 0.0, spread] {
                let heading = Vec2::from_angle(angle).rotate(dir);
                state.spawn_projectile(
                    idx,
                    aim.origin,
                    aim.origin + heading,
                    aim.speed,
                    tuning.volley_damage,
                    false,
                    now,
                );
            }
        },
        AbilityId::Blink => {
            let target_x = state.fighters[opp].pos.x;
            let offset = if state.fighters[idx].pos.x <= target_x {
                tuning.blink_offset
            } else {
                -tuning.blink_offset
            };
            let half = config.body_half_width;
            let max_x = (state.stage.width - half).max(half);
            let fighter = &mut state.fighters[idx];
            fighter.pos.x = (target_x + offset).clamp(half, max_x);
            fighter.vel.x = 0.0;
            out.cues.push(Cue::Flash { duration_ms: 120 });
        },
        // Routed to `steal` before spending.
        AbilityId::Steal => {},
    }

    tracing::debug!(fighter = idx, ability = ability.name(), "Ability activated");
    out.events.push(GameEvent::AbilityUsed {
        fighter: idx,
        ability: ability.name().to_string(),
    });
    out.cues.push(Cue::Animation {
        fighter: idx,
        anim: Anim::Special(ability),
    });
    true
}

fn steal(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    now: u64,
    out: &mut TickOutput,
) -> bool {
    let opp = BrawlState::opponent(idx);
    if state.fighters[idx].stolen.is_some_and(|s| !s.is_expired(now)) {
        tracing::debug!(fighter = idx, "Already holding a stolen ability");
        return false;
    }
    let victim = &state.fighters[opp];
    let Some(taken) = victim
        .archetype
        .abilities()
        .iter()
        .copied()
        .find(|&a| a.stealable() && victim.has_ability(a, now))
    else {
        tracing::debug!(fighter = idx, "Nothing to steal");
        return false;
    };
    if !state.fighters[idx]
        .vitals
        .spend_energy(AbilityId::Steal.cost(&config.abilities))
    {
        return false;
    }

    let duration = config.abilities.steal_duration_ms;
    let grant = Timed::start(taken, now, duration);
    state.fighters[idx].stolen = Some(grant);
    state.fighters[opp].lost.insert(taken, grant.expires_at);
    if let Some(slot) = state.fighters[opp]
        .abilities
        .iter_mut()
        .find(|s| s.ability == taken)
    {
        slot.matcher.clear();
    }

    tracing::info!(thief = idx, victim = opp, ability = taken.name(), "Ability stolen");
    out.events.push(GameEvent::AbilityStolen {
        thief: idx,
        victim: opp,
        ability: taken.name().to_string(),
    });
    out.cues.push(Cue::Animation {
        fighter: idx,
        anim: Anim::Special(AbilityId::Steal),
    });
    true
}

/// Advance the effect slot of `idx`: resolve due windups, run channels.
pub fn tick_effects(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    input: &FrameInput,
    dt: f32,
    now: u64,
    out: &mut TickOutput,
) {
    match state.fighters[idx].effect {
        ActiveEffect::Idle => {},
        ActiveEffect::Windup {
            ability,
            resolve_at,
        } => {
            if now > resolve_at {
                state.fighters[idx].effect = ActiveEffect::Idle;
                resolve_windup(state, config, idx, ability, now, out);
            }
        },
        ActiveEffect::Channel {
            ability,
            released_since,
        } => tick_channel(state, config, idx, ability, released_since, input, dt, now, out),
    }
}

fn resolve_windup(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    ability: AbilityId,
    now: u64,
    out: &mut TickOutput,
) {
    let tuning = &config.abilities;
    let opp = BrawlState::opponent(idx);
    if ability == AbilityId::GroundSlam {
        out.cues.push(Cue::CameraShake {
            intensity: 8.0,
            duration_ms: 300,
        });
        let target = &state.fighters[opp];
        let in_reach = state.fighters[idx].distance_to(target) <= tuning.ground_slam_radius;
        if in_reach && !target.is_blocking() {
            state.strike(opp, tuning.ground_slam_damage, tuning.ground_slam_stun_ms, now, out);
        }
    }
    tracing::debug!(fighter = idx, ability = ability.name(), "Windup resolved");
}

#[allow(clippy::too_many_arguments)]
fn tick_channel(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    ability: AbilityId,
    released_since: Option<u64>,
    input: &FrameInput,
    dt: f32,
    now: u64,
    out: &mut TickOutput,
) {
    let tuning = &config.abilities;
    let released_since = if input.shoot_held {
        None
    } else {
        Some(released_since.unwrap_or(now))
    };
    let released_too_long =
        released_since.is_some_and(|t| now.saturating_sub(t) > tuning.drain_beam_release_grace_ms);

    let fighter = &mut state.fighters[idx];
    fighter.vitals.add_energy(-tuning.drain_beam_energy_per_sec * dt);
    if released_too_long || fighter.vitals.energy <= 0.0 {
        fighter.effect = ActiveEffect::Idle;
        tracing::debug!(fighter = idx, ability = ability.name(), "Channel ended");
        return;
    }
    fighter.effect = ActiveEffect::Channel {
        ability,
        released_since,
    };

    let opp = BrawlState::opponent(idx);
    if state.fighters[idx].distance_to(&state.fighters[opp]) <= tuning.drain_beam_radius {
        state.strike(opp, tuning.drain_beam_dps * dt, 0, now, out);
    }
}

/// Drop expired buffs, debuffs, and stolen grants. Lost abilities come back.
pub fn expire_timers(state: &mut BrawlState, now: u64) {
    for (idx, fighter) in state.fighters.iter_mut().enumerate() {
        fighter.buffs.retain(|b| !b.is_expired(now));
        if fighter.dot.is_some_and(|d| d.is_expired(now)) {
            fighter.dot = None;
        }
        if let Some(stolen) = fighter.stolen
            && stolen.is_expired(now)
        {
            tracing::debug!(fighter = idx, ability = stolen.kind.name(), "Stolen ability expired");
            fighter.stolen = None;
            if let Some(matcher) = fighter.invoke_stolen.as_mut() {
                matcher.clear();
            }
        }
        fighter.lost.retain(|_, until| now < *until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_core::scene::{MatchMode, MatchSetup};

    use crate::fighter::Guard;
    use crate::input::Symbol::{self, Jump, Left, Punch, Right, Shoot};
    use crate::roster::Archetype;

    fn state(characters: [u8; 2]) -> BrawlState {
        let setup = MatchSetup {
            mode: MatchMode::Versus,
            map: "dojo".to_string(),
            characters,
        };
        BrawlState::new(&setup, &[1, 2], &FightConfig::default())
    }

    fn frame(symbols: &[Symbol]) -> FrameInput {
        FrameInput {
            symbols: symbols.iter().copied().collect(),
            ..FrameInput::default()
        }
    }

    /// Feed `pattern` to fighter `idx` at 100ms intervals starting at `start`.
    fn enter(
        state: &mut BrawlState,
        config: &FightConfig,
        idx: FighterIndex,
        pattern: &[Symbol],
        start: u64,
        out: &mut TickOutput,
    ) {
        for (i, &s) in pattern.iter().enumerate() {
            resolve_specials(state, config, idx, &frame(&[s]), start + i as u64 * 100, out);
        }
    }

    #[test]
    fn transform_fires_and_spends_energy() {
        let config = FightConfig::default();
        let mut s = state([0, 1]);
        s.fighters[0].vitals.energy = 300.0;
        let mut out = TickOutput::default();
        enter(&mut s, &config, 0, &[Left, Right, Punch], 0, &mut out);
        assert_eq!(s.fighters[0].vitals.energy, 100.0);
        assert!(s.fighters[0].is_transformed(200));
        assert!(!s.fighters[0].is_transformed(8200));
        assert_eq!(
            out.events,
            vec![GameEvent::AbilityUsed {
                fighter: 0,
                ability: "transform".to_string()
            }]
        );
    }

    #[test]
    fn unaffordable_pattern_never_fires() {
        let config = FightConfig::default();
        let mut s = state([0, 1]);
        let mut out = TickOutput::default();
        enter(&mut s, &config, 0, &[Left, Right, Punch], 0, &mut out);
        assert!(out.events.is_empty());
        assert_eq!(s.fighters[0].vitals.energy, 100.0);
    }

    #[test]
    fn ground_slam_resolves_after_windup() {
        let config = FightConfig::default();
        let mut s = state([0, 1]);
        s.fighters[0].vitals.energy = 500.0;
        s.fighters[1].pos.x = s.fighters[0].pos.x + 150.0;
        let mut out = TickOutput::default();
        enter(&mut s, &config, 0, &[Right, Left, Jump], 0, &mut out);
        assert!(s.fighters[0].effect.locks_movement());

        tick_effects(&mut s, &config, 0, &FrameInput::default(), 0.1, 900, &mut out);
        assert_eq!(s.fighters[1].vitals.health, 1000.0, "resolves only after the deadline");
        tick_effects(&mut s, &config, 0, &FrameInput::default(), 0.1, 901, &mut out);
        assert!(s.fighters[0].effect.is_idle());
        assert_eq!(s.fighters[1].vitals.health, 850.0);
        assert!(s.fighters[1].is_stunned(1000));
    }

    #[test]
    fn busy_slot_rejects_second_windup() {
        let config = FightConfig::default();
        let mut s = state([0, 1]);
        s.fighters[0].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::GroundSlam, 0, &mut out));
        assert!(!activate(&mut s, &config, 0, AbilityId::GroundSlam, 100, &mut out));
        assert_eq!(s.fighters[0].vitals.energy, 250.0);
        // Instant abilities still work.
        assert!(activate(&mut s, &config, 0, AbilityId::Transform, 100, &mut out));
    }

    #[test]
    fn drain_beam_channels_until_released() {
        let config = FightConfig::default();
        let mut s = state([1, 0]);
        s.fighters[0].vitals.energy = 500.0;
        s.fighters[1].pos.x = s.fighters[0].pos.x + 200.0;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::DrainBeam, 0, &mut out));
        assert_eq!(s.fighters[0].vitals.energy, 400.0);

        let held = FrameInput {
            shoot_held: true,
            ..FrameInput::default()
        };
        tick_effects(&mut s, &config, 0, &held, 0.5, 500, &mut out);
        assert!((s.fighters[0].vitals.energy - 360.0).abs() < 1e-3);
        assert!((s.fighters[1].vitals.health - 940.0).abs() < 1e-3);

        let released = FrameInput::default();
        tick_effects(&mut s, &config, 0, &released, 0.1, 600, &mut out);
        assert!(!s.fighters[0].effect.is_idle(), "grace period");
        tick_effects(&mut s, &config, 0, &released, 0.1, 1301, &mut out);
        assert!(s.fighters[0].effect.is_idle());
    }

    #[test]
    fn drain_beam_stops_at_empty_energy() {
        let config = FightConfig::default();
        let mut s = state([1, 0]);
        s.fighters[0].vitals.energy = 120.0;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::DrainBeam, 0, &mut out));
        let held = FrameInput {
            shoot_held: true,
            ..FrameInput::default()
        };
        tick_effects(&mut s, &config, 0, &held, 1.0, 1000, &mut out);
        assert!(s.fighters[0].effect.is_idle());
        assert_eq!(s.fighters[0].vitals.energy, 0.0);
    }

    #[test]
    fn mend_heals_primary_or_failsafe() {
        let config = FightConfig::default();
        let mut s = state([1, 0]);
        s.fighters[0].vitals.energy = 500.0;
        s.fighters[0].vitals.set_health(500.0);
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::Mend, 0, &mut out));
        assert_eq!(s.fighters[0].vitals.health, 680.0);

        s.fighters[0].vitals = crate::fighter::Vitals::new(&config, true);
        s.fighters[0].vitals.energy = 500.0;
        s.fighters[0].vitals.set_health(0.0);
        s.fighters[0].vitals.set_secondary_health(100.0);
        assert!(activate(&mut s, &config, 0, AbilityId::Mend, 0, &mut out));
        assert_eq!(s.fighters[0].vitals.health, 0.0);
        assert_eq!(s.fighters[0].vitals.secondary_health, 280.0);
    }

    #[test]
    fn volley_spawns_three_projectiles() {
        let config = FightConfig::default();
        let mut s = state([2, 0]);
        s.fighters[0].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::Volley, 0, &mut out));
        assert_eq!(s.projectiles.len(), 3);
        let ys: Vec<f32> = s.projectiles.iter().map(|p| p.vel.y).collect();
        assert!(ys[0] < 0.0 && ys[1].abs() < 1e-3 && ys[2] > 0.0);
        assert!(s.projectiles.iter().all(|p| !p.piercing && p.owner == 0));
    }

    #[test]
    fn piercing_shot_is_piercing() {
        let config = FightConfig::default();
        let mut s = state([2, 0]);
        s.fighters[0].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        enter(&mut s, &config, 0, &[Left, Right, Shoot], 0, &mut out);
        assert_eq!(s.projectiles.len(), 1);
        assert!(s.projectiles[0].piercing);
        assert_eq!(s.projectiles[0].damage, 120.0);
    }

    #[test]
    fn blink_lands_behind_opponent() {
        let config = FightConfig::default();
        let mut s = state([3, 0]);
        s.fighters[0].vitals.energy = 500.0;
        let target_x = s.fighters[1].pos.x;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::Blink, 0, &mut out));
        assert_eq!(s.fighters[0].pos.x, target_x + 80.0);
    }

    #[test]
    fn steal_lasts_exactly_thirty_seconds_both_ways() {
        let config = FightConfig::default();
        let mut s = state([3, 0]);
        s.fighters[0].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        enter(&mut s, &config, 0, &[Right, Left, Punch], 1000, &mut out);
        assert_eq!(
            out.events,
            vec![GameEvent::AbilityStolen {
                thief: 0,
                victim: 1,
                ability: "transform".to_string()
            }]
        );
        let fired_at = 1200;
        assert!(!s.fighters[1].has_ability(AbilityId::Transform, fired_at));
        assert!(s.fighters[1].has_ability(AbilityId::GroundSlam, fired_at));

        expire_timers(&mut s, fired_at + 29_999);
        assert_eq!(s.fighters[0].stolen.map(|g| g.kind), Some(AbilityId::Transform));
        assert!(s.fighters[1].lost.contains_key(&AbilityId::Transform));

        expire_timers(&mut s, fired_at + 30_000);
        assert!(s.fighters[0].stolen.is_none());
        assert!(s.fighters[1].lost.is_empty());
        assert!(s.fighters[1].has_ability(AbilityId::Transform, fired_at + 30_000));
    }

    #[test]
    fn victim_cannot_use_lost_ability() {
        let config = FightConfig::default();
        let mut s = state([3, 0]);
        s.fighters[0].vitals.energy = 500.0;
        s.fighters[1].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::Steal, 0, &mut out));
        let mut later = TickOutput::default();
        enter(&mut s, &config, 1, &[Left, Right, Punch], 100, &mut later);
        assert!(later.events.is_empty());
        assert_eq!(s.fighters[1].vitals.energy, 500.0);
    }

    #[test]
    fn second_steal_rejected_while_holding() {
        let config = FightConfig::default();
        let mut s = state([3, 0]);
        s.fighters[0].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::Steal, 0, &mut out));
        assert!(!activate(&mut s, &config, 0, AbilityId::Steal, 100, &mut out));
        assert_eq!(s.fighters[0].vitals.energy, 300.0);
    }

    #[test]
    fn thief_invokes_stolen_ability() {
        let config = FightConfig::default();
        let mut s = state([3, 0]);
        s.fighters[0].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::Steal, 0, &mut out));
        enter(&mut s, &config, 0, &[Left, Left, Shoot], 200, &mut out);
        assert!(s.fighters[0].is_transformed(500));
        assert_eq!(s.fighters[0].vitals.energy, 100.0);
    }

    #[test]
    fn invoke_buffer_idle_without_stolen_ability() {
        let config = FightConfig::default();
        let mut s = state([3, 0]);
        s.fighters[0].vitals.energy = 500.0;
        let mut out = TickOutput::default();
        enter(&mut s, &config, 0, &[Left, Left, Shoot], 0, &mut out);
        assert!(out.events.is_empty());
        assert!(s.fighters[0].invoke_stolen.as_ref().is_some_and(|m| m.buffer().is_empty()));
    }

    #[test]
    fn ground_slam_blocked_by_guard() {
        let config = FightConfig::default();
        let mut s = state([0, 1]);
        s.fighters[0].vitals.energy = 500.0;
        s.fighters[1].pos.x = s.fighters[0].pos.x + 100.0;
        s.fighters[1].guard = Guard::Blocking;
        let mut out = TickOutput::default();
        assert!(activate(&mut s, &config, 0, AbilityId::GroundSlam, 0, &mut out));
        tick_effects(&mut s, &config, 0, &FrameInput::default(), 0.1, 800, &mut out);
        assert_eq!(s.fighters[1].vitals.health, 1000.0);
    }

    #[test]
    fn archetypes_resolve_from_characters() {
        let s = state([3, 2]);
        assert_eq!(s.fighters[0].archetype, Archetype::Trickster);
        assert_eq!(s.fighters[1].archetype, Archetype::Gunner);
    }
}
