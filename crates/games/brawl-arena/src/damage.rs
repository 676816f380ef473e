use brawl_core::game_trait::FighterIndex;
use brawl_core::scene::MatchMode;

use crate::fighter::Fighter;

/// What a damage application did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageReport {
    /// Amount actually removed from the pools.
    pub dealt: f32,
    /// Primary health reached zero on this hit and the failsafe latch engaged.
    pub became_immobilized: bool,
}

/// Apply `amount` damage with `stun_ms` of hit-stun.
///
/// Fighters with a failsafe pool lose primary health first; the hit that
/// empties it engages the immobilized latch, later hits drain the failsafe.
/// Any overflow of the emptying hit is discarded, not carried into the failsafe.
pub fn apply_damage(fighter: &mut Fighter, amount: f32, stun_ms: u64, now: u64) -> DamageReport {
    let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    let mut report = DamageReport::default();
    let vitals = &mut fighter.vitals;

    if !vitals.has_failsafe() || vitals.health > 0.0 {
        let before = vitals.health;
        vitals.set_health(before - amount);
        report.dealt = before - vitals.health;
        if vitals.has_failsafe() && vitals.health <= 0.0 && !fighter.immobilized {
            fighter.immobilized = true;
            report.became_immobilized = true;
        }
    } else {
        let before = vitals.secondary_health;
        vitals.set_secondary_health(before - amount);
        report.dealt = before - vitals.secondary_health;
    }

    fighter.stun(now, stun_ms);
    report
}

/// Terminal result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Winner(FighterIndex),
    Draw,
}

/// Decide whether the match is over.
///
/// Versus: a fighter at zero primary health loses; both at zero is a draw.
/// Cooperative: fighter 0 is the shared body and loses only once its failsafe
/// pool is empty; fighter 1 is the rival and loses at zero health.
pub fn match_verdict(mode: MatchMode, fighters: &[Fighter; 2]) -> Option<Verdict> {
    match mode {
        MatchMode::Versus => {
            let down = [0usize, 1].map(|i| fighters[i].vitals.health <= 0.0);
            match down {
                [true, true] => Some(Verdict::Draw),
                [true, false] => Some(Verdict::Winner(1)),
                [false, true] => Some(Verdict::Winner(0)),
                [false, false] => None,
            }
        },
        MatchMode::Cooperative => {
            if fighters[0].is_knocked_out() {
                Some(Verdict::Winner(1))
            } else if fighters[1].vitals.health <= 0.0 {
                Some(Verdict::Winner(0))
            } else {
                None
            }
        },
    }
}

/// Re-arm gate for the match-end signal.
///
/// Returns true when the signal may fire at `now`, and records the firing.
pub fn end_signal_ready(last_fired: &mut Option<u64>, now: u64, rearm_ms: u64) -> bool {
    let ready = last_fired.is_none_or(|at| now.saturating_sub(at) >= rearm_ms);
    if ready {
        *last_fired = Some(now);
    }
    ready
}
