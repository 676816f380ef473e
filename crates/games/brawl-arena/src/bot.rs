use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use brawl_core::game_trait::FighterIndex;

use crate::BrawlState;
use crate::config::FightConfig;
use crate::input::{FrameInput, Symbol};

/// How often the rival re-plans its intent.
const DECISION_INTERVAL_MS: u64 = 250;

/// Chance per frame to swing once in range and off cooldown.
const PUNCH_CHANCE: f64 = 0.35;

/// Fraction of punch range the rival closes to before stopping.
const APPROACH_FRACTION: f32 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Intent {
    #[default]
    Approach,
    Guard,
    Retreat,
    Hold,
}

/// Computer-controlled rival for cooperative matches.
///
/// Walks, punches and guards. Never draws special abilities.
#[derive(Debug, Clone)]
pub struct RivalBot {
    rng: StdRng,
    intent: Intent,
    next_decision_at: u64,
}

impl RivalBot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            intent: Intent::Approach,
            next_decision_at: 0,
        }
    }

    /// Produce this frame's input for fighter `me`.
    pub fn decide(
        &mut self,
        state: &BrawlState,
        me: FighterIndex,
        now: u64,
        config: &FightConfig,
    ) -> FrameInput {
        let mine = &state.fighters[me];
        let target = &state.fighters[BrawlState::opponent(me)];
        if mine.vitals.health <= 0.0 {
            return FrameInput::default();
        }

        let dx = target.pos.x - mine.pos.x;
        let dist = mine.distance_to(target);

        if now >= self.next_decision_at {
            self.intent = self.pick_intent(dist, config);
            self.next_decision_at = now + DECISION_INTERVAL_MS;
        }

        let mut input = FrameInput::default();
        match self.intent {
            Intent::Approach => {
                if dist > config.punch_range * APPROACH_FRACTION {
                    input.move_x = dx.signum();
                }
            },
            Intent::Retreat => input.move_x = -dx.signum(),
            Intent::Guard => input.block_held = true,
            Intent::Hold => {},
        }

        let ready = mine
            .last_punch_at
            .is_none_or(|at| now.saturating_sub(at) >= config.punch_cooldown_ms);
        if !input.block_held
            && dist <= config.punch_range
            && ready
            && self.rng.random_bool(PUNCH_CHANCE)
        {
            input.punch = true;
            input.symbols.push(Symbol::Punch);
        }
        input
    }

    fn pick_intent(&mut self, dist: f32, config: &FightConfig) -> Intent {
        if dist > config.block_range {
            return if self.rng.random_bool(0.85) {
                Intent::Approach
            } else {
                Intent::Hold
            };
        }
        match self.rng.random_range(0..20u8) {
            0..10 => Intent::Approach,
            10..15 => Intent::Guard,
            15..18 => Intent::Retreat,
            _ => Intent::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_core::scene::{MatchMode, MatchSetup};

    fn coop_state() -> BrawlState {
        let setup = MatchSetup {
            mode: MatchMode::Cooperative,
            ..MatchSetup::default()
        };
        BrawlState::new(&setup, &[1, 2], &FightConfig::default())
    }

    #[test]
    fn far_rival_walks_toward_body() {
        let config = FightConfig::default();
        let state = coop_state();
        let mut bot = RivalBot::new(7);
        let mut moved = 0;
        for t in 0..40 {
            let input = bot.decide(&state, 1, t * DECISION_INTERVAL_MS, &config);
            assert!(input.move_x <= 0.0, "body is to the left");
            assert!(!input.punch, "out of range");
            if input.move_x < 0.0 {
                moved += 1;
            }
        }
        assert!(moved > 20);
    }

    #[test]
    fn close_rival_eventually_punches() {
        let config = FightConfig::default();
        let mut state = coop_state();
        state.fighters[1].pos.x = state.fighters[0].pos.x + 60.0;
        let mut bot = RivalBot::new(3);
        let punched = (0..200).any(|t| bot.decide(&state, 1, t * 16, &config).punch);
        assert!(punched);
    }

    #[test]
    fn bot_never_enters_combo_directions() {
        let config = FightConfig::default();
        let mut state = coop_state();
        state.fighters[1].pos.x = state.fighters[0].pos.x + 60.0;
        let mut bot = RivalBot::new(11);
        for t in 0..200 {
            let input = bot.decide(&state, 1, t * 16, &config);
            assert!(input.symbols.iter().all(|s| *s == Symbol::Punch));
        }
    }

    #[test]
    fn same_seed_same_choices() {
        let config = FightConfig::default();
        let mut state = coop_state();
        state.fighters[1].pos.x = state.fighters[0].pos.x + 100.0;
        let mut a = RivalBot::new(42);
        let mut b = RivalBot::new(42);
        for t in 0..100 {
            assert_eq!(
                a.decide(&state, 1, t * 16, &config),
                b.decide(&state, 1, t * 16, &config)
            );
        }
    }
}
