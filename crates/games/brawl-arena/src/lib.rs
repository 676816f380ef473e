pub mod abilities;
pub mod bot;
pub mod combat;
pub mod config;
pub mod damage;
pub mod fighter;
pub mod hud;
pub mod input;
pub mod presentation;
pub mod projectile;
pub mod roster;
pub mod sequence;
pub mod stage;

use std::collections::HashMap;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use brawl_core::codec::decode_input;
use brawl_core::game_trait::{
    BrawlGame, FighterIndex, GameConfig, GameEvent, GameMetadata, PlayerId, PlayerInputs,
};
use brawl_core::player::{KeyProfile, Player};
use brawl_core::scene::{MatchMode, MatchOutcome, MatchSetup};

use bot::RivalBot;
use config::FightConfig;
use damage::{DamageReport, Verdict, apply_damage, end_signal_ready, match_verdict};
use fighter::{Fighter, Guard};
use hud::HudSnapshot;
use input::{FrameInput, InputTracker, RawInput, Symbol};
use presentation::{Anim, AssetCatalog, Cue, PresentationHost};
use projectile::Projectile;
use roster::Archetype;
use stage::{Stage, load_stage};

/// Authoritative match state. Everything needed to resume a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrawlState {
    pub match_id: Uuid,
    pub mode: MatchMode,
    /// Roster picks as received from the selection scene.
    pub characters: [u8; 2],
    pub stage: Stage,
    /// In cooperative mode fighter 0 is the shared body and fighter 1 the rival.
    pub fighters: [Fighter; 2],
    pub projectiles: Vec<Projectile>,
    /// Cooperative aim point steered by player 2.
    pub reticle: Option<Vec2>,
    /// Match clock in milliseconds.
    pub clock_ms: u64,
    /// Sub-millisecond remainder of accumulated frame time.
    pub clock_carry: f32,
    pub next_projectile_id: u32,
    pub match_complete: bool,
    pub outcome: Option<MatchOutcome>,
    /// Last time `MatchComplete` was emitted.
    pub end_signal_at: Option<u64>,
}

/// Where a shot leaves from, where it heads, and how fast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    pub origin: Vec2,
    pub target: Vec2,
    pub speed: f32,
}

impl BrawlState {
    pub fn new(setup: &MatchSetup, players: &[PlayerId], config: &FightConfig) -> Self {
        let stage = load_stage(&setup.map);
        let coop = setup.mode == MatchMode::Cooperative;
        let controllers = if coop {
            [players.first().copied(), None]
        } else {
            [players.first().copied(), players.get(1).copied()]
        };
        let mut fighters = [0usize, 1].map(|i| {
            Fighter::new(
                Archetype::from_index(setup.characters[i]),
                controllers[i],
                stage.spawn_x[i],
                config,
                coop && i == 0,
            )
        });
        fighters[1].facing = -1.0;
        let reticle = coop.then(|| Vec2::new(stage.spawn_x[1], config.body_height * 0.5));

        Self {
            match_id: Uuid::new_v4(),
            mode: setup.mode,
            characters: setup.characters,
            stage,
            fighters,
            projectiles: Vec::new(),
            reticle,
            clock_ms: 0,
            clock_carry: 0.0,
            next_projectile_id: 0,
            match_complete: false,
            outcome: None,
            end_signal_at: None,
        }
    }

    pub fn opponent(idx: FighterIndex) -> FighterIndex {
        1 - idx
    }

    /// Distance between the two fighters.
    pub fn distance(&self) -> f32 {
        self.fighters[0].distance_to(&self.fighters[1])
    }

    /// Advance the match clock by `dt` seconds and return the new time.
    pub fn advance_clock(&mut self, dt: f32) -> u64 {
        let total = self.clock_carry + dt * 1000.0;
        let whole = total.floor();
        self.clock_carry = total - whole;
        self.clock_ms = self.clock_ms.saturating_add(whole as u64);
        self.clock_ms
    }

    /// Shot aim for `owner`: the reticle for the cooperative body, otherwise
    /// horizontally toward the opponent.
    pub fn aim(&self, owner: FighterIndex, config: &FightConfig) -> Aim {
        let me = &self.fighters[owner];
        let origin = me.muzzle(config);
        match (self.mode, self.reticle) {
            (MatchMode::Cooperative, Some(reticle)) if owner == 0 => Aim {
                origin,
                target: reticle,
                speed: config.coop_shot_speed,
            },
            _ => {
                let dx = self.fighters[Self::opponent(owner)].pos.x - me.pos.x;
                let dir = if dx == 0.0 { me.facing } else { dx.signum() };
                Aim {
                    origin,
                    target: origin + Vec2::new(dir, 0.0),
                    speed: config.versus_shot_speed,
                }
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn spawn_projectile(
        &mut self,
        owner: FighterIndex,
        origin: Vec2,
        target: Vec2,
        speed: f32,
        damage: f32,
        piercing: bool,
        now: u64,
    ) {
        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        let facing = self.fighters[owner].facing;
        self.projectiles.push(Projectile::toward(
            id, owner, origin, target, facing, speed, damage, piercing, now,
        ));
    }

    /// Damage fighter `target` through the resolver and record the outcome.
    pub(crate) fn strike(
        &mut self,
        target: FighterIndex,
        amount: f32,
        stun_ms: u64,
        now: u64,
        out: &mut TickOutput,
    ) -> DamageReport {
        let fighter = &mut self.fighters[target];
        let report = apply_damage(fighter, amount, stun_ms, now);
        if report.dealt > 0.0 {
            out.events.push(GameEvent::Damaged {
                fighter: target,
                amount: report.dealt,
                health: fighter.vitals.health,
            });
            if stun_ms > 0 {
                out.cues.push(Cue::Animation {
                    fighter: target,
                    anim: Anim::Hurt,
                });
            }
        }
        if report.became_immobilized {
            tracing::info!(fighter = target, "Primary health exhausted, body immobilized");
            out.events.push(GameEvent::Immobilized { fighter: target });
        }
        report
    }

    /// Mark the match complete with `verdict` and build the scene payload.
    fn conclude(&mut self, verdict: Verdict) -> MatchOutcome {
        let winner = match verdict {
            Verdict::Winner(idx) => Some(idx),
            Verdict::Draw => None,
        };
        let outcome = MatchOutcome {
            match_id: self.match_id,
            mode: self.mode,
            winner,
            winner_player: winner.and_then(|w| self.fighters[w].controller),
            characters: self.characters,
        };
        self.match_complete = true;
        self.outcome = Some(outcome.clone());
        self.projectiles.clear();
        for fighter in &mut self.fighters {
            fighter.vel = Vec2::ZERO;
        }
        outcome
    }
}

/// Events and presentation cues produced by one update.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub events: Vec<GameEvent>,
    pub cues: Vec<Cue>,
}

/// What a player controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Fighter(FighterIndex),
    /// Cooperative player 2: reticle and shooting from the shared body.
    Gunner,
}

/// A two-fighter Brawl match.
pub struct BrawlArena {
    state: BrawlState,
    config: FightConfig,
    roles: Vec<(PlayerId, Role)>,
    profiles: HashMap<PlayerId, KeyProfile>,
    pending_inputs: HashMap<PlayerId, RawInput>,
    trackers: HashMap<PlayerId, InputTracker>,
    bot: Option<RivalBot>,
    /// Cues from the most recent update.
    cues: Vec<Cue>,
    paused: bool,
}

impl BrawlArena {
    pub fn new() -> Self {
        Self::with_config(FightConfig::load())
    }

    /// Create a match with explicit tuning.
    pub fn with_config(config: FightConfig) -> Self {
        Self {
            state: BrawlState::new(&MatchSetup::default(), &[], &config),
            config,
            roles: Vec::new(),
            profiles: HashMap::new(),
            pending_inputs: HashMap::new(),
            trackers: HashMap::new(),
            bot: None,
            cues: Vec::new(),
            paused: false,
        }
    }

    pub fn state(&self) -> &BrawlState {
        &self.state
    }

    pub fn config(&self) -> &FightConfig {
        &self.config
    }

    pub fn hud(&self) -> HudSnapshot {
        hud::snapshot(&self.state)
    }

    /// Presentation cues recorded by the most recent update.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Push the latest frame to a rendering host.
    pub fn present(&self, host: &mut dyn PresentationHost, catalog: &AssetCatalog) {
        presentation::present(host, catalog, &self.state, &self.cues);
    }

    fn role_of(&self, player_id: PlayerId) -> Option<Role> {
        self.roles
            .iter()
            .find(|(pid, _)| *pid == player_id)
            .map(|&(_, role)| role)
    }

    /// Sample and consume the pending input of one player.
    fn sample_player(&mut self, player_id: PlayerId) -> FrameInput {
        let profile = self
            .profiles
            .get(&player_id)
            .copied()
            .unwrap_or_default();
        let raw = self.pending_inputs.get(&player_id).cloned().unwrap_or_default();
        let frame = self
            .trackers
            .entry(player_id)
            .or_default()
            .sample(&raw, profile, &self.config);
        if let Some(pending) = self.pending_inputs.get_mut(&player_id) {
            pending.clear_edges();
        }
        frame
    }

    fn step(
        &mut self,
        frames: &[FrameInput; 2],
        gunner: Option<&FrameInput>,
        dt: f32,
        now: u64,
    ) -> TickOutput {
        let state = &mut self.state;
        let config = &self.config;
        let mut out = TickOutput::default();

        abilities::expire_timers(state, now);

        for (idx, frame) in frames.iter().enumerate() {
            combat::update_stance(state, config, idx, frame, dt, now);
        }
        for (idx, frame) in frames.iter().enumerate() {
            act(state, config, idx, frame, dt, now, &mut out);
        }
        if let Some(frame) = gunner {
            combat::steer_reticle(state, config, frame, dt);
            let body = &state.fighters[0];
            if frame.shoot && !body.is_stunned(now) && body.guard == Guard::Open {
                combat::try_shoot(state, config, 0, now, &mut out);
            }
        }

        combat::integrate(state, config, dt);
        combat::resolve_projectiles(state, config, dt, now, &mut out);
        combat::tick_damage_over_time(state, dt, now, &mut out);

        if let Some(verdict) = match_verdict(state.mode, &state.fighters)
            && end_signal_ready(&mut state.end_signal_at, now, config.match_end_rearm_ms)
        {
            let outcome = state.conclude(verdict);
            tracing::info!(
                winner = ?outcome.winner,
                winner_player = ?outcome.winner_player,
                clock_ms = now,
                "Match complete"
            );
            if let Some(winner) = outcome.winner {
                out.cues.push(Cue::Animation {
                    fighter: winner,
                    anim: Anim::Victory,
                });
                out.cues.push(Cue::Animation {
                    fighter: BrawlState::opponent(winner),
                    anim: Anim::Defeat,
                });
            }
            out.events.push(GameEvent::MatchComplete { outcome });
        }
        out
    }
}

/// One fighter's action phase, after both stances are settled.
///
/// Guarding or hit-stun interrupts a running channel; windups keep counting down.
fn act(
    state: &mut BrawlState,
    config: &FightConfig,
    idx: FighterIndex,
    frame: &FrameInput,
    dt: f32,
    now: u64,
    out: &mut TickOutput,
) {
    let fighter = &mut state.fighters[idx];
    if fighter.is_stunned(now) || fighter.guard != Guard::Open {
        fighter.vel.x = 0.0;
        abilities::interrupt_channel(state, idx);
        abilities::tick_effects(state, config, idx, frame, dt, now, out);
        return;
    }

    if fighter.immobilized || fighter.effect.locks_movement() {
        fighter.vel.x = 0.0;
    } else {
        fighter.vel.x = frame.move_x * config.walk_speed;
        if frame.jump && fighter.grounded {
            fighter.vel.y = config.jump_velocity;
            fighter.grounded = false;
            out.cues.push(Cue::Animation {
                fighter: idx,
                anim: Anim::Jump,
            });
        }
    }

    // A matched combo consumes its finishing press.
    let finished = abilities::resolve_specials(state, config, idx, frame, now, out);
    if !state.fighters[idx].immobilized {
        if frame.punch && !finished.contains(&Symbol::Punch) {
            combat::try_punch(state, config, idx, now, out);
        }
        if frame.shoot && state.mode == MatchMode::Versus && !finished.contains(&Symbol::Shoot) {
            combat::try_shoot(state, config, idx, now, out);
        }
    }
    abilities::tick_effects(state, config, idx, frame, dt, now, out);
}

impl Default for BrawlArena {
    fn default() -> Self {
        Self::with_config(FightConfig::default())
    }
}

impl BrawlGame for BrawlArena {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Brawl".to_string(),
            description: "Two fighters, punches, projectiles and combo specials. Versus or co-op."
                .to_string(),
            min_players: 1,
            max_players: 2,
            estimated_match_duration: Duration::from_secs(120),
        }
    }

    fn init(&mut self, players: &[Player], config: &GameConfig) {
        let active: Vec<&Player> = players.iter().filter(|p| !p.is_spectator).collect();
        let ids: Vec<PlayerId> = active.iter().map(|p| p.id).collect();
        let setup = &config.setup;

        self.state = BrawlState::new(setup, &ids, &self.config);
        self.roles = ids
            .iter()
            .take(2)
            .enumerate()
            .map(|(i, &id)| {
                let role = match (setup.mode, i) {
                    (MatchMode::Cooperative, 1) => Role::Gunner,
                    _ => Role::Fighter(i),
                };
                (id, role)
            })
            .collect();
        self.profiles = active.iter().map(|p| (p.id, p.slot.keys)).collect();
        self.pending_inputs.clear();
        self.trackers.clear();
        self.cues.clear();
        self.paused = false;

        self.bot = (setup.mode == MatchMode::Cooperative).then(|| {
            let seed = config
                .custom
                .get("seed")
                .and_then(|v| v.as_u64())
                .unwrap_or_else(rand::random);
            RivalBot::new(seed)
        });

        tracing::info!(
            mode = ?setup.mode,
            stage = %self.state.stage.name,
            characters = ?setup.characters,
            "Match started"
        );
    }

    fn update(&mut self, dt: f32, inputs: &PlayerInputs) -> Vec<GameEvent> {
        for (&player_id, data) in &inputs.inputs {
            self.apply_input(player_id, data);
        }
        if self.paused {
            return Vec::new();
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let now = self.state.advance_clock(dt);

        if self.state.match_complete {
            self.cues.clear();
            let rearm = self.config.match_end_rearm_ms;
            if end_signal_ready(&mut self.state.end_signal_at, now, rearm)
                && let Some(outcome) = self.state.outcome.clone()
            {
                return vec![GameEvent::MatchComplete { outcome }];
            }
            return Vec::new();
        }

        let mut frames: [FrameInput; 2] = Default::default();
        let mut gunner = None;
        for (player_id, role) in self.roles.clone() {
            let frame = self.sample_player(player_id);
            match role {
                Role::Fighter(idx) => frames[idx] = frame,
                Role::Gunner => gunner = Some(frame),
            }
        }
        if let Some(bot) = &mut self.bot {
            frames[1] = bot.decide(&self.state, 1, now, &self.config);
        }

        let out = self.step(&frames, gunner.as_ref(), dt, now);
        self.cues = out.cues;
        out.events
    }

    brawl_core::brawl_game_boilerplate!(state_type: BrawlState);

    fn apply_input(&mut self, player_id: PlayerId, input: &[u8]) {
        if self.role_of(player_id).is_none() {
            tracing::debug!(player_id, "Dropped input from player without a fighter");
            return;
        }
        match decode_input::<RawInput>(input) {
            Err(e) => {
                tracing::debug!(player_id, error = %e, "Dropped malformed brawl input");
            },
            Ok(mut raw) => {
                raw.sanitize();
                if let Some(existing) = self.pending_inputs.get_mut(&player_id) {
                    existing.merge(raw);
                } else {
                    self.pending_inputs.insert(player_id, raw);
                }
            },
        }
    }

    fn player_left(&mut self, player_id: PlayerId) {
        let Some(role) = self.role_of(player_id) else {
            return;
        };
        self.pending_inputs.remove(&player_id);
        if self.state.match_complete {
            return;
        }
        let winner = match (self.state.mode, role) {
            (MatchMode::Versus, Role::Fighter(idx)) => BrawlState::opponent(idx),
            // Either cooperative player leaving hands the match to the rival.
            _ => 1,
        };
        let outcome = self.state.conclude(Verdict::Winner(winner));
        self.state.end_signal_at = None;
        tracing::info!(player_id, winner = ?outcome.winner, "Player left, match forfeited");
    }

    fn outcome(&self) -> Option<MatchOutcome> {
        self.state.outcome.clone()
    }
}
