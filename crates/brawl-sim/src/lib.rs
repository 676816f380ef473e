//! Headless Brawl runner.
//!
//! A scenario is a TOML file naming the match setup, an optional tuning
//! override, and a script of raw key inputs keyed by tick. The runner drives
//! a [`BrawlArena`] at a fixed step and reports what happened.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use brawl_arena::BrawlArena;
use brawl_arena::config::FightConfig;
use brawl_arena::input::RawInput;
use brawl_core::codec::{CodecError, encode_input};
use brawl_core::game_trait::{BrawlGame, GameConfig, GameEvent, PlayerId, PlayerInputs};
use brawl_core::player::{ControlSlot, KeyProfile, Player, PlayerColor};
use brawl_core::scene::{MatchMode, MatchOutcome, MatchSetup};

#[derive(Debug)]
pub enum SimError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
    Codec(CodecError),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read scenario: {e}"),
            Self::Parse(e) => write!(f, "malformed scenario: {e}"),
            Self::Invalid(m) => write!(f, "invalid scenario: {m}"),
            Self::Codec(e) => write!(f, "input encoding failed: {e}"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for SimError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<CodecError> for SimError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// One scripted input snapshot, delivered before the given tick.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptedInput {
    pub at_tick: u32,
    /// 1 or 2.
    pub player: PlayerId,
    pub keys_down: Vec<String>,
    pub keys_just_pressed: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub mode: MatchMode,
    pub map: String,
    pub characters: [u8; 2],
    pub ticks: u32,
    /// Fixed step in seconds.
    pub dt: f32,
    /// Seeds the cooperative rival.
    pub seed: u64,
    /// Stop as soon as the match completes.
    pub stop_on_complete: bool,
    pub fight: FightConfig,
    pub inputs: Vec<ScriptedInput>,
}

impl Default for Scenario {
    fn default() -> Self {
        let setup = MatchSetup::default();
        Self {
            mode: setup.mode,
            map: setup.map,
            characters: setup.characters,
            ticks: 3600,
            dt: 1.0 / 60.0,
            seed: 0,
            stop_on_complete: true,
            fight: FightConfig::default(),
            inputs: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> Result<Self, SimError> {
        let scenario: Self = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), SimError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::Invalid(format!("dt must be positive, got {}", self.dt)));
        }
        if let Some(bad) = self.inputs.iter().find(|i| !(1..=2).contains(&i.player)) {
            return Err(SimError::Invalid(format!(
                "input at tick {} names player {}",
                bad.at_tick, bad.player
            )));
        }
        Ok(())
    }
}

/// Read and validate a scenario file.
pub fn load_scenario(path: &str) -> Result<Scenario, SimError> {
    let contents = std::fs::read_to_string(path)?;
    Scenario::from_toml_str(&contents)
}

/// What a simulated match produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub ticks_run: u32,
    pub clock_ms: u64,
    pub outcome: Option<MatchOutcome>,
    /// Remaining primary health per fighter.
    pub health: [f32; 2],
    pub damage_dealt: [f32; 2],
    /// Ability names in the order they fired.
    pub abilities_used: Vec<String>,
    pub thefts: u32,
}

fn players() -> Vec<Player> {
    [(1, KeyProfile::Wasd), (2, KeyProfile::Arrows)]
        .into_iter()
        .enumerate()
        .map(|(i, (id, keys))| Player {
            id,
            display_name: format!("Player{id}"),
            color: PlayerColor::PALETTE[i],
            slot: ControlSlot {
                keys,
                gamepad: Some(i as u8),
            },
            is_spectator: false,
        })
        .collect()
}

/// Drive a match through the scenario script.
pub fn run_scenario(scenario: &Scenario) -> Result<SimReport, SimError> {
    scenario.validate()?;

    let mut game = BrawlArena::with_config(scenario.fight.clone());
    let config = GameConfig {
        setup: MatchSetup {
            mode: scenario.mode,
            map: scenario.map.clone(),
            characters: scenario.characters,
        },
        custom: HashMap::from([("seed".to_string(), serde_json::json!(scenario.seed))]),
    };
    game.init(&players(), &config);

    let mut script: HashMap<u32, Vec<&ScriptedInput>> = HashMap::new();
    for input in &scenario.inputs {
        script.entry(input.at_tick).or_default().push(input);
    }

    let mut report = SimReport {
        ticks_run: 0,
        clock_ms: 0,
        outcome: None,
        health: [0.0; 2],
        damage_dealt: [0.0; 2],
        abilities_used: Vec::new(),
        thefts: 0,
    };
    let empty = PlayerInputs::default();

    for tick in 0..scenario.ticks {
        for input in script.get(&tick).into_iter().flatten() {
            let raw = RawInput {
                keys_down: input.keys_down.clone(),
                keys_just_pressed: input.keys_just_pressed.clone(),
                gamepad: None,
            };
            game.apply_input(input.player, &encode_input(&raw)?);
        }

        let events = game.update(scenario.dt, &empty);
        report.ticks_run = tick + 1;
        let mut completed = false;
        for event in events {
            match event {
                GameEvent::Damaged { fighter, amount, .. } => {
                    // Damage is credited to the attacker, the other fighter.
                    report.damage_dealt[1 - fighter] += amount;
                },
                GameEvent::AbilityUsed { fighter, ability } => {
                    tracing::debug!(tick, fighter, ability = %ability, "Ability fired");
                    report.abilities_used.push(ability);
                },
                GameEvent::AbilityStolen { .. } => report.thefts += 1,
                GameEvent::Immobilized { fighter } => {
                    tracing::info!(tick, fighter, "Body immobilized");
                },
                GameEvent::MatchComplete { .. } => completed = true,
            }
        }
        if completed && scenario.stop_on_complete {
            break;
        }
    }

    let state = game.state();
    report.clock_ms = state.clock_ms;
    report.health = [state.fighters[0].vitals.health, state.fighters[1].vitals.health];
    report.outcome = game.outcome();
    tracing::info!(
        ticks = report.ticks_run,
        clock_ms = report.clock_ms,
        complete = report.outcome.is_some(),
        "Scenario finished"
    );
    Ok(report)
}
