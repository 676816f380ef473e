use serde::{Deserialize, Serialize};

use crate::config::AbilityTuning;
use crate::input::Symbol;

/// Selectable character archetypes, in roster order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    #[default]
    Brawler,
    Mystic,
    Gunner,
    Trickster,
}

impl Archetype {
    pub const ROSTER: [Archetype; 4] = [
        Archetype::Brawler,
        Archetype::Mystic,
        Archetype::Gunner,
        Archetype::Trickster,
    ];

    /// Resolve a selection index. Unknown indices fall back to the default archetype.
    pub fn from_index(index: u8) -> Self {
        Self::ROSTER
            .get(index as usize)
            .copied()
            .unwrap_or_default()
    }

    pub fn index(self) -> u8 {
        match self {
            Self::Brawler => 0,
            Self::Mystic => 1,
            Self::Gunner => 2,
            Self::Trickster => 3,
        }
    }

    /// Special abilities in firing order.
    pub fn abilities(self) -> &'static [AbilityId] {
        match self {
            Self::Brawler => &[AbilityId::Transform, AbilityId::GroundSlam],
            Self::Mystic => &[AbilityId::DrainBeam, AbilityId::Mend],
            Self::Gunner => &[AbilityId::PiercingShot, AbilityId::Volley],
            Self::Trickster => &[AbilityId::Blink, AbilityId::Steal],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Brawler => "brawler",
            Self::Mystic => "mystic",
            Self::Gunner => "gunner",
            Self::Trickster => "trickster",
        }
    }
}

/// How an ability resolves once its sequence matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Effect applies on the matching frame.
    Instant,
    /// Effect applies once a resolve-at deadline passes; movement is locked meanwhile.
    Windup,
    /// Effect applies every frame while the trigger is held and energy remains.
    Channel,
}

/// Named special abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityId {
    Transform,
    GroundSlam,
    DrainBeam,
    Mend,
    PiercingShot,
    Volley,
    Blink,
    Steal,
}

/// Pattern a trickster enters to fire a stolen ability.
pub const INVOKE_STOLEN_PATTERN: [Symbol; 3] = [Symbol::Left, Symbol::Left, Symbol::Shoot];

impl AbilityId {
    pub fn pattern(self) -> [Symbol; 3] {
        use Symbol::{Jump, Left, Punch, Right, Shoot};
        match self {
            Self::Transform => [Left, Right, Punch],
            Self::GroundSlam => [Right, Left, Jump],
            Self::DrainBeam => [Right, Left, Shoot],
            Self::Mend => [Left, Right, Jump],
            Self::PiercingShot => [Left, Right, Shoot],
            Self::Volley => [Right, Left, Punch],
            Self::Blink => [Left, Right, Jump],
            Self::Steal => [Right, Left, Punch],
        }
    }

    pub fn kind(self) -> AbilityKind {
        match self {
            Self::GroundSlam => AbilityKind::Windup,
            Self::DrainBeam => AbilityKind::Channel,
            _ => AbilityKind::Instant,
        }
    }

    pub fn cost(self, tuning: &AbilityTuning) -> f32 {
        match self {
            Self::Transform => tuning.transform_cost,
            Self::GroundSlam => tuning.ground_slam_cost,
            Self::DrainBeam => tuning.drain_beam_cost,
            Self::Mend => tuning.mend_cost,
            Self::PiercingShot => tuning.piercing_shot_cost,
            Self::Volley => tuning.volley_cost,
            Self::Blink => tuning.blink_cost,
            Self::Steal => tuning.steal_cost,
        }
    }

    /// Whether a trickster can take this ability from an opponent.
    pub fn stealable(self) -> bool {
        self != Self::Steal
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::GroundSlam => "ground_slam",
            Self::DrainBeam => "drain_beam",
            Self::Mend => "mend",
            Self::PiercingShot => "piercing_shot",
            Self::Volley => "volley",
            Self::Blink => "blink",
            Self::Steal => "steal",
        }
    }
}
