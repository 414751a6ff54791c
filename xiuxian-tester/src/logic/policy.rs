use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use xiuxian_game::{ActionId, Character, GameCore};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub action: ActionId,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(action: ActionId, rationale: impl Into<String>) -> Self {
        Self {
            action,
            rationale: Some(rationale.into()),
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select the next action for the live game.
    fn pick_action(&mut self, core: &GameCore) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayStrategy {
    Meditator,
    Cultivator,
    Balanced,
    Reckless,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 5] = [
        Self::Meditator,
        Self::Cultivator,
        Self::Balanced,
        Self::Reckless,
        Self::Random,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Meditator => "Meditator",
            Self::Cultivator => "Cultivator",
            Self::Balanced => "Balanced",
            Self::Reckless => "Reckless",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Meditator => "meditator",
            Self::Cultivator => "cultivator",
            Self::Balanced => "balanced",
            Self::Reckless => "reckless",
            Self::Random => "random",
        }
    }

    /// Parse a CLI key. `recommend` is accepted for the balanced strategy.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        if key == "recommend" {
            return Some(Self::Balanced);
        }
        Self::ALL.into_iter().find(|strategy| strategy.key() == key)
    }

    /// Strategies that never spend their last health points.
    #[must_use]
    pub const fn is_cautious(self) -> bool {
        matches!(self, Self::Meditator | Self::Cultivator | Self::Balanced)
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Meditator => Box::new(MeditatorPolicy),
            Self::Cultivator => Box::new(CultivatorPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Reckless => Box::new(RecklessPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Health at or below which cautious policies stop spending health.
const SAFE_HEALTH: u32 = 10;
/// Health below which a held pill is swallowed.
const PILL_HEALTH: u32 = 25;

struct MeditatorPolicy;
struct CultivatorPolicy;
struct BalancedPolicy;
struct RecklessPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

fn character(core: &GameCore) -> Option<&Character> {
    core.character()
}

/// Shared recovery step for cautious policies.
fn recover(character: &Character) -> Option<PolicyDecision> {
    if character.pills() > 0 && character.health.current() < PILL_HEALTH {
        return Some(PolicyDecision::new(ActionId::ConsumePill, "low health, pill held"));
    }
    if character.health.current() <= SAFE_HEALTH {
        return Some(PolicyDecision::new(ActionId::Wait, "health too low to meditate"));
    }
    None
}

impl PlayerPolicy for MeditatorPolicy {
    fn name(&self) -> &'static str {
        "Meditator"
    }

    fn pick_action(&mut self, core: &GameCore) -> PolicyDecision {
        let Some(character) = character(core) else {
            return PolicyDecision::new(ActionId::Wait, "no character");
        };
        recover(character)
            .unwrap_or_else(|| PolicyDecision::new(ActionId::Meditate, "keep the streak going"))
    }
}

impl PlayerPolicy for CultivatorPolicy {
    fn name(&self) -> &'static str {
        "Cultivator"
    }

    fn pick_action(&mut self, core: &GameCore) -> PolicyDecision {
        let Some(character) = character(core) else {
            return PolicyDecision::new(ActionId::Wait, "no character");
        };
        if core.is_action_available(ActionId::Cultivate.as_str()) {
            return PolicyDecision::new(
                ActionId::Cultivate,
                format!("mana {}", character.mana.current()),
            );
        }
        recover(character)
            .unwrap_or_else(|| PolicyDecision::new(ActionId::Meditate, "refill mana"))
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_action(&mut self, core: &GameCore) -> PolicyDecision {
        let Some(character) = character(core) else {
            return PolicyDecision::new(ActionId::Wait, "no character");
        };
        let advice = core.rules().recommendation(character);
        let Some(suggested) = advice.suggested_action() else {
            return PolicyDecision::new(ActionId::Wait, advice.message());
        };
        let safe_meditation =
            suggested != ActionId::Meditate || character.health.current() > SAFE_HEALTH;
        if safe_meditation && core.is_action_available(suggested.as_str()) {
            return PolicyDecision::new(suggested, advice.message());
        }
        PolicyDecision::new(ActionId::Wait, "advice unavailable, resting")
    }
}

impl PlayerPolicy for RecklessPolicy {
    fn name(&self) -> &'static str {
        "Reckless"
    }

    fn pick_action(&mut self, core: &GameCore) -> PolicyDecision {
        if core.is_action_available(ActionId::Cultivate.as_str()) {
            PolicyDecision::new(ActionId::Cultivate, "cultivate at any cost")
        } else {
            PolicyDecision::new(ActionId::Meditate, "meditate regardless of health")
        }
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_action(&mut self, core: &GameCore) -> PolicyDecision {
        let available = core.available_actions();
        if available.is_empty() {
            return PolicyDecision::new(ActionId::Wait, "nothing available");
        }
        let info = available[self.rng.gen_range(0..available.len())];
        PolicyDecision::new(info.id, format!("rolled {}", info.display_name))
    }
}
