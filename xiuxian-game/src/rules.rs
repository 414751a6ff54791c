//! Derived game rules: power level, breakthrough queries, and play advice.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actions::ActionId;
use crate::character::Character;
use crate::numbers::{trunc_f64_to_u64, u64_to_f64};
use crate::progression::Realm;
use crate::talent::TalentKind;

/// Weights applied to each stat when computing a power level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerWeights {
    pub health: f64,
    pub mana: f64,
    pub experience: f64,
    pub talent: f64,
    pub pills: f64,
}

impl Default for PowerWeights {
    fn default() -> Self {
        Self {
            health: 0.3,
            mana: 0.3,
            experience: 0.2,
            talent: 10.0,
            pills: 5.0,
        }
    }
}

/// Tunable rule table consulted by the engine for derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub power_weights: PowerWeights,
    /// Power multiplier per realm, indexed by [`Realm::ordinal`].
    pub realm_multipliers: [f64; 6],
    /// Health or mana fraction below which the advice turns to recovery.
    pub low_resource_ratio: f64,
    /// Mana fraction above which full cultivation is advised.
    pub high_mana_ratio: f64,
    /// Pills held above this count make full cultivation safe.
    pub comfortable_pills: u32,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            power_weights: PowerWeights::default(),
            realm_multipliers: [1.0, 1.5, 2.5, 4.0, 6.0, 10.0],
            low_resource_ratio: 0.3,
            high_mana_ratio: 0.8,
            comfortable_pills: 2,
        }
    }
}

impl RuleSet {
    #[must_use]
    pub const fn talent_multiplier(&self, kind: TalentKind) -> f64 {
        kind.multiplier()
    }

    #[must_use]
    pub fn realm_multiplier(&self, realm: Realm) -> f64 {
        self.realm_multipliers
            .get(usize::from(realm.ordinal()))
            .copied()
            .unwrap_or(1.0)
    }

    #[must_use]
    pub const fn threshold(&self, realm: Realm) -> Option<u32> {
        realm.threshold()
    }

    #[must_use]
    pub const fn next_realm(&self, realm: Realm) -> Option<Realm> {
        realm.next()
    }

    /// True when the current realm's experience already meets its threshold.
    #[must_use]
    pub fn can_breakthrough(&self, character: &Character) -> bool {
        self.threshold(character.realm())
            .is_some_and(|threshold| character.progression.level_experience() >= threshold)
    }

    /// Weighted stat total scaled by the realm multiplier; zero once dead.
    #[must_use]
    pub fn power_level(&self, character: &Character) -> u64 {
        if !character.is_alive() {
            return 0;
        }
        let weights = &self.power_weights;
        let base = f64::from(character.health.current()) * weights.health
            + f64::from(character.mana.current()) * weights.mana
            + u64_to_f64(character.progression.total_experience()) * weights.experience
            + f64::from(character.talent.value()) * weights.talent
            + f64::from(character.pills()) * weights.pills;
        trunc_f64_to_u64(base * self.realm_multiplier(character.realm()))
    }

    /// Pick advice for the character's current state, most urgent first.
    #[must_use]
    pub fn recommendation(&self, character: &Character) -> Recommendation {
        if !character.is_alive() {
            return Recommendation::Fallen;
        }
        let pills = character.pills();
        if character.health.percentage() < self.low_resource_ratio {
            return if pills > 0 {
                Recommendation::CriticalHealthTakePill
            } else {
                Recommendation::CriticalHealthRest
            };
        }
        if character.mana.percentage() < self.low_resource_ratio {
            return if pills > 0 {
                Recommendation::LowManaTakePill
            } else {
                Recommendation::LowManaMeditate
            };
        }
        if character.mana.percentage() > self.high_mana_ratio && pills > self.comfortable_pills {
            return Recommendation::CultivateFully;
        }
        if pills == 0 {
            return Recommendation::GatherPills;
        }
        Recommendation::SteadyPace
    }
}

/// Advice produced by [`RuleSet::recommendation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Fallen,
    CriticalHealthTakePill,
    CriticalHealthRest,
    LowManaTakePill,
    LowManaMeditate,
    CultivateFully,
    GatherPills,
    SteadyPace,
}

impl Recommendation {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Fallen => "Your cultivation has failed. Start again.",
            Self::CriticalHealthTakePill => "Health is critical. Take a pill to recover.",
            Self::CriticalHealthRest => "Health is critical. Rest and recover.",
            Self::LowManaTakePill => "Mana is low. Take a pill to recover.",
            Self::LowManaMeditate => "Mana is low. Meditate to restore it.",
            Self::CultivateFully => "Your state is excellent. Cultivate with full effort.",
            Self::GatherPills => "You have no pills. Meditate to condense some.",
            Self::SteadyPace => "Keep a steady pace and continue cultivating.",
        }
    }

    /// The action this advice points at; `None` once no action can help.
    #[must_use]
    pub const fn suggested_action(self) -> Option<ActionId> {
        match self {
            Self::Fallen => None,
            Self::CriticalHealthTakePill | Self::LowManaTakePill => Some(ActionId::ConsumePill),
            Self::CriticalHealthRest => Some(ActionId::Wait),
            Self::LowManaMeditate | Self::GatherPills => Some(ActionId::Meditate),
            Self::CultivateFully | Self::SteadyPace => Some(ActionId::Cultivate),
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
