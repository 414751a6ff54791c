//! Character aggregate composing the resource and progression components.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::DEFAULT_CHARACTER_NAME;
use crate::progression::{Progression, Realm};
use crate::resources::{HealthPool, Inventory, ItemKind, ManaPool};
use crate::talent::TalentScore;

/// Resource demand of an action. `time` is tracked but never gates anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cost {
    #[serde(default)]
    pub health: u32,
    #[serde(default)]
    pub mana: u32,
    #[serde(default)]
    pub pills: u32,
    #[serde(default)]
    pub time: u32,
}

impl Cost {
    #[must_use]
    pub const fn health(mut self, amount: u32) -> Self {
        self.health = amount;
        self
    }

    #[must_use]
    pub const fn mana(mut self, amount: u32) -> Self {
        self.mana = amount;
        self
    }

    #[must_use]
    pub const fn pills(mut self, amount: u32) -> Self {
        self.pills = amount;
        self
    }

    #[must_use]
    pub const fn time(mut self, amount: u32) -> Self {
        self.time = amount;
        self
    }

    /// Non-zero components keyed the way action results report them.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, u32> {
        [
            ("hp", self.health),
            ("mp", self.mana),
            ("pills", self.pills),
            ("time", self.time),
        ]
        .into_iter()
        .filter(|(_, value)| *value > 0)
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub health: HealthPool,
    pub mana: ManaPool,
    pub talent: TalentScore,
    pub inventory: Inventory,
    pub progression: Progression,
    /// Consecutive meditate actions since the last other action.
    pub meditation_streak: u32,
    pub total_actions: u32,
}

impl Character {
    #[must_use]
    pub fn new(name: impl Into<String>, talent: TalentScore) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() {
            DEFAULT_CHARACTER_NAME.to_string()
        } else {
            name
        };
        Self {
            name,
            health: HealthPool::default(),
            mana: ManaPool::default(),
            talent,
            inventory: Inventory::default(),
            progression: Progression::new(),
            meditation_streak: 0,
            total_actions: 0,
        }
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_empty()
    }

    #[must_use]
    pub const fn realm(&self) -> Realm {
        self.progression.realm()
    }

    #[must_use]
    pub fn pills(&self) -> u32 {
        self.inventory.pills()
    }

    /// Whether every gated component of `cost` is covered.
    #[must_use]
    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.health.current() >= cost.health
            && self.mana.current() >= cost.mana
            && self.inventory.pills() >= cost.pills
    }

    /// Deduct `cost` and count the action. No mutation when unaffordable.
    #[must_use]
    pub fn apply_cost(&mut self, cost: &Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.health.consume(cost.health);
        let spent = self.mana.consume(cost.mana);
        debug_assert!(spent, "affordability was checked");
        self.inventory.consume(ItemKind::Pill, cost.pills);
        self.total_actions = self.total_actions.saturating_add(1);
        true
    }

    /// Flat, serializable view for display layers and save files.
    #[must_use]
    pub fn summary(&self) -> CharacterSummary {
        CharacterSummary {
            name: self.name.clone(),
            hp: self.health.current(),
            max_hp: self.health.max(),
            mp: self.mana.current(),
            max_mp: self.mana.max(),
            realm: self.realm(),
            exp: self.progression.level_experience(),
            exp_progress: self.progression.progress_percentage(),
            total_exp: self.progression.total_experience(),
            talent: self.talent.value(),
            pills: self.pills(),
            meditation_streak: self.meditation_streak,
            total_actions: self.total_actions,
            alive: self.is_alive(),
        }
    }
}

/// Read-only character status bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
    pub realm: Realm,
    pub exp: u32,
    pub exp_progress: f64,
    pub total_exp: u64,
    pub talent: u8,
    pub pills: u32,
    pub meditation_streak: u32,
    pub total_actions: u32,
    pub alive: bool,
}
