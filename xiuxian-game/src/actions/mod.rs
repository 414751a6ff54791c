//! Action catalog: the polymorphic player actions and their registration table.
//!
//! Every action is dispatched through a stable [`ActionId`]; display names and
//! hotkeys are presentation metadata carried by [`ActionInfo`] and never used
//! for game logic.

mod consume_pill;
mod cultivate;
mod meditate;
mod wait;

pub use consume_pill::ConsumePill;
pub use cultivate::Cultivate;
pub use meditate::Meditate;
pub use wait::Wait;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::character::{Character, Cost};
use crate::journal::GameLog;
use crate::progression::Breakthrough;

pub const EFFECT_HP_RECOVERY: &str = "hp_recovery";
pub const EFFECT_MP_RECOVERY: &str = "mp_recovery";
pub const EFFECT_EXP_GAIN: &str = "exp_gain";
pub const EFFECT_PILL_BONUS: &str = "pill_bonus";
pub const EFFECT_LEVEL_UP: &str = "level_up";
pub const EFFECT_NEW_LEVEL: &str = "new_level";

pub(crate) const MSG_CANNOT_ACT: &str = "You are too weak to act.";

/// Stable identifier of a catalog action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    Meditate,
    ConsumePill,
    Cultivate,
    Wait,
}

impl ActionId {
    pub const ALL: [Self; 4] = [Self::Meditate, Self::ConsumePill, Self::Cultivate, Self::Wait];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meditate => "meditate",
            Self::ConsumePill => "consume_pill",
            Self::Cultivate => "cultivate",
            Self::Wait => "wait",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Action not found: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for ActionId {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

/// A single effect value reported by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Flag(bool),
    Amount(i64),
    Text(String),
}

impl From<u32> for EffectValue {
    fn from(value: u32) -> Self {
        Self::Amount(i64::from(value))
    }
}

impl From<bool> for EffectValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<String> for EffectValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Structured outcome of one action execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub effects: BTreeMap<String, EffectValue>,
    #[serde(default)]
    pub costs: BTreeMap<String, u32>,
}

impl ActionResult {
    /// A failed result carrying no effects or costs.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            effects: BTreeMap::new(),
            costs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn amount(&self, key: &str) -> Option<i64> {
        match self.effects.get(key) {
            Some(EffectValue::Amount(value)) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn leveled_up(&self) -> bool {
        matches!(self.effects.get(EFFECT_LEVEL_UP), Some(EffectValue::Flag(true)))
    }

    #[must_use]
    pub fn new_level(&self) -> Option<&str> {
        match self.effects.get(EFFECT_NEW_LEVEL) {
            Some(EffectValue::Text(name)) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Magnitudes an action would request before pool clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Projection {
    pub health: u32,
    pub mana: u32,
    pub experience: u32,
    pub pills: u32,
}

/// Presentation metadata for a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    pub id: ActionId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub hotkey: char,
    pub sort_order: u8,
}

/// Capability set shared by every player action.
pub trait Action: fmt::Debug {
    fn id(&self) -> ActionId;

    fn cost(&self) -> Cost;

    /// Eligibility gate checked before any mutation.
    fn can_execute(&self, character: &Character) -> bool;

    /// Effect magnitudes this action would request right now.
    fn projected_effects(&self, character: &Character) -> Projection;

    /// Apply cost and effects. Ineligible characters are left untouched.
    fn execute(&self, character: &mut Character, log: &mut GameLog) -> ActionResult;

    fn failure_message(&self, character: &Character) -> String {
        if character.is_alive() {
            format!("Unable to {}.", self.id().as_str().replace('_', " "))
        } else {
            MSG_CANNOT_ACT.to_string()
        }
    }
}

/// Fold a breakthrough into the effects map and message parts.
fn record_breakthrough(
    breakthrough: Breakthrough,
    character: &Character,
    effects: &mut BTreeMap<String, EffectValue>,
    parts: &mut Vec<String>,
) {
    if !breakthrough.occurred {
        return;
    }
    if let Some(message) = breakthrough.message {
        parts.push(message);
    }
    effects.insert(EFFECT_LEVEL_UP.to_string(), true.into());
    effects.insert(
        EFFECT_NEW_LEVEL.to_string(),
        character.realm().display_name().to_string().into(),
    );
}

/// Join message parts, log them, and build the successful result.
fn finish(
    parts: &[String],
    effects: BTreeMap<String, EffectValue>,
    cost: &Cost,
    log: &mut GameLog,
) -> ActionResult {
    let message = parts.join(" ");
    log.push(message.clone());
    ActionResult {
        success: true,
        message,
        effects,
        costs: cost.to_map(),
    }
}

struct CatalogEntry {
    info: ActionInfo,
    action: Box<dyn Action>,
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Registration table mapping [`ActionId`] to its implementation.
#[derive(Debug)]
pub struct ActionCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionCatalog {
    /// The four built-in actions in menu order.
    #[must_use]
    pub fn standard() -> Self {
        let mut entries = vec![
            CatalogEntry {
                info: ActionInfo {
                    id: ActionId::Meditate,
                    display_name: "Meditate",
                    description: "Enter a meditative state to recover mana and gain a little experience.",
                    hotkey: '1',
                    sort_order: 1,
                },
                action: Box::new(Meditate),
            },
            CatalogEntry {
                info: ActionInfo {
                    id: ActionId::ConsumePill,
                    display_name: "Consume Pill",
                    description: "Swallow a pill to quickly restore health and mana.",
                    hotkey: '2',
                    sort_order: 2,
                },
                action: Box::new(ConsumePill),
            },
            CatalogEntry {
                info: ActionInfo {
                    id: ActionId::Cultivate,
                    display_name: "Cultivate",
                    description: "Circulate your technique to greatly advance your cultivation.",
                    hotkey: '3',
                    sort_order: 3,
                },
                action: Box::new(Cultivate),
            },
            CatalogEntry {
                info: ActionInfo {
                    id: ActionId::Wait,
                    display_name: "Wait",
                    description: "Calm the mind and slowly recover.",
                    hotkey: '4',
                    sort_order: 4,
                },
                action: Box::new(Wait),
            },
        ];
        entries.sort_by_key(|entry| entry.info.sort_order);
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, id: ActionId) -> Option<&dyn Action> {
        self.entry(id).map(|entry| entry.action.as_ref())
    }

    #[must_use]
    pub fn info(&self, id: ActionId) -> Option<&ActionInfo> {
        self.entry(id).map(|entry| &entry.info)
    }

    /// Resolve a user-supplied key: a stable id or a hotkey.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<ActionId> {
        let key = key.trim();
        if let Ok(id) = key.parse::<ActionId>() {
            return self.entry(id).map(|entry| entry.info.id);
        }
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(hotkey), None) => self
                .entries
                .iter()
                .find(|entry| entry.info.hotkey == hotkey)
                .map(|entry| entry.info.id),
            _ => None,
        }
    }

    pub fn infos(&self) -> impl Iterator<Item = &ActionInfo> {
        self.entries.iter().map(|entry| &entry.info)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActionInfo, &dyn Action)> {
        self.entries
            .iter()
            .map(|entry| (&entry.info, entry.action.as_ref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: ActionId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.info.id == id)
    }
}
