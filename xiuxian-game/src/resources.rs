//! Resource pools tracked on a character: health, mana, and the item inventory.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{HEALTH_MAX, MANA_MAX};
use crate::numbers::ratio;

/// Health pool. Damage always goes through, saturating at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPool {
    current: u32,
    max: u32,
}

impl Default for HealthPool {
    fn default() -> Self {
        Self::new(HEALTH_MAX)
    }
}

impl HealthPool {
    /// A full pool with the given capacity.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Raise `current` by up to `amount`, returning the amount actually added.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current - before
    }

    /// Lower `current` by up to `amount`, returning the amount actually removed.
    pub fn consume(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_sub(amount);
        before - self.current
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        ratio(self.current, self.max)
    }

    /// Overwrite the current value, clamped to the pool bounds.
    pub(crate) fn set_current(&mut self, value: u32) {
        self.current = value.min(self.max);
    }
}

/// Mana pool. Starts half full; spending is all-or-nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    current: u32,
    max: u32,
}

impl Default for ManaPool {
    fn default() -> Self {
        Self::new(MANA_MAX)
    }
}

impl ManaPool {
    /// A pool with the given capacity, initially half full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self {
            current: max / 2,
            max,
        }
    }

    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Raise `current` by up to `amount`, returning the amount actually added.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current - before
    }

    /// Spend exactly `amount`, or nothing at all when the pool is short.
    pub fn consume(&mut self, amount: u32) -> bool {
        if self.current < amount {
            return false;
        }
        self.current -= amount;
        true
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        ratio(self.current, self.max)
    }

    pub(crate) fn set_current(&mut self, value: u32) {
        self.current = value.min(self.max);
    }
}

/// Closed set of inventory items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Pill,
}

impl ItemKind {
    pub const ALL: [Self; 1] = [Self::Pill];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pill => "pill",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pill" => Ok(Self::Pill),
            _ => Err(()),
        }
    }
}

/// Item counts keyed by [`ItemKind`]. Every known kind is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<ItemKind, u32>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            items: ItemKind::ALL.iter().map(|kind| (*kind, 0)).collect(),
        }
    }
}

impl Inventory {
    #[must_use]
    pub fn count(&self, kind: ItemKind) -> u32 {
        self.items.get(&kind).copied().unwrap_or(0)
    }

    /// Add `amount` items. Returns false if the kind is not tracked.
    pub fn add(&mut self, kind: ItemKind, amount: u32) -> bool {
        match self.items.get_mut(&kind) {
            Some(slot) => {
                *slot = slot.saturating_add(amount);
                true
            }
            None => false,
        }
    }

    /// Remove `amount` items, or nothing at all when there are not enough.
    pub fn consume(&mut self, kind: ItemKind, amount: u32) -> bool {
        match self.items.get_mut(&kind) {
            Some(slot) if *slot >= amount => {
                *slot -= amount;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn pills(&self) -> u32 {
        self.count(ItemKind::Pill)
    }

    pub(crate) fn set_count(&mut self, kind: ItemKind, amount: u32) {
        self.items.insert(kind, amount);
    }
}
