//! Realm ladder and the experience/breakthrough state machine.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    THRESHOLD_CORE_FORMATION, THRESHOLD_FOUNDATION, THRESHOLD_NASCENT_SOUL,
    THRESHOLD_QI_REFINING, THRESHOLD_SPIRITUAL_TRANSFORMATION,
};
use crate::numbers::ratio;

/// Six ordered cultivation realms. `Ascension` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "String", into = "String")]
pub enum Realm {
    #[default]
    QiRefining,
    Foundation,
    CoreFormation,
    NascentSoul,
    SpiritualTransformation,
    Ascension,
}

impl Realm {
    pub const ALL: [Self; 6] = [
        Self::QiRefining,
        Self::Foundation,
        Self::CoreFormation,
        Self::NascentSoul,
        Self::SpiritualTransformation,
        Self::Ascension,
    ];

    /// Display name, also used as the save-file wire format.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::QiRefining => "Qi Refining",
            Self::Foundation => "Foundation",
            Self::CoreFormation => "Core Formation",
            Self::NascentSoul => "Nascent Soul",
            Self::SpiritualTransformation => "Spiritual Transformation",
            Self::Ascension => "Ascension",
        }
    }

    /// Experience consumed to advance out of this realm; `None` for the terminal realm.
    #[must_use]
    pub const fn threshold(self) -> Option<u32> {
        match self {
            Self::QiRefining => Some(THRESHOLD_QI_REFINING),
            Self::Foundation => Some(THRESHOLD_FOUNDATION),
            Self::CoreFormation => Some(THRESHOLD_CORE_FORMATION),
            Self::NascentSoul => Some(THRESHOLD_NASCENT_SOUL),
            Self::SpiritualTransformation => Some(THRESHOLD_SPIRITUAL_TRANSFORMATION),
            Self::Ascension => None,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::QiRefining => Some(Self::Foundation),
            Self::Foundation => Some(Self::CoreFormation),
            Self::CoreFormation => Some(Self::NascentSoul),
            Self::NascentSoul => Some(Self::SpiritualTransformation),
            Self::SpiritualTransformation => Some(Self::Ascension),
            Self::Ascension => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ascension)
    }

    /// Zero-based position on the ladder.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown realm name '{0}'")]
pub struct ParseRealmError(pub String);

impl FromStr for Realm {
    type Err = ParseRealmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|realm| realm.display_name() == s)
            .ok_or_else(|| ParseRealmError(s.to_string()))
    }
}

impl TryFrom<String> for Realm {
    type Error = ParseRealmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Realm> for String {
    fn from(value: Realm) -> Self {
        value.display_name().to_string()
    }
}

/// Outcome of a single [`Progression::add_experience`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakthrough {
    pub occurred: bool,
    pub message: Option<String>,
}

impl Breakthrough {
    const fn none() -> Self {
        Self {
            occurred: false,
            message: None,
        }
    }
}

/// Accumulated experience and current realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Progression {
    total_experience: u64,
    level_experience: u32,
    realm: Realm,
}

impl Progression {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn total_experience(&self) -> u64 {
        self.total_experience
    }

    #[must_use]
    pub const fn level_experience(&self) -> u32 {
        self.level_experience
    }

    #[must_use]
    pub const fn realm(&self) -> Realm {
        self.realm
    }

    /// Add experience and advance at most one realm.
    ///
    /// Overflow above the old realm's threshold carries into the new realm;
    /// a grant large enough to cross two thresholds still advances only once.
    pub fn add_experience(&mut self, amount: u32) -> Breakthrough {
        self.total_experience = self.total_experience.saturating_add(u64::from(amount));
        self.level_experience = self.level_experience.saturating_add(amount);

        let (Some(threshold), Some(next)) = (self.realm.threshold(), self.realm.next()) else {
            return Breakthrough::none();
        };
        if self.level_experience < threshold {
            return Breakthrough::none();
        }

        self.realm = next;
        self.level_experience -= threshold;
        Breakthrough {
            occurred: true,
            message: Some(format!("Breakthrough to {next}!")),
        }
    }

    /// Progress through the current realm in `[0, 100]`; 100 for the terminal realm.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        match self.realm.threshold() {
            Some(threshold) => (ratio(self.level_experience, threshold) * 100.0).min(100.0),
            None => 100.0,
        }
    }

    /// Rebuild progression from persisted counters. Callers validate first.
    pub(crate) const fn restore(realm: Realm, level_experience: u32, total_experience: u64) -> Self {
        Self {
            total_experience,
            level_experience,
            realm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(realm: Realm, level: u32) -> Progression {
        Progression::restore(realm, level, u64::from(level))
    }

    #[test]
    fn breakthrough_carries_overflow_into_next_realm() {
        let mut progression = Progression::restore(Realm::QiRefining, 95, 0);
        let outcome = progression.add_experience(10);
        assert!(outcome.occurred);
        assert!(outcome.message.unwrap().contains("Foundation"));
        assert_eq!(progression.level_experience(), 5);
        assert_eq!(progression.realm(), Realm::Foundation);
        assert_eq!(progression.total_experience(), 10);
    }

    #[test]
    fn exact_threshold_advances_one_below_does_not() {
        let mut exact = at(Realm::QiRefining, 99);
        assert!(exact.add_experience(1).occurred);
        assert_eq!(exact.level_experience(), 0);

        let mut short = at(Realm::QiRefining, 98);
        let outcome = short.add_experience(1);
        assert!(!outcome.occurred);
        assert!(outcome.message.is_none());
        assert_eq!(short.realm(), Realm::QiRefining);
    }

    #[test]
    fn large_grant_advances_a_single_realm() {
        let mut progression = Progression::new();
        let outcome = progression.add_experience(350);
        assert!(outcome.occurred);
        assert_eq!(progression.realm(), Realm::Foundation);
        // 350 - 100 leaves 250, above Foundation's 200 until the next grant.
        assert_eq!(progression.level_experience(), 250);

        assert!(progression.add_experience(0).occurred);
        assert_eq!(progression.realm(), Realm::CoreFormation);
        assert_eq!(progression.level_experience(), 50);
    }

    #[test]
    fn ascension_is_terminal() {
        let mut progression = at(Realm::SpiritualTransformation, 1_599);
        assert!(progression.add_experience(1).occurred);
        assert_eq!(progression.realm(), Realm::Ascension);

        let outcome = progression.add_experience(10_000);
        assert!(!outcome.occurred);
        assert_eq!(progression.realm(), Realm::Ascension);
        assert!((progression.progress_percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_percentage_tracks_level_experience() {
        let progression = at(Realm::Foundation, 50);
        assert!((progression.progress_percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn realm_names_roundtrip_and_reject_unknown() {
        for realm in Realm::ALL {
            assert_eq!(realm.display_name().parse::<Realm>(), Ok(realm));
        }
        assert_eq!(
            "Golden Core".parse::<Realm>(),
            Err(ParseRealmError("Golden Core".to_string()))
        );
        let json = serde_json::to_string(&Realm::NascentSoul).unwrap();
        assert_eq!(json, "\"Nascent Soul\"");
        assert!(serde_json::from_str::<Realm>("\"Immortal\"").is_err());
    }

    #[test]
    fn realm_ladder_is_ordered() {
        let mut current = Realm::QiRefining;
        let mut steps = 0;
        while let Some(next) = current.next() {
            assert!(next > current);
            current = next;
            steps += 1;
        }
        assert_eq!(steps, 5);
        assert!(current.is_terminal());
        assert_eq!(current.ordinal(), 5);
    }
}
