//! Per-character talent and the talent-scaled bonus formula.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::constants::{
    TALENT_MAX, TALENT_MIN, TALENT_MULT_CULTIVATE, TALENT_MULT_MEDITATE, TALENT_MULT_PILL,
};
use crate::numbers::trunc_f64_to_u32;

/// Which multiplier row of the talent table an effect uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TalentKind {
    Meditate,
    Cultivate,
    Pill,
}

impl TalentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meditate => "meditate",
            Self::Cultivate => "cultivate",
            Self::Pill => "pill",
        }
    }

    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Meditate => TALENT_MULT_MEDITATE,
            Self::Cultivate => TALENT_MULT_CULTIVATE,
            Self::Pill => TALENT_MULT_PILL,
        }
    }
}

impl fmt::Display for TalentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Talent score in `[1, 10]`, fixed for the life of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TalentScore(u8);

impl TalentScore {
    pub const MIN: Self = Self(TALENT_MIN);
    pub const MAX: Self = Self(TALENT_MAX);

    /// Build a score, rejecting values outside `[1, 10]`.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (TALENT_MIN..=TALENT_MAX)
            .contains(&value)
            .then_some(Self(value))
    }

    /// Draw a score uniformly from `range`, clamped to the legal bounds.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R, range: RangeInclusive<u8>) -> Self {
        let low = (*range.start()).clamp(TALENT_MIN, TALENT_MAX);
        let high = (*range.end()).clamp(low, TALENT_MAX);
        Self(rng.gen_range(low..=high))
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// `base + talent * multiplier(kind)`, truncated toward zero.
    #[must_use]
    pub fn bonus(self, base: u32, kind: TalentKind) -> u32 {
        trunc_f64_to_u32(f64::from(base) + f64::from(self.0) * kind.multiplier())
    }
}

impl TryFrom<u8> for TalentScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!("talent {value} outside {TALENT_MIN}..={TALENT_MAX}")
        })
    }
}

impl From<TalentScore> for u8 {
    fn from(value: TalentScore) -> Self {
        value.0
    }
}

impl fmt::Display for TalentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
