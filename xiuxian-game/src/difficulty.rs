//! Difficulty presets applied when a new character is created.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Read-only preset values for a [`Difficulty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifficultySettings {
    pub talent_min: u8,
    pub talent_max: u8,
    pub starting_pills: u32,
}

impl DifficultySettings {
    #[must_use]
    pub const fn talent_range(&self) -> RangeInclusive<u8> {
        self.talent_min..=self.talent_max
    }
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Normal, Self::Hard];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }

    /// Parse a label case-insensitively; anything unknown is `Normal`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn settings(self) -> DifficultySettings {
        match self {
            Self::Easy => DifficultySettings {
                talent_min: 5,
                talent_max: 10,
                starting_pills: 3,
            },
            Self::Normal => DifficultySettings {
                talent_min: 1,
                talent_max: 10,
                starting_pills: 1,
            },
            Self::Hard => DifficultySettings {
                talent_min: 1,
                talent_max: 6,
                starting_pills: 0,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_labels_fall_back_to_normal() {
        assert_eq!(Difficulty::from_label("nightmare"), Difficulty::Normal);
        assert_eq!(Difficulty::from_label(""), Difficulty::Normal);
        assert_eq!(Difficulty::from_label(" HARD "), Difficulty::Hard);
        assert_eq!(Difficulty::from_label("easy"), Difficulty::Easy);
    }

    #[test]
    fn presets_match_table() {
        let easy = Difficulty::Easy.settings();
        assert_eq!(easy.talent_range(), 5..=10);
        assert_eq!(easy.starting_pills, 3);
        assert_eq!(Difficulty::Normal.settings().starting_pills, 1);
        let hard = Difficulty::Hard.settings();
        assert_eq!(hard.talent_range(), 1..=6);
        assert_eq!(hard.starting_pills, 0);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Difficulty::Hard).unwrap(),
            "\"hard\""
        );
    }
}
