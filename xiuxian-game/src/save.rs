//! Versioned JSON save format.
//!
//! Loading validates every field before anything is built, so a rejected save
//! can never leave a half-restored character behind.
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::character::Character;
use crate::constants::{HEALTH_MAX, MANA_MAX, SAVE_CHECKSUM_SEED, SAVE_VERSION};
use crate::difficulty::Difficulty;
use crate::journal::GameLog;
use crate::progression::{ParseRealmError, Progression, Realm};
use crate::resources::ItemKind;
use crate::talent::TalentScore;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("corrupt save: {0}")]
    UnknownRealm(#[from] ParseRealmError),
    #[error("corrupt save: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("corrupt save: {field} = {value} is out of range")]
    OutOfRange { field: &'static str, value: u64 },
    #[error("corrupt save: checksum mismatch (expected {expected}, found {found})")]
    ChecksumMismatch { expected: String, found: String },
    #[error("no active game to save")]
    NoActiveGame,
}

/// Character fields as they appear on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCharacter {
    pub name: String,
    pub hp: u32,
    pub mp: u32,
    pub pills: u32,
    pub meditation_streak: u32,
    pub total_actions: u32,
    /// Realm display name.
    pub realm: String,
    /// Experience within the current realm.
    pub exp: u32,
    pub total_exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talent: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub is_game_over: bool,
    #[serde(default)]
    pub log_entries: Vec<String>,
    pub character: SavedCharacter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Validated state ready to replace the live game.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredGame {
    pub character: Character,
    pub log: GameLog,
    pub difficulty: Difficulty,
    pub is_game_over: bool,
}

impl SaveFile {
    /// Snapshot live state, stamped with the current version and a checksum.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Malformed`] if the snapshot cannot be serialized.
    pub fn capture(
        character: &Character,
        log: &GameLog,
        difficulty: Difficulty,
        is_game_over: bool,
    ) -> Result<Self, SaveError> {
        let mut save = Self {
            version: SAVE_VERSION.to_string(),
            difficulty,
            is_game_over,
            log_entries: log.iter().map(str::to_string).collect(),
            character: SavedCharacter {
                name: character.name.clone(),
                hp: character.health.current(),
                mp: character.mana.current(),
                pills: character.pills(),
                meditation_streak: character.meditation_streak,
                total_actions: character.total_actions,
                realm: character.realm().display_name().to_string(),
                exp: character.progression.level_experience(),
                total_exp: character.progression.total_experience(),
                talent: Some(character.talent.value()),
            },
            checksum: None,
        };
        save.checksum = Some(save.compute_checksum()?);
        Ok(save)
    }

    /// # Errors
    ///
    /// Returns [`SaveError::Malformed`] when the text is not a save object.
    pub fn from_json(text: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    ///
    /// Returns [`SaveError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// XXH64 of the save with its checksum field cleared, as lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Malformed`] if serialization fails.
    pub fn compute_checksum(&self) -> Result<String, SaveError> {
        let unsigned = Self {
            checksum: None,
            ..self.clone()
        };
        let bytes = serde_json::to_vec(&unsigned)?;
        let mut hasher = XxHash64::with_seed(SAVE_CHECKSUM_SEED);
        hasher.write(&bytes);
        Ok(format!("{:016x}", hasher.finish()))
    }

    /// Validate every field and build the state to install.
    ///
    /// `draw_talent` is only called for saves without a talent, after all
    /// checks have passed.
    ///
    /// # Errors
    ///
    /// Returns the first [`SaveError`] found; nothing is built on failure.
    pub fn restore(
        &self,
        draw_talent: impl FnOnce() -> TalentScore,
    ) -> Result<RestoredGame, SaveError> {
        if self.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: self.version.clone(),
            });
        }
        if let Some(found) = &self.checksum {
            let expected = self.compute_checksum()?;
            if &expected != found {
                return Err(SaveError::ChecksumMismatch {
                    expected,
                    found: found.clone(),
                });
            }
        }

        let saved = &self.character;
        let realm: Realm = saved.realm.parse()?;
        check_range("hp", u64::from(saved.hp), u64::from(HEALTH_MAX))?;
        check_range("mp", u64::from(saved.mp), u64::from(MANA_MAX))?;
        if let Some(threshold) = realm.threshold() {
            check_range("exp", u64::from(saved.exp), u64::from(threshold) - 1)?;
        }
        if saved.total_exp < u64::from(saved.exp) {
            return Err(SaveError::OutOfRange {
                field: "total_exp",
                value: saved.total_exp,
            });
        }
        let talent = match saved.talent {
            Some(raw) => TalentScore::new(raw).ok_or(SaveError::OutOfRange {
                field: "talent",
                value: u64::from(raw),
            })?,
            None => draw_talent(),
        };

        let mut character = Character::new(saved.name.clone(), talent);
        character.health.set_current(saved.hp);
        character.mana.set_current(saved.mp);
        character.inventory.set_count(ItemKind::Pill, saved.pills);
        character.meditation_streak = saved.meditation_streak;
        character.total_actions = saved.total_actions;
        character.progression = Progression::restore(realm, saved.exp, saved.total_exp);

        let mut log = GameLog::default();
        log.replace(self.log_entries.clone());

        Ok(RestoredGame {
            character,
            log,
            difficulty: self.difficulty,
            is_game_over: self.is_game_over,
        })
    }
}

fn check_range(field: &'static str, value: u64, max: u64) -> Result<(), SaveError> {
    if value > max {
        return Err(SaveError::OutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveFile {
        let mut character = Character::new("Lin", TalentScore::new(7).unwrap());
        character.health.set_current(80);
        character.inventory.add(ItemKind::Pill, 2);
        character.progression = Progression::restore(Realm::Foundation, 42, 142);
        let mut log = GameLog::default();
        log.push("You meditate.");
        SaveFile::capture(&character, &log, Difficulty::Hard, false).unwrap()
    }

    fn fixed_talent() -> TalentScore {
        TalentScore::MIN
    }

    #[test]
    fn capture_and_restore_preserve_state() {
        let save = sample();
        assert_eq!(save.version, SAVE_VERSION);
        assert_eq!(save.character.realm, "Foundation");
        let json = save.to_json().unwrap();
        let restored = SaveFile::from_json(&json)
            .unwrap()
            .restore(fixed_talent)
            .unwrap();
        assert_eq!(restored.character.health.current(), 80);
        assert_eq!(restored.character.pills(), 2);
        assert_eq!(restored.character.talent.value(), 7);
        assert_eq!(restored.character.realm(), Realm::Foundation);
        assert_eq!(restored.character.progression.level_experience(), 42);
        assert_eq!(restored.difficulty, Difficulty::Hard);
        assert_eq!(restored.log.last(), Some("You meditate."));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut save = sample();
        save.version = "1.0.0".to_string();
        save.checksum = None;
        let err = save.restore(fixed_talent).unwrap_err();
        assert!(matches!(err, SaveError::VersionMismatch { ref found, .. } if found == "1.0.0"));
    }

    #[test]
    fn unknown_realm_is_corrupt() {
        let mut save = sample();
        save.character.realm = "Golden Core".to_string();
        save.checksum = None;
        let err = save.restore(fixed_talent).unwrap_err();
        assert!(matches!(err, SaveError::UnknownRealm(_)));
        assert!(err.to_string().contains("Golden Core"));
    }

    #[test]
    fn tampered_fields_fail_checksum() {
        let mut save = sample();
        save.character.pills = 99;
        assert!(matches!(
            save.restore(fixed_talent),
            Err(SaveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut save = sample();
        save.checksum = None;
        save.character.hp = 101;
        assert!(matches!(
            save.restore(fixed_talent),
            Err(SaveError::OutOfRange { field: "hp", .. })
        ));

        let mut save = sample();
        save.checksum = None;
        save.character.exp = 200;
        assert!(matches!(
            save.restore(fixed_talent),
            Err(SaveError::OutOfRange { field: "exp", .. })
        ));

        let mut save = sample();
        save.checksum = None;
        save.character.talent = Some(0);
        assert!(matches!(
            save.restore(fixed_talent),
            Err(SaveError::OutOfRange { field: "talent", .. })
        ));
    }

    #[test]
    fn minimal_save_without_optional_fields_loads() {
        let json = r#"{
            "version": "2.0.0",
            "character": {
                "name": "Mei", "hp": 50, "mp": 20, "pills": 0,
                "meditation_streak": 0, "total_actions": 3,
                "realm": "Qi Refining", "exp": 10, "total_exp": 10
            }
        }"#;
        let mut drawn = false;
        let restored = SaveFile::from_json(json)
            .unwrap()
            .restore(|| {
                drawn = true;
                TalentScore::MAX
            })
            .unwrap();
        assert!(drawn);
        assert_eq!(restored.character.talent, TalentScore::MAX);
        assert_eq!(restored.difficulty, Difficulty::Normal);
        assert!(restored.log.is_empty());
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            SaveFile::from_json("{not json"),
            Err(SaveError::Malformed(_))
        ));
    }
}
