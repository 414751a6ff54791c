//! Xiuxian Game Engine
//!
//! Platform-agnostic core logic for a turn-based cultivation RPG.
//! This crate provides all game mechanics without UI or platform-specific dependencies.

pub mod actions;
pub mod character;
pub mod constants;
pub mod difficulty;
pub mod engine;
pub mod events;
pub mod journal;
pub mod numbers;
pub mod progression;
pub mod resources;
pub mod rules;
pub mod save;
pub mod talent;

// Re-export commonly used types
pub use actions::{
    Action, ActionCatalog, ActionId, ActionInfo, ActionResult, ConsumePill, Cultivate,
    EffectValue, Meditate, ParseActionError, Projection, Wait,
};
pub use character::{Character, CharacterSummary, Cost};
pub use difficulty::{Difficulty, DifficultySettings};
pub use engine::{
    ActionPreview, ActionStatus, GameCore, GameSetup, GameSnapshot, GameStatistics, SessionStats,
};
pub use events::{
    Achievement, AchievementTracker, EventRecorder, EventSink, GameEvent, GameEventKind, LogSink,
    NullSink,
};
pub use journal::GameLog;
pub use progression::{Breakthrough, ParseRealmError, Progression, Realm};
pub use resources::{HealthPool, Inventory, ItemKind, ManaPool};
pub use rules::{PowerWeights, Recommendation, RuleSet};
pub use save::{RestoredGame, SaveError, SaveFile, SavedCharacter};
pub use talent::{TalentKind, TalentScore};

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a save under `slot`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    fn save_game(&self, slot: &str, save: &SaveFile) -> Result<(), Self::Error>;

    /// Fetch the save stored under `slot`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the save exists but cannot be read.
    fn load_game(&self, slot: &str) -> Result<Option<SaveFile>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, slot: &str) -> Result<(), Self::Error>;
}

/// A [`GameCore`] paired with the storage its saves go to.
pub struct GameEngine<S>
where
    S: GameStorage,
{
    core: GameCore,
    storage: S,
}

impl<S> GameEngine<S>
where
    S: GameStorage,
{
    pub const fn new(core: GameCore, storage: S) -> Self {
        Self { core, storage }
    }

    #[must_use]
    pub const fn core(&self) -> &GameCore {
        &self.core
    }

    pub const fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Save the live game to `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if no game is active or the storage write fails.
    pub fn save_game(&mut self, slot: &str) -> Result<(), anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let save = self.core.to_save()?;
        self.storage.save_game(slot, &save).map_err(Into::into)?;
        self.core.emit(&GameEvent::GameSaved {
            slot: slot.to_string(),
        });
        Ok(())
    }

    /// Load `slot` into the live game. `Ok(false)` when the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be read or fails validation; the
    /// live game is untouched in that case.
    pub fn load_game(&mut self, slot: &str) -> Result<bool, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let Some(save) = self.storage.load_game(slot).map_err(Into::into)? else {
            return Ok(false);
        };
        self.core.apply_save(&save)?;
        self.core.emit(&GameEvent::GameLoaded {
            slot: slot.to_string(),
        });
        Ok(true)
    }

    /// Delete a stored save.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage delete fails.
    pub fn delete_save(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_save(slot)
    }
}
