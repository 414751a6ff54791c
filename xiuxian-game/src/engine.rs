//! Turn engine owning the character, the log, and the notification sinks.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;

use crate::actions::{
    ActionCatalog, ActionId, ActionInfo, ActionResult, EFFECT_EXP_GAIN, EFFECT_PILL_BONUS,
    ParseActionError, Projection,
};
use crate::character::{Character, CharacterSummary, Cost};
use crate::constants::{
    JOURNAL_RECENT_DEFAULT, LOG_ASCENSION, LOG_DEATH, LOG_GAME_ENDED, MEDITATION_STREAK_INTERVAL,
};
use crate::difficulty::Difficulty;
use crate::events::{EventSink, GameEvent};
use crate::journal::GameLog;
use crate::progression::Realm;
use crate::resources::ItemKind;
use crate::rules::{Recommendation, RuleSet};
use crate::save::{SaveError, SaveFile};
use crate::talent::TalentScore;

/// Options for starting a new game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSetup {
    pub name: Option<String>,
    pub difficulty: Difficulty,
    /// Fixed talent; drawn from the difficulty's range when absent.
    pub talent: Option<TalentScore>,
}

impl GameSetup {
    #[must_use]
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn talent(mut self, talent: TalentScore) -> Self {
        self.talent = Some(talent);
        self
    }
}

/// Counters accumulated over one game session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub actions: BTreeMap<ActionId, u32>,
    pub failed_actions: u32,
    pub pills_consumed: u32,
    pub pills_earned: u32,
    pub breakthroughs: u32,
    pub longest_meditation_streak: u32,
    pub experience_gained: u64,
}

impl SessionStats {
    fn record_success(&mut self, id: ActionId, result: &ActionResult, character: &Character) {
        *self.actions.entry(id).or_default() += 1;
        if id == ActionId::ConsumePill {
            self.pills_consumed += 1;
        }
        if let Some(bonus) = result.amount(EFFECT_PILL_BONUS) {
            self.pills_earned += u32::try_from(bonus).unwrap_or(0);
        }
        if let Some(gain) = result.amount(EFFECT_EXP_GAIN) {
            self.experience_gained += u64::try_from(gain).unwrap_or(0);
        }
        if result.leveled_up() {
            self.breakthroughs += 1;
        }
        self.longest_meditation_streak = self
            .longest_meditation_streak
            .max(character.meditation_streak);
    }
}

/// Statistics summary for the current game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStatistics {
    pub session: SessionStats,
    pub total_actions: u32,
    pub realm: Option<Realm>,
    pub power_level: u64,
    pub is_game_over: bool,
}

/// Presentation status of one catalog action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionStatus {
    pub info: ActionInfo,
    pub available: bool,
    pub cost: Cost,
}

/// Read-only bundle consumed by rendering layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub character: CharacterSummary,
    pub log: Vec<String>,
    pub actions: Vec<ActionStatus>,
    pub is_game_over: bool,
    pub difficulty: Difficulty,
    pub power_level: u64,
    pub recommendation: Recommendation,
}

/// What an action would do right now, computed without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionPreview {
    pub id: ActionId,
    pub available: bool,
    /// Why the action would fail, when it would.
    pub reason: Option<String>,
    pub cost: Cost,
    pub projected: Projection,
}

/// Single-session turn engine.
///
/// `GameCore` exclusively owns the character. Every mutation goes through
/// [`GameCore::execute_action`], [`GameCore::start`]/[`GameCore::reset`], or
/// [`GameCore::apply_save`].
pub struct GameCore {
    character: Option<Character>,
    log: GameLog,
    difficulty: Difficulty,
    game_over: bool,
    catalog: ActionCatalog,
    rules: RuleSet,
    talent_rng: ChaCha20Rng,
    sinks: Vec<Box<dyn EventSink>>,
    stats: SessionStats,
}

impl fmt::Debug for GameCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameCore")
            .field("character", &self.character)
            .field("difficulty", &self.difficulty)
            .field("game_over", &self.game_over)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl GameCore {
    /// Create an engine with no character yet. `seed` fixes every talent draw.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            character: None,
            log: GameLog::default(),
            difficulty: Difficulty::default(),
            game_over: false,
            catalog: ActionCatalog::standard(),
            rules: RuleSet::default(),
            talent_rng: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"talent")),
            sinks: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn add_sink(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Start a game from a difficulty label. Unknown labels mean `normal`.
    pub fn initialize(&mut self, name: Option<&str>, difficulty: &str) -> bool {
        let mut setup = GameSetup::new(Difficulty::from_label(difficulty));
        setup.name = name.map(str::to_string);
        self.start(setup)
    }

    /// Build a fresh character and enter the active state.
    pub fn start(&mut self, setup: GameSetup) -> bool {
        let settings = setup.difficulty.settings();
        let talent = setup
            .talent
            .unwrap_or_else(|| TalentScore::roll(&mut self.talent_rng, settings.talent_range()));
        let mut character = Character::new(setup.name.unwrap_or_default(), talent);
        character
            .inventory
            .add(ItemKind::Pill, settings.starting_pills);

        self.log = GameLog::default();
        self.log.push(format!(
            "Welcome, {}! Your cultivation journey begins.",
            character.name
        ));
        self.log.push(format!(
            "Your talent is {talent}/10 on {} difficulty.",
            setup.difficulty
        ));

        let event = GameEvent::GameStarted {
            name: character.name.clone(),
            talent: talent.value(),
            difficulty: setup.difficulty,
        };
        self.character = Some(character);
        self.difficulty = setup.difficulty;
        self.game_over = false;
        self.stats = SessionStats::default();
        self.emit(&event);
        true
    }

    /// Start over, reusing the previous name and difficulty unless given.
    pub fn reset(&mut self, name: Option<&str>, difficulty: Option<&str>) -> bool {
        let name = name
            .map(str::to_string)
            .or_else(|| self.character.as_ref().map(|c| c.name.clone()));
        let difficulty = difficulty.map_or(self.difficulty, Difficulty::from_label);
        let started = self.start(GameSetup {
            name,
            difficulty,
            talent: None,
        });
        if let Some(character) = &self.character {
            let event = GameEvent::GameReset {
                name: character.name.clone(),
                difficulty,
            };
            self.emit(&event);
        }
        started
    }

    /// Resolve one turn. Every failure comes back as `success == false`.
    pub fn execute_action(&mut self, action_id: &str) -> ActionResult {
        if self.game_over {
            self.stats.failed_actions += 1;
            return ActionResult::failure(LOG_GAME_ENDED);
        }
        let Some(character) = self.character.as_mut() else {
            return ActionResult::failure(LOG_GAME_ENDED);
        };
        let action = match action_id.parse::<ActionId>() {
            Ok(id) => self.catalog.get(id),
            Err(_) => None,
        };
        let Some(action) = action else {
            self.stats.failed_actions += 1;
            return ActionResult::failure(ParseActionError(action_id.to_string()).to_string());
        };
        if !action.can_execute(character) {
            self.stats.failed_actions += 1;
            return ActionResult::failure(action.failure_message(character));
        }

        let id = action.id();
        let result = action.execute(character, &mut self.log);
        self.stats.record_success(id, &result, character);

        let mut events = vec![GameEvent::ActionExecuted {
            action: id,
            result: result.clone(),
            total_actions: character.total_actions,
        }];
        if result.leveled_up() {
            events.push(GameEvent::Breakthrough {
                realm: character.realm(),
                total_experience: character.progression.total_experience(),
            });
        }
        if let Some(amount) = result.amount(EFFECT_PILL_BONUS) {
            events.push(GameEvent::PillObtained {
                amount: u32::try_from(amount).unwrap_or(0),
                pills: character.pills(),
            });
        }
        if id == ActionId::Meditate
            && character.meditation_streak % MEDITATION_STREAK_INTERVAL == 0
        {
            events.push(GameEvent::MeditationStreak {
                streak: character.meditation_streak,
            });
        }

        if !character.is_alive() {
            self.game_over = true;
            self.log.push(LOG_DEATH);
            events.push(GameEvent::CharacterDied {
                name: character.name.clone(),
                total_actions: character.total_actions,
            });
            events.push(GameEvent::GameOver { victory: false });
        } else if character.realm().is_terminal() {
            self.game_over = true;
            self.log.push(LOG_ASCENSION);
            events.push(GameEvent::GameOver { victory: true });
        }

        for event in &events {
            self.emit(event);
        }
        result
    }

    #[must_use]
    pub const fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    #[must_use]
    pub const fn log(&self) -> &GameLog {
        &self.log
    }

    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub const fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Snapshot for rendering; `None` before the first game starts.
    #[must_use]
    pub fn game_state(&self) -> Option<GameSnapshot> {
        let character = self.character.as_ref()?;
        Some(GameSnapshot {
            character: character.summary(),
            log: self.log.recent(JOURNAL_RECENT_DEFAULT),
            actions: self
                .catalog
                .iter()
                .map(|(info, action)| ActionStatus {
                    info: *info,
                    available: !self.game_over && action.can_execute(character),
                    cost: action.cost(),
                })
                .collect(),
            is_game_over: self.game_over,
            difficulty: self.difficulty,
            power_level: self.rules.power_level(character),
            recommendation: self.rules.recommendation(character),
        })
    }

    /// Catalog entries the character could execute right now, in menu order.
    #[must_use]
    pub fn available_actions(&self) -> Vec<ActionInfo> {
        let Some(character) = self.character.as_ref().filter(|_| !self.game_over) else {
            return Vec::new();
        };
        self.catalog
            .iter()
            .filter(|(_, action)| action.can_execute(character))
            .map(|(info, _)| *info)
            .collect()
    }

    #[must_use]
    pub fn character_info(&self) -> Option<CharacterSummary> {
        self.character.as_ref().map(Character::summary)
    }

    #[must_use]
    pub fn action_cost(&self, action_id: &str) -> Option<Cost> {
        let id = action_id.parse::<ActionId>().ok()?;
        self.catalog.get(id).map(|action| action.cost())
    }

    #[must_use]
    pub fn action_description(&self, action_id: &str) -> Option<&'static str> {
        let id = action_id.parse::<ActionId>().ok()?;
        self.catalog.info(id).map(|info| info.description)
    }

    #[must_use]
    pub fn is_action_available(&self, action_id: &str) -> bool {
        self.simulate_action(action_id)
            .is_some_and(|preview| preview.available)
    }

    /// Preview an action's eligibility, cost, and requested effects.
    #[must_use]
    pub fn simulate_action(&self, action_id: &str) -> Option<ActionPreview> {
        let id = action_id.parse::<ActionId>().ok()?;
        let action = self.catalog.get(id)?;
        let character = self.character.as_ref()?;
        let reason = if self.game_over {
            Some(LOG_GAME_ENDED.to_string())
        } else if action.can_execute(character) {
            None
        } else {
            Some(action.failure_message(character))
        };
        Some(ActionPreview {
            id,
            available: reason.is_none(),
            reason,
            cost: action.cost(),
            projected: action.projected_effects(character),
        })
    }

    #[must_use]
    pub fn statistics(&self) -> GameStatistics {
        let character = self.character.as_ref();
        GameStatistics {
            session: self.stats.clone(),
            total_actions: character.map_or(0, |c| c.total_actions),
            realm: character.map(Character::realm),
            power_level: character.map_or(0, |c| self.rules.power_level(c)),
            is_game_over: self.game_over,
        }
    }

    /// Capture the live game in save form.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::NoActiveGame`] before a game has started.
    pub fn to_save(&self) -> Result<SaveFile, SaveError> {
        let character = self.character.as_ref().ok_or(SaveError::NoActiveGame)?;
        SaveFile::capture(character, &self.log, self.difficulty, self.game_over)
    }

    /// Replace the live game with a validated save.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the live game is left untouched.
    pub fn apply_save(&mut self, save: &SaveFile) -> Result<(), SaveError> {
        let range = save.difficulty.settings().talent_range();
        let rng = &mut self.talent_rng;
        let restored = match save.restore(|| TalentScore::roll(rng, range)) {
            Ok(restored) => restored,
            Err(err) => {
                log::warn!("rejected save: {err}");
                return Err(err);
            }
        };
        let character = restored.character;
        let mut log = restored.log;
        let terminal = !character.is_alive() || character.realm().is_terminal();
        if terminal && !restored.is_game_over {
            log.push(if character.is_alive() {
                LOG_ASCENSION
            } else {
                LOG_DEATH
            });
        }
        self.game_over = restored.is_game_over || terminal;
        self.character = Some(character);
        self.log = log;
        self.difficulty = restored.difficulty;
        self.stats = SessionStats::default();
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: &GameEvent) {
        for sink in &mut self.sinks {
            sink.notify(event);
        }
    }
}

/// Derive an independent RNG seed for one stream from the user seed.
fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventRecorder, GameEventKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn started(talent: u8) -> GameCore {
        let mut core = GameCore::new(42);
        core.start(
            GameSetup::new(Difficulty::Normal)
                .name("Lin")
                .talent(TalentScore::new(talent).unwrap()),
        );
        core
    }

    #[test]
    fn uninitialized_engine_rejects_actions() {
        let mut core = GameCore::new(1);
        let result = core.execute_action("meditate");
        assert!(!result.success);
        assert_eq!(result.message, LOG_GAME_ENDED);
        assert!(core.game_state().is_none());
        assert!(core.available_actions().is_empty());
        assert!(matches!(core.to_save(), Err(SaveError::NoActiveGame)));
    }

    #[test]
    fn initialize_applies_difficulty_and_logs_welcome() {
        let mut core = GameCore::new(9);
        assert!(core.initialize(Some("Mei"), "easy"));
        let character = core.character().unwrap();
        assert_eq!(character.pills(), 3);
        assert!(character.talent.value() >= 5);
        assert_eq!(core.difficulty(), Difficulty::Easy);
        assert!(core.log().iter().any(|line| line.contains("Welcome, Mei")));

        assert!(core.initialize(None, "impossible"));
        assert_eq!(core.difficulty(), Difficulty::Normal);
        assert_eq!(core.character().unwrap().pills(), 1);
    }

    #[test]
    fn same_seed_draws_same_talents() {
        let mut first = GameCore::new(0xC0FFEE);
        let mut second = GameCore::new(0xC0FFEE);
        for _ in 0..5 {
            first.initialize(None, "normal");
            second.initialize(None, "normal");
            assert_eq!(
                first.character().unwrap().talent,
                second.character().unwrap().talent
            );
        }
        assert_ne!(
            derive_stream_seed(1, b"talent"),
            derive_stream_seed(2, b"talent")
        );
    }

    #[test]
    fn unknown_action_reports_name_without_mutation() {
        let mut core = started(5);
        let before = core.character().cloned();
        let result = core.execute_action("fly");
        assert!(!result.success);
        assert_eq!(result.message, "Action not found: fly");
        assert_eq!(core.character().cloned(), before);
        assert_eq!(core.statistics().session.failed_actions, 1);
    }

    #[test]
    fn display_names_are_not_dispatch_keys() {
        let mut core = started(5);
        assert!(!core.execute_action("Meditate").success);
        assert!(core.execute_action("meditate").success);
    }

    #[test]
    fn game_over_blocks_every_action_until_reset() {
        let mut core = started(5);
        core.character.as_mut().unwrap().health.set_current(1);
        assert!(core.execute_action("meditate").success);
        assert!(core.is_game_over());
        assert_eq!(core.log().last(), Some(LOG_DEATH));

        let blocked = core.execute_action("wait");
        assert_eq!(blocked.message, LOG_GAME_ENDED);
        let unknown = core.execute_action("fly");
        assert_eq!(unknown.message, LOG_GAME_ENDED);

        assert!(core.reset(None, None));
        assert!(!core.is_game_over());
        assert_eq!(core.character().unwrap().name, "Lin");
        assert_eq!(core.character().unwrap().health.current(), 100);
    }

    #[test]
    fn reaching_ascension_ends_in_victory() {
        let mut core = started(10);
        let character = core.character.as_mut().unwrap();
        character.progression = crate::progression::Progression::restore(
            Realm::SpiritualTransformation,
            1_590,
            3_090,
        );
        let recorder = Rc::new(RefCell::new(EventRecorder::default()));
        core.add_sink(Rc::clone(&recorder));

        let result = core.execute_action("cultivate");
        assert!(result.leveled_up());
        assert_eq!(result.new_level(), Some("Ascension"));
        assert!(core.is_game_over());
        assert_eq!(core.log().last(), Some(LOG_ASCENSION));
        assert!(
            recorder
                .borrow()
                .events()
                .any(|event| *event == GameEvent::GameOver { victory: true })
        );
    }

    #[test]
    fn events_follow_turn_order() {
        let mut core = started(5);
        let recorder = Rc::new(RefCell::new(EventRecorder::default()));
        core.add_sink(Rc::clone(&recorder));
        for _ in 0..5 {
            core.execute_action("meditate");
        }
        let recorder = recorder.borrow();
        assert_eq!(recorder.count(GameEventKind::ActionExecuted), 5);
        assert_eq!(recorder.count(GameEventKind::PillObtained), 1);
        assert_eq!(recorder.count(GameEventKind::MeditationStreak), 1);
        assert_eq!(core.statistics().session.pills_earned, 1);
        assert_eq!(core.statistics().session.longest_meditation_streak, 5);
    }

    #[test]
    fn queries_do_not_mutate() {
        let mut core = started(5);
        core.character.as_mut().unwrap().mana.set_current(10);
        let before = core.character().cloned();

        let preview = core.simulate_action("cultivate").unwrap();
        assert!(!preview.available);
        assert!(preview.reason.unwrap().contains("Insufficient mana"));
        assert_eq!(preview.projected.experience, 19);
        assert!(!core.is_action_available("cultivate"));
        assert_eq!(core.action_cost("cultivate").unwrap().mana, 20);
        assert!(core.action_description("wait").is_some());
        assert!(core.action_cost("fly").is_none());

        let available: Vec<_> = core.available_actions().iter().map(|info| info.id).collect();
        assert_eq!(
            available,
            vec![ActionId::Meditate, ActionId::ConsumePill, ActionId::Wait]
        );
        let state = core.game_state().unwrap();
        assert_eq!(state.actions.len(), 4);
        assert_eq!(state.recommendation, Recommendation::LowManaTakePill);
        assert_eq!(core.character().cloned(), before);
    }

    #[test]
    fn rejected_save_leaves_live_game_untouched() {
        let mut core = started(5);
        core.execute_action("meditate");
        let mut save = core.to_save().unwrap();
        save.version = "0.9.0".to_string();
        let before = core.character().cloned();
        let log_before = core.log().clone();

        assert!(matches!(
            core.apply_save(&save),
            Err(SaveError::VersionMismatch { .. })
        ));
        assert_eq!(core.character().cloned(), before);
        assert_eq!(core.log(), &log_before);
    }

    #[test]
    fn save_roundtrip_restores_into_fresh_engine() {
        let mut core = started(6);
        core.execute_action("meditate");
        core.execute_action("cultivate");
        let save = core.to_save().unwrap();

        let mut other = GameCore::new(7);
        other.apply_save(&save).unwrap();
        assert_eq!(other.character(), core.character());
        assert_eq!(other.log(), core.log());
        assert_eq!(other.difficulty(), Difficulty::Normal);
    }
}
