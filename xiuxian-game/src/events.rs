//! Game notifications and the sinks that consume them.
//!
//! The engine calls [`EventSink::notify`] at fixed points in a turn. Sinks are
//! fire-and-forget: nothing in the core reads back from them.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::actions::{ActionId, ActionResult};
use crate::constants::EVENT_HISTORY_CAPACITY;
use crate::difficulty::Difficulty;
use crate::progression::Realm;

/// Discrete notification emitted by the turn engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        name: String,
        talent: u8,
        difficulty: Difficulty,
    },
    ActionExecuted {
        action: ActionId,
        result: ActionResult,
        total_actions: u32,
    },
    Breakthrough {
        realm: Realm,
        total_experience: u64,
    },
    PillObtained {
        amount: u32,
        pills: u32,
    },
    MeditationStreak {
        streak: u32,
    },
    CharacterDied {
        name: String,
        total_actions: u32,
    },
    GameOver {
        victory: bool,
    },
    GameReset {
        name: String,
        difficulty: Difficulty,
    },
    GameSaved {
        slot: String,
    },
    GameLoaded {
        slot: String,
    },
}

/// Payload-free discriminant of a [`GameEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventKind {
    GameStarted,
    ActionExecuted,
    Breakthrough,
    PillObtained,
    MeditationStreak,
    CharacterDied,
    GameOver,
    GameReset,
    GameSaved,
    GameLoaded,
}

impl GameEventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GameStarted => "game_started",
            Self::ActionExecuted => "action_executed",
            Self::Breakthrough => "breakthrough",
            Self::PillObtained => "pill_obtained",
            Self::MeditationStreak => "meditation_streak",
            Self::CharacterDied => "character_died",
            Self::GameOver => "game_over",
            Self::GameReset => "game_reset",
            Self::GameSaved => "game_saved",
            Self::GameLoaded => "game_loaded",
        }
    }
}

impl fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GameEvent {
    #[must_use]
    pub const fn kind(&self) -> GameEventKind {
        match self {
            Self::GameStarted { .. } => GameEventKind::GameStarted,
            Self::ActionExecuted { .. } => GameEventKind::ActionExecuted,
            Self::Breakthrough { .. } => GameEventKind::Breakthrough,
            Self::PillObtained { .. } => GameEventKind::PillObtained,
            Self::MeditationStreak { .. } => GameEventKind::MeditationStreak,
            Self::CharacterDied { .. } => GameEventKind::CharacterDied,
            Self::GameOver { .. } => GameEventKind::GameOver,
            Self::GameReset { .. } => GameEventKind::GameReset,
            Self::GameSaved { .. } => GameEventKind::GameSaved,
            Self::GameLoaded { .. } => GameEventKind::GameLoaded,
        }
    }
}

/// Receiver of engine notifications.
pub trait EventSink {
    fn notify(&mut self, event: &GameEvent);
}

impl<T: EventSink + ?Sized> EventSink for Rc<RefCell<T>> {
    fn notify(&mut self, event: &GameEvent) {
        self.borrow_mut().notify(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn notify(&mut self, event: &GameEvent) {
        (**self).notify(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&mut self, _event: &GameEvent) {}
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&mut self, event: &GameEvent) {
        match event {
            GameEvent::GameStarted {
                name,
                talent,
                difficulty,
            } => log::info!("game started: {name} (talent {talent}, {difficulty})"),
            GameEvent::ActionExecuted {
                action,
                result,
                total_actions,
            } => log::debug!(
                "action {action} #{total_actions}: success={} {}",
                result.success,
                result.message
            ),
            GameEvent::Breakthrough { realm, .. } => log::info!("breakthrough to {realm}"),
            GameEvent::PillObtained { amount, pills } => {
                log::debug!("obtained {amount} pill(s), now holding {pills}");
            }
            GameEvent::MeditationStreak { streak } => log::debug!("meditation streak {streak}"),
            GameEvent::CharacterDied {
                name,
                total_actions,
            } => log::info!("{name} died after {total_actions} actions"),
            GameEvent::GameOver { victory } => log::info!("game over (victory={victory})"),
            GameEvent::GameReset { name, difficulty } => {
                log::info!("game reset for {name} ({difficulty})");
            }
            GameEvent::GameSaved { slot } => log::info!("game saved to slot {slot}"),
            GameEvent::GameLoaded { slot } => log::info!("game loaded from slot {slot}"),
        }
    }
}

/// Bounded history of events, optionally restricted to selected kinds.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    events: VecDeque<GameEvent>,
    capacity: usize,
    kinds: Option<BTreeSet<GameEventKind>>,
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::with_capacity(EVENT_HISTORY_CAPACITY)
    }
}

impl EventRecorder {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            kinds: None,
        }
    }

    /// Only record events whose kind is listed.
    #[must_use]
    pub fn only(mut self, kinds: impl IntoIterator<Item = GameEventKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn events(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn of_kind(&self, kind: GameEventKind) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(move |event| event.kind() == kind)
    }

    #[must_use]
    pub fn count(&self, kind: GameEventKind) -> usize {
        self.of_kind(kind).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for EventRecorder {
    fn notify(&mut self, event: &GameEvent) {
        if let Some(kinds) = &self.kinds
            && !kinds.contains(&event.kind())
        {
            return;
        }
        self.events.push_back(event.clone());
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
    }
}

/// Milestones unlocked by [`AchievementTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstAction,
    FirstBreakthrough,
    MeditationBeginner,
    MeditationMaster,
    FirstDeath,
    FirstPill,
    PersistentCultivator,
    CultivationEnthusiast,
}

impl Achievement {
    pub const ALL: [Self; 8] = [
        Self::FirstAction,
        Self::FirstBreakthrough,
        Self::MeditationBeginner,
        Self::MeditationMaster,
        Self::FirstDeath,
        Self::FirstPill,
        Self::PersistentCultivator,
        Self::CultivationEnthusiast,
    ];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::FirstAction => "First Steps",
            Self::FirstBreakthrough => "Foundation Laid",
            Self::MeditationBeginner => "Meditation Beginner",
            Self::MeditationMaster => "Meditation Master",
            Self::FirstDeath => "Fallen Cultivator",
            Self::FirstPill => "Pill Condenser",
            Self::PersistentCultivator => "Persistent Cultivator",
            Self::CultivationEnthusiast => "Cultivation Enthusiast",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::FirstAction => "Take your first action.",
            Self::FirstBreakthrough => "Break through to the Foundation realm.",
            Self::MeditationBeginner => "Meditate 5 times in a row.",
            Self::MeditationMaster => "Meditate 10 times in a row.",
            Self::FirstDeath => "Die for the first time.",
            Self::FirstPill => "Obtain a pill through meditation.",
            Self::PersistentCultivator => "Take 10 actions.",
            Self::CultivationEnthusiast => "Cultivate after at least 5 actions.",
        }
    }
}

const BEGINNER_STREAK: u32 = 5;
const MASTER_STREAK: u32 = 10;
const PERSISTENT_ACTIONS: u32 = 10;
const ENTHUSIAST_ACTIONS: u32 = 5;

/// Sink that unlocks achievements from the event stream.
#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    unlocked: Vec<Achievement>,
}

impl AchievementTracker {
    /// Unlocked achievements in unlock order.
    #[must_use]
    pub fn unlocked(&self) -> &[Achievement] {
        &self.unlocked
    }

    #[must_use]
    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    fn unlock(&mut self, achievement: Achievement) {
        if self.is_unlocked(achievement) {
            return;
        }
        log::info!("achievement unlocked: {}", achievement.title());
        self.unlocked.push(achievement);
    }
}

impl EventSink for AchievementTracker {
    fn notify(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ActionExecuted {
                action,
                result,
                total_actions,
            } if result.success => {
                if *total_actions == 1 {
                    self.unlock(Achievement::FirstAction);
                }
                if *total_actions >= PERSISTENT_ACTIONS {
                    self.unlock(Achievement::PersistentCultivator);
                }
                if *action == ActionId::Cultivate && *total_actions >= ENTHUSIAST_ACTIONS {
                    self.unlock(Achievement::CultivationEnthusiast);
                }
            }
            GameEvent::Breakthrough {
                realm: Realm::Foundation,
                ..
            } => self.unlock(Achievement::FirstBreakthrough),
            GameEvent::MeditationStreak { streak } => {
                if *streak >= BEGINNER_STREAK {
                    self.unlock(Achievement::MeditationBeginner);
                }
                if *streak >= MASTER_STREAK {
                    self.unlock(Achievement::MeditationMaster);
                }
            }
            GameEvent::CharacterDied { .. } => self.unlock(Achievement::FirstDeath),
            GameEvent::PillObtained { .. } => self.unlock(Achievement::FirstPill),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executed(action: ActionId, total_actions: u32) -> GameEvent {
        let mut result = ActionResult::failure("ok");
        result.success = true;
        GameEvent::ActionExecuted {
            action,
            result,
            total_actions,
        }
    }

    #[test]
    fn recorder_evicts_oldest_and_filters_kinds() {
        let mut recorder = EventRecorder::with_capacity(2);
        for streak in 1..=3 {
            recorder.notify(&GameEvent::MeditationStreak { streak });
        }
        assert_eq!(recorder.len(), 2);
        assert_eq!(
            recorder.events().next(),
            Some(&GameEvent::MeditationStreak { streak: 2 })
        );

        let mut filtered = EventRecorder::default().only([GameEventKind::GameOver]);
        filtered.notify(&GameEvent::MeditationStreak { streak: 1 });
        filtered.notify(&GameEvent::GameOver { victory: false });
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.count(GameEventKind::GameOver), 1);
    }

    #[test]
    fn shared_sink_is_readable_after_notify() {
        let shared = Rc::new(RefCell::new(EventRecorder::default()));
        let mut handle = Rc::clone(&shared);
        handle.notify(&GameEvent::GameSaved {
            slot: "1".to_string(),
        });
        assert_eq!(shared.borrow().count(GameEventKind::GameSaved), 1);
    }

    #[test]
    fn achievements_unlock_once_in_order() {
        let mut tracker = AchievementTracker::default();
        tracker.notify(&executed(ActionId::Meditate, 1));
        tracker.notify(&executed(ActionId::Meditate, 1));
        tracker.notify(&GameEvent::MeditationStreak { streak: 5 });
        tracker.notify(&executed(ActionId::Cultivate, 6));
        assert_eq!(
            tracker.unlocked(),
            &[
                Achievement::FirstAction,
                Achievement::MeditationBeginner,
                Achievement::CultivationEnthusiast,
            ]
        );
        assert!(!tracker.is_unlocked(Achievement::MeditationMaster));

        tracker.notify(&GameEvent::MeditationStreak { streak: 10 });
        tracker.notify(&executed(ActionId::Wait, 10));
        tracker.notify(&GameEvent::Breakthrough {
            realm: Realm::Foundation,
            total_experience: 100,
        });
        assert!(tracker.is_unlocked(Achievement::MeditationMaster));
        assert!(tracker.is_unlocked(Achievement::PersistentCultivator));
        assert!(tracker.is_unlocked(Achievement::FirstBreakthrough));
    }

    #[test]
    fn failed_actions_unlock_nothing() {
        let mut tracker = AchievementTracker::default();
        tracker.notify(&GameEvent::ActionExecuted {
            action: ActionId::Cultivate,
            result: ActionResult::failure("no mana"),
            total_actions: 12,
        });
        assert!(tracker.unlocked().is_empty());
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_value(GameEvent::GameOver { victory: true }).unwrap();
        assert_eq!(json["kind"], "game_over");
        assert_eq!(json["victory"], true);
        assert_eq!(GameEvent::GameOver { victory: true }.kind().as_str(), "game_over");
    }
}
