use std::cell::RefCell;
use std::rc::Rc;

use xiuxian_game::{
    AchievementTracker, ActionId, Difficulty, EventRecorder, GameCore, GameEventKind, GameSetup,
    LogSink, TalentScore,
};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// Turn cap used when a plan does not set one.
pub const DEFAULT_MAX_TURNS: u32 = 5_000;

/// Milestone events kept for expectations; per-turn events are left out.
const RECORDED_EVENTS: [GameEventKind; 7] = [
    GameEventKind::GameStarted,
    GameEventKind::Breakthrough,
    GameEventKind::PillObtained,
    GameEventKind::MeditationStreak,
    GameEventKind::CharacterDied,
    GameEventKind::GameOver,
    GameEventKind::GameReset,
];
const RECORDED_EVENT_CAPACITY: usize = 4_096;

/// Configuration for a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub max_turns: u32,
    pub talent: Option<TalentScore>,
    pub name: String,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(difficulty: Difficulty, strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            difficulty,
            strategy,
            max_turns: DEFAULT_MAX_TURNS,
            talent: None,
            name: format!("{strategy} Disciple"),
        }
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    #[must_use]
    pub const fn with_talent(mut self, talent: Option<TalentScore>) -> Self {
        self.talent = talent;
        self
    }
}

/// Result of advancing the simulation by one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn: u32,
    pub action: ActionId,
    pub policy_name: String,
    pub rationale: Option<String>,
    pub success: bool,
    pub message: String,
    pub leveled_up: bool,
    pub game_ended: bool,
}

/// Deterministic harness that drives a [`GameCore`] with a policy.
pub struct SimulationSession {
    core: GameCore,
    achievements: Rc<RefCell<AchievementTracker>>,
    recorder: Rc<RefCell<EventRecorder>>,
    max_turns: u32,
    turn: u32,
}

impl SimulationSession {
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        let mut core = GameCore::new(config.seed);
        let achievements = Rc::new(RefCell::new(AchievementTracker::default()));
        let recorder = Rc::new(RefCell::new(
            EventRecorder::with_capacity(RECORDED_EVENT_CAPACITY).only(RECORDED_EVENTS),
        ));
        core.add_sink(LogSink);
        core.add_sink(Rc::clone(&achievements));
        core.add_sink(Rc::clone(&recorder));

        let mut setup = GameSetup::new(config.difficulty).name(config.name.clone());
        setup.talent = config.talent;
        core.start(setup);

        Self {
            core,
            achievements,
            recorder,
            max_turns: config.max_turns,
            turn: 0,
        }
    }

    #[must_use]
    pub const fn core(&self) -> &GameCore {
        &self.core
    }

    pub const fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn achievements(&self) -> AchievementTracker {
        self.achievements.borrow().clone()
    }

    #[must_use]
    pub fn recorder(&self) -> std::cell::Ref<'_, EventRecorder> {
        self.recorder.borrow()
    }

    /// Whether another turn may run.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.core.is_game_over() && self.turn < self.max_turns
    }

    /// Let the policy pick one action and resolve it.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> TurnOutcome {
        self.turn += 1;
        let decision = policy.pick_action(&self.core);
        let result = self.core.execute_action(decision.action.as_str());
        let game_ended = self.core.is_game_over() || self.turn >= self.max_turns;
        TurnOutcome {
            turn: self.turn,
            action: decision.action,
            policy_name: policy.name().to_string(),
            rationale: decision.rationale,
            success: result.success,
            leveled_up: result.leveled_up(),
            message: result.message,
            game_ended,
        }
    }

    #[must_use]
    pub fn into_core(self) -> GameCore {
        self.core
    }
}
