use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use xiuxian_game::{
    Achievement, ActionId, Character, Difficulty, GameCore, GameEvent, GameStatistics, Realm,
    TalentScore,
};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{
    DEFAULT_MAX_TURNS, SimulationConfig, SimulationSession, TurnOutcome,
};

/// How a simulated run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    Ascension,
    Death,
    #[default]
    TurnLimit,
}

impl Ending {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ascension => "Ascension",
            Self::Death => "Death",
            Self::TurnLimit => "Turn limit",
        }
    }

    fn from_core(core: &GameCore) -> Self {
        match core.character() {
            Some(character) if core.is_game_over() && !character.is_alive() => Self::Death,
            Some(character) if core.is_game_over() && character.realm().is_terminal() => {
                Self::Ascension
            }
            _ => Self::TurnLimit,
        }
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-run metrics collected for playability analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayabilityMetrics {
    pub turns_taken: u32,
    pub ending: Ending,
    pub final_realm: Realm,
    pub final_health: u32,
    pub final_mana: u32,
    pub final_pills: u32,
    pub total_experience: u64,
    pub power_level: u64,
    pub breakthroughs: u32,
    pub pills_earned: u32,
    pub pills_consumed: u32,
    pub failed_actions: u32,
    pub longest_meditation_streak: u32,
    pub action_counts: BTreeMap<ActionId, u32>,
    pub achievements_unlocked: usize,
    /// Turn on which each breakthrough landed.
    pub breakthrough_turns: Vec<u32>,
}

impl PlayabilityMetrics {
    fn record_turn(&mut self, outcome: &TurnOutcome) {
        self.turns_taken = outcome.turn;
        if outcome.leveled_up {
            self.breakthrough_turns.push(outcome.turn);
        }
    }

    fn finalize(&mut self, core: &GameCore, achievements: usize) {
        let stats = core.statistics();
        self.ending = Ending::from_core(core);
        self.power_level = stats.power_level;
        self.breakthroughs = stats.session.breakthroughs;
        self.pills_earned = stats.session.pills_earned;
        self.pills_consumed = stats.session.pills_consumed;
        self.failed_actions = stats.session.failed_actions;
        self.longest_meditation_streak = stats.session.longest_meditation_streak;
        self.action_counts = stats.session.actions;
        self.achievements_unlocked = achievements;
        if let Some(character) = core.character() {
            self.final_realm = character.realm();
            self.final_health = character.health.current();
            self.final_mana = character.mana.current();
            self.final_pills = character.pills();
            self.total_experience = character.progression.total_experience();
        }
    }

    #[must_use]
    pub fn action_count(&self, action: ActionId) -> u32 {
        self.action_counts.get(&action).copied().unwrap_or(0)
    }
}

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub max_turns: Option<u32>,
    pub talent: Option<TalentScore>,
    pub setup: Option<fn(&mut GameCore)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(difficulty: Difficulty, strategy: GameplayStrategy) -> Self {
        Self {
            difficulty,
            strategy,
            max_turns: None,
            talent: None,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    #[must_use]
    pub const fn with_talent(mut self, talent: TalentScore) -> Self {
        self.talent = Some(talent);
        self
    }

    /// Hook run on the started game before the first turn.
    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameCore)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub turns: Vec<TurnOutcome>,
    pub metrics: PlayabilityMetrics,
    pub final_character: Option<Character>,
    pub statistics: GameStatistics,
    pub log: Vec<String>,
    pub events: Vec<GameEvent>,
    pub achievements: Vec<Achievement>,
    pub game_ended: bool,
}

impl SimulationSummary {
    #[must_use]
    pub const fn ending(&self) -> Ending {
        self.metrics.ending
    }
}

/// Headless deterministic runner for the core game logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameTester {
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let max_turns = plan.max_turns.unwrap_or(DEFAULT_MAX_TURNS);
        let config = SimulationConfig::new(plan.difficulty, plan.strategy, seed)
            .with_max_turns(max_turns)
            .with_talent(plan.talent);
        let mut session = SimulationSession::new(&config);

        if let Some(setup) = plan.setup {
            setup(session.core_mut());
        }

        if self.verbose {
            log_initial_state(seed, plan, session.core());
        }

        let mut policy = plan.strategy.create_policy(seed);
        let mut metrics = PlayabilityMetrics::default();
        let mut turns = Vec::new();

        while session.is_running() {
            let outcome = session.advance(policy.as_mut());
            metrics.record_turn(&outcome);
            if self.verbose {
                log_turn(&outcome);
            }
            turns.push(outcome);
        }

        let achievements = session.achievements().unlocked().to_vec();
        let events: Vec<GameEvent> = session.recorder().events().cloned().collect();
        let core = session.into_core();
        metrics.finalize(&core, achievements.len());

        SimulationSummary {
            seed,
            difficulty: plan.difficulty,
            strategy: plan.strategy,
            turns,
            metrics,
            final_character: core.character().cloned(),
            statistics: core.statistics(),
            log: core.log().iter().map(str::to_string).collect(),
            events,
            achievements,
            game_ended: core.is_game_over(),
        }
    }
}

fn log_initial_state(seed: u64, plan: &SimulationPlan, core: &GameCore) {
    if let Some(character) = core.character() {
        println!(
            "🌱 Seed {seed} | {} on {} | talent {} | HP {} MP {} pills {}",
            plan.strategy,
            plan.difficulty.as_str(),
            character.talent.value(),
            character.health.current(),
            character.mana.current(),
            character.pills()
        );
    }
}

fn log_turn(outcome: &TurnOutcome) {
    let marker = if outcome.success { "✔" } else { "✘" };
    println!(
        "  {marker} turn {} {} [{}]: {}",
        outcome.turn,
        outcome.action,
        outcome.rationale.as_deref().unwrap_or("-"),
        outcome.message
    );
}
