use anyhow::{Context, Result, anyhow, ensure};

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::{Ending, GameTester, SimulationSummary};
use crate::logic::{GameplayStrategy, SimulationPlan};
use xiuxian_game::{
    Achievement, Character, Difficulty, GameCore, GameEvent, Realm, TalentScore,
};

const SMOKE_TURNS: u32 = 50;
const BREAKTHROUGH_TURNS: u32 = 400;
const RANDOM_WALK_TURNS: u32 = 300;
const DETERMINISM_TURNS: u32 = 100;

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::simulation(
            "smoke",
            "Smoke Test",
            "Balanced play for 50 turns without breaking any bound",
            SimulationPlan::new(Difficulty::Normal, GameplayStrategy::Balanced)
                .with_max_turns(SMOKE_TURNS)
                .with_expectation(smoke_expectation),
        ),
        TestScenario::simulation(
            "first-meditation",
            "First Meditation",
            "One meditation at talent 5 applies the scaled gains",
            SimulationPlan::new(Difficulty::Normal, GameplayStrategy::Meditator)
                .with_talent(talent(5))
                .with_max_turns(1)
                .with_expectation(first_meditation_expectation),
        ),
        TestScenario::simulation(
            "meditation-streak",
            "Meditation Streak",
            "Five meditations in a row condense a pill",
            SimulationPlan::new(Difficulty::Normal, GameplayStrategy::Meditator)
                .with_talent(talent(5))
                .with_max_turns(5)
                .with_expectation(meditation_streak_expectation),
        ),
        TestScenario::simulation(
            "mana-exhaustion",
            "Mana Exhaustion",
            "Cultivating without mana fails and changes nothing",
            SimulationPlan::new(Difficulty::Normal, GameplayStrategy::Cultivator)
                .with_max_turns(0)
                .with_setup(exhaust_mana)
                .with_expectation(mana_exhaustion_expectation),
        ),
        TestScenario::simulation(
            "breakthrough",
            "First Breakthrough",
            "Cultivation carries a disciple into the Foundation realm",
            SimulationPlan::new(Difficulty::Easy, GameplayStrategy::Cultivator)
                .with_max_turns(BREAKTHROUGH_TURNS)
                .with_expectation(breakthrough_expectation),
        ),
        TestScenario::simulation(
            "last-breath",
            "Last Breath",
            "Reckless play on one health point ends the game in death",
            SimulationPlan::new(Difficulty::Normal, GameplayStrategy::Reckless)
                .with_setup(one_health_point)
                .with_expectation(last_breath_expectation),
        ),
        TestScenario::simulation(
            "save-version-guard",
            "Save Version Guard",
            "A save from another version is rejected and the game is untouched",
            SimulationPlan::new(Difficulty::Normal, GameplayStrategy::Balanced)
                .with_max_turns(0)
                .with_setup(load_foreign_version)
                .with_expectation(save_guard_expectation),
        ),
        TestScenario::simulation(
            "random-walk",
            "Random Walk",
            "Random available actions always succeed and stay in bounds",
            SimulationPlan::new(Difficulty::Hard, GameplayStrategy::Random)
                .with_max_turns(RANDOM_WALK_TURNS)
                .with_expectation(random_walk_expectation),
        ),
        TestScenario::simulation(
            "deterministic-talent",
            "Deterministic Talent",
            "The same seed replays to the same talent, log and character",
            SimulationPlan::new(Difficulty::Hard, GameplayStrategy::Balanced)
                .with_max_turns(DETERMINISM_TURNS)
                .with_expectation(deterministic_expectation),
        ),
        TestScenario::simulation(
            "ascension-run",
            "Ascension Run",
            "A patient meditator climbs every realm and ascends",
            SimulationPlan::new(Difficulty::Easy, GameplayStrategy::Meditator)
                .with_expectation(ascension_expectation),
        ),
    ]
}

fn talent(value: u8) -> TalentScore {
    TalentScore::new(value).unwrap_or(TalentScore::MIN)
}

fn character(summary: &SimulationSummary) -> Result<&Character> {
    summary
        .final_character
        .as_ref()
        .ok_or_else(|| anyhow!("simulation finished without a character"))
}

fn ensure_bounds(character: &Character) -> Result<()> {
    ensure!(
        character.health.current() <= character.health.max(),
        "health {} above max",
        character.health.current()
    );
    ensure!(
        character.mana.current() <= character.mana.max(),
        "mana {} above max",
        character.mana.current()
    );
    if let Some(threshold) = character.realm().threshold() {
        ensure!(
            character.progression.level_experience() < threshold,
            "experience {} not below threshold {threshold}",
            character.progression.level_experience()
        );
    }
    Ok(())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure_bounds(character)?;
    ensure!(!summary.log.is_empty(), "log should never be empty");
    ensure!(
        summary.game_ended || summary.turns.len() == SMOKE_TURNS as usize,
        "expected {SMOKE_TURNS} turns, ran {}",
        summary.turns.len()
    );
    ensure!(character.is_alive(), "balanced play should survive the smoke run");
    Ok(())
}

fn first_meditation_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    let turn = summary.turns.first().context("no turn recorded")?;
    ensure!(turn.success, "meditation failed: {}", turn.message);
    ensure!(character.health.current() == 99, "health {}", character.health.current());
    ensure!(character.mana.current() == 62, "mana {}", character.mana.current());
    ensure!(
        character.progression.total_experience() == 7,
        "experience {}",
        character.progression.total_experience()
    );
    ensure!(character.meditation_streak == 1, "streak {}", character.meditation_streak);
    ensure!(character.pills() == 1, "pills {}", character.pills());
    Ok(())
}

fn meditation_streak_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure!(character.meditation_streak == 5, "streak {}", character.meditation_streak);
    ensure!(character.pills() == 2, "pills {}", character.pills());
    let streak_events = summary
        .events
        .iter()
        .filter(|event| matches!(event, GameEvent::MeditationStreak { streak: 5 }))
        .count();
    ensure!(streak_events == 1, "expected one streak event, saw {streak_events}");
    ensure!(
        summary.achievements.contains(&Achievement::MeditationBeginner),
        "meditation beginner not unlocked"
    );
    Ok(())
}

fn exhaust_mana(core: &mut GameCore) {
    for _ in 0..3 {
        core.execute_action("cultivate");
    }
}

fn mana_exhaustion_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure!(character.mana.current() == 10, "mana {}", character.mana.current());
    ensure!(character.total_actions == 2, "actions {}", character.total_actions);
    ensure!(
        summary.statistics.session.failed_actions == 1,
        "failed actions {}",
        summary.statistics.session.failed_actions
    );
    ensure!(
        summary
            .log
            .last()
            .is_some_and(|line| !line.contains("Insufficient")),
        "failed cultivation should not be journaled"
    );
    Ok(())
}

fn breakthrough_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure_bounds(character)?;
    ensure!(
        character.realm() >= Realm::Foundation,
        "still in {} after {} turns",
        character.realm(),
        summary.turns.len()
    );
    let first = summary
        .events
        .iter()
        .find_map(|event| match event {
            GameEvent::Breakthrough { realm, .. } => Some(*realm),
            _ => None,
        })
        .context("no breakthrough event")?;
    ensure!(first == Realm::Foundation, "first breakthrough went to {first}");
    ensure!(
        summary.turns.iter().any(|turn| turn.leveled_up
            && turn.message.contains("Breakthrough to Foundation!")),
        "breakthrough message missing"
    );
    Ok(())
}

fn one_health_point(core: &mut GameCore) {
    let Ok(mut save) = core.to_save() else {
        return;
    };
    save.character.hp = 1;
    save.checksum = save.compute_checksum().ok();
    if let Err(err) = core.apply_save(&save) {
        log::warn!("could not prepare last-breath state: {err}");
    }
}

fn last_breath_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure!(summary.ending() == Ending::Death, "ending {}", summary.ending());
    ensure!(!character.is_alive(), "character should be dead");
    ensure!(
        summary
            .log
            .last()
            .is_some_and(|line| line.contains("cultivation has failed")),
        "death not journaled"
    );
    ensure!(
        summary
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::GameOver { victory: false })),
        "no defeat event"
    );
    ensure!(
        summary.achievements.contains(&Achievement::FirstDeath),
        "fallen cultivator not unlocked"
    );
    Ok(())
}

fn load_foreign_version(core: &mut GameCore) {
    let Ok(mut save) = core.to_save() else {
        return;
    };
    save.version = "1.0.0".to_string();
    save.character.hp = 1;
    save.checksum = save.compute_checksum().ok();
    if core.apply_save(&save).is_ok() {
        log::error!("foreign save version was accepted");
    }
}

fn save_guard_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure!(
        character.health.current() == 100,
        "health changed to {}",
        character.health.current()
    );
    ensure!(character.total_actions == 0, "actions {}", character.total_actions);
    ensure!(!summary.game_ended, "game should still be running");
    Ok(())
}

fn random_walk_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure_bounds(character)?;
    if let Some(turn) = summary.turns.iter().find(|turn| !turn.success) {
        return Err(anyhow!(
            "turn {} picked unavailable {}: {}",
            turn.turn,
            turn.action,
            turn.message
        ));
    }
    ensure!(
        summary.statistics.session.failed_actions == 0,
        "failed actions {}",
        summary.statistics.session.failed_actions
    );
    ensure!(
        u64::from(character.total_actions) == summary.turns.len() as u64,
        "{} actions over {} turns",
        character.total_actions,
        summary.turns.len()
    );
    Ok(())
}

fn deterministic_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    let range = Difficulty::Hard.settings().talent_range();
    ensure!(
        range.contains(&character.talent.value()),
        "talent {} outside hard range",
        character.talent.value()
    );

    let replay_plan = SimulationPlan::new(summary.difficulty, summary.strategy)
        .with_max_turns(DETERMINISM_TURNS);
    let replay = GameTester::new(false).run_plan(&replay_plan, summary.seed);
    ensure!(
        replay.final_character == summary.final_character,
        "replay diverged in character state"
    );
    ensure!(replay.log == summary.log, "replay diverged in log");
    ensure!(
        replay.metrics.turns_taken == summary.metrics.turns_taken,
        "replay ran {} turns instead of {}",
        replay.metrics.turns_taken,
        summary.metrics.turns_taken
    );
    Ok(())
}

fn ascension_expectation(summary: &SimulationSummary) -> Result<()> {
    let character = character(summary)?;
    ensure!(
        summary.ending() == Ending::Ascension,
        "ending {} in {} after {} turns",
        summary.ending(),
        character.realm(),
        summary.turns.len()
    );
    ensure!(character.is_alive(), "ascended character must be alive");
    ensure!(
        summary.metrics.breakthroughs == 5,
        "breakthroughs {}",
        summary.metrics.breakthroughs
    );
    ensure!(
        summary
            .log
            .last()
            .is_some_and(|line| line.contains("ascended")),
        "ascension not journaled"
    );
    ensure!(
        summary
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::GameOver { victory: true })),
        "no victory event"
    );
    Ok(())
}
