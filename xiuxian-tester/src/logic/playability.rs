use anyhow::{Context, Result, ensure};
use std::collections::BTreeMap;
use std::convert::TryFrom;

use crate::logic::game_tester::{Ending, GameTester, PlayabilityMetrics, SimulationPlan};
use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use xiuxian_game::{Difficulty, Realm};

#[derive(Debug, Clone)]
pub struct PlayabilityRecord {
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub seed_label: String,
    pub seed_value: u64,
    pub metrics: PlayabilityMetrics,
}

#[derive(Debug, Clone)]
pub struct PlayabilityAggregate {
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub iterations: usize,
    pub mean_turns: f64,
    pub std_turns: f64,
    pub ascension_pct: f64,
    pub death_pct: f64,
    pub turn_limit_pct: f64,
    pub mean_final_realm: f64,
    pub mean_power: f64,
    pub mean_breakthroughs: f64,
    pub mean_pills_earned: f64,
    pub mean_achievements: f64,
    /// Mean turn of the first breakthrough among runs that had one.
    pub mean_first_breakthrough_turn: f64,
}

/// Run every `(difficulty, strategy)` pair over every seed.
///
/// # Errors
///
/// Returns an error when a run violates its strategy's expectations.
pub fn run_playability_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: usize,
    difficulties: &[Difficulty],
    strategies: &[GameplayStrategy],
) -> Result<Vec<PlayabilityRecord>> {
    let iterations = iterations.max(1);
    let mut records =
        Vec::with_capacity(seeds.len() * difficulties.len() * strategies.len() * iterations);

    for &difficulty in difficulties {
        for &strategy in strategies {
            let plan = playability_plan(difficulty, strategy);
            for seed in seeds {
                for iteration in 0..iterations {
                    let iteration_offset = u64::try_from(iteration).unwrap_or(0);
                    let iteration_seed = seed.seed.wrapping_add(iteration_offset);
                    let summary = tester.run_plan(&plan, iteration_seed);
                    let context = format!(
                        "Playability expectation failed for difficulty {difficulty}, strategy {strategy}, seed {} (iteration {})",
                        seed.display(),
                        iteration + 1
                    );
                    for expectation in &plan.expectations {
                        expectation
                            .evaluate(&summary)
                            .with_context(|| context.clone())?;
                    }

                    records.push(PlayabilityRecord {
                        scenario_name: scenario_label(difficulty, strategy),
                        difficulty,
                        strategy,
                        seed_label: seed.display(),
                        seed_value: iteration_seed,
                        metrics: summary.metrics,
                    });
                }
            }
        }
    }

    Ok(records)
}

fn scenario_label(difficulty: Difficulty, strategy: GameplayStrategy) -> String {
    let mut label = difficulty.as_str().to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    format!("{label} - {strategy}")
}

fn playability_plan(difficulty: Difficulty, strategy: GameplayStrategy) -> SimulationPlan {
    let plan = SimulationPlan::new(difficulty, strategy);
    if strategy.is_cautious() {
        plan.with_expectation(|summary: &crate::logic::SimulationSummary| {
            ensure!(
                summary.ending() != Ending::Death,
                "{} died after {} turns",
                summary.strategy,
                summary.metrics.turns_taken
            );
            Ok(())
        })
    } else {
        plan
    }
}

#[must_use]
pub fn aggregate_playability(records: &[PlayabilityRecord]) -> Vec<PlayabilityAggregate> {
    let mut aggregates: BTreeMap<(Difficulty, GameplayStrategy), AggregateBuilder> =
        BTreeMap::new();

    for record in records {
        aggregates
            .entry((record.difficulty, record.strategy))
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(&record.metrics);
    }

    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// Cross-run sanity checks over a finished analysis.
///
/// # Errors
///
/// Returns the first violated check.
pub fn validate_playability_targets(
    aggregates: &[PlayabilityAggregate],
    records: &[PlayabilityRecord],
) -> Result<()> {
    for aggregate in aggregates {
        if aggregate.strategy.is_cautious() {
            ensure!(
                aggregate.death_pct <= 0.0,
                "Cautious strategy {} died in {:.1}% of runs",
                aggregate.scenario_name,
                aggregate.death_pct * 100.0
            );
        }
    }
    for record in records {
        ensure_record_consistency(record)?;
    }
    Ok(())
}

fn ensure_record_consistency(record: &PlayabilityRecord) -> Result<()> {
    let metrics = &record.metrics;
    let label = || format!("{} seed {}", record.scenario_name, record.seed_label);
    ensure!(
        u32::from(metrics.final_realm.ordinal()) == metrics.breakthroughs,
        "Realm {} does not match {} breakthroughs in {}",
        metrics.final_realm,
        metrics.breakthroughs,
        label()
    );
    ensure!(
        metrics.final_health <= 100 && metrics.final_mana <= 100,
        "Resource pool out of bounds in {}",
        label()
    );
    let ascended = metrics.final_realm == Realm::Ascension;
    ensure!(
        ascended == (metrics.ending == Ending::Ascension),
        "Ending {} disagrees with final realm {} in {}",
        metrics.ending,
        metrics.final_realm,
        label()
    );
    ensure!(
        metrics.ending != Ending::Death || metrics.final_health == 0,
        "Death recorded with {} health in {}",
        metrics.final_health,
        label()
    );
    Ok(())
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    scenario_name: String,
    difficulty: Difficulty,
    strategy: GameplayStrategy,
    stats_turns: RunningStats,
    stats_first_breakthrough: RunningStats,
    iterations: u32,
    ascensions: u32,
    deaths: u32,
    turn_limits: u32,
    realm_sum: u64,
    power_sum: f64,
    breakthrough_sum: u64,
    pills_earned_sum: u64,
    achievement_sum: u64,
}

impl AggregateBuilder {
    fn new(record: &PlayabilityRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            difficulty: record.difficulty,
            strategy: record.strategy,
            stats_turns: RunningStats::default(),
            stats_first_breakthrough: RunningStats::default(),
            iterations: 0,
            ascensions: 0,
            deaths: 0,
            turn_limits: 0,
            realm_sum: 0,
            power_sum: 0.0,
            breakthrough_sum: 0,
            pills_earned_sum: 0,
            achievement_sum: 0,
        }
    }

    fn ingest(&mut self, metrics: &PlayabilityMetrics) {
        self.iterations += 1;
        self.stats_turns.add(f64::from(metrics.turns_taken));
        if let Some(&turn) = metrics.breakthrough_turns.first() {
            self.stats_first_breakthrough.add(f64::from(turn));
        }
        match metrics.ending {
            Ending::Ascension => self.ascensions += 1,
            Ending::Death => self.deaths += 1,
            Ending::TurnLimit => self.turn_limits += 1,
        }
        self.realm_sum += u64::from(metrics.final_realm.ordinal());
        #[allow(clippy::cast_precision_loss)]
        let power = metrics.power_level as f64;
        self.power_sum += power;
        self.breakthrough_sum += u64::from(metrics.breakthroughs);
        self.pills_earned_sum += u64::from(metrics.pills_earned);
        self.achievement_sum += u64::try_from(metrics.achievements_unlocked).unwrap_or(0);
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> PlayabilityAggregate {
        let denom = f64::from(self.iterations.max(1));
        PlayabilityAggregate {
            scenario_name: self.scenario_name,
            difficulty: self.difficulty,
            strategy: self.strategy,
            iterations: usize::try_from(self.iterations).unwrap_or(usize::MAX),
            mean_turns: self.stats_turns.mean(),
            std_turns: self.stats_turns.std_dev(),
            ascension_pct: f64::from(self.ascensions) / denom,
            death_pct: f64::from(self.deaths) / denom,
            turn_limit_pct: f64::from(self.turn_limits) / denom,
            mean_final_realm: self.realm_sum as f64 / denom,
            mean_power: self.power_sum / denom,
            mean_breakthroughs: self.breakthrough_sum as f64 / denom,
            mean_pills_earned: self.pills_earned_sum as f64 / denom,
            mean_achievements: self.achievement_sum as f64 / denom,
            mean_first_breakthrough_turn: self.stats_first_breakthrough.mean(),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
