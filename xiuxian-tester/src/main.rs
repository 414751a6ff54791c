mod common;
mod logic;
mod play;
mod storage;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdin, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{SCENARIO_KEYS, get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    GameTester, GameplayStrategy, LogicTester, PlayabilityAggregate, PlayabilityRecord, SeedInfo,
    aggregate_playability, resolve_seed_inputs, run_playability_analysis,
    validate_playability_targets,
};
use storage::FileStorage;
use xiuxian_game::{Difficulty, GameCore, GameEngine, GameSetup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Scripted logic scenarios (fast)
    Logic,
    /// Strategy sweeps across difficulties and seeds
    Playability,
    /// Run both logic scenarios and the playability sweep
    All,
    /// Play interactively on stdin/stdout
    Play,
}

#[derive(Debug, Parser)]
#[command(name = "xiuxian-tester", version = "0.1.0")]
#[command(about = "Automated QA and interactive play for the Xiuxian cultivation game")]
struct Args {
    /// Test mode: logic, playability, all, or play
    #[arg(long, value_enum, default_value_t = TestMode::Logic)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; decimal, 0x hex, @phrase, or `all`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Difficulties for the playability sweep (comma-separated)
    #[arg(long, default_value = "easy,normal,hard")]
    difficulties: String,

    /// Strategies for the playability sweep (comma-separated, `all` for every strategy)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory holding save slots in play mode
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,

    /// Character name in play mode
    #[arg(long)]
    name: Option<String>,

    /// Difficulty in play mode
    #[arg(long, default_value = "normal")]
    difficulty: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if args.mode == TestMode::Play {
        return run_play(&args);
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let logic_seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let game_tester = GameTester::new(args.verbose);

    let all_results = run_logic_scenarios(&args, &scenarios, &logic_seeds, game_tester);

    let (playability_records, playability_aggregates) =
        gather_playability(&args, game_tester, &seed_infos)?;

    write_reports(
        &args,
        &all_results,
        playability_records.as_deref(),
        playability_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(aggregates) = playability_aggregates.as_ref() {
        let record_slice = playability_records.as_deref().unwrap_or(&[]);
        validate_playability_targets(aggregates, record_slice)?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎮 Xiuxian Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn run_play(args: &Args) -> Result<()> {
    let seed = resolve_seed_inputs(&split_csv(&args.seeds))?
        .first()
        .map_or(0, |info| info.seed);
    let mut core = GameCore::new(seed);
    let mut setup = GameSetup::new(Difficulty::from_label(&args.difficulty));
    setup.name.clone_from(&args.name);
    core.start(setup);
    let mut engine = GameEngine::new(core, FileStorage::new(&args.save_dir));
    let mut out = stdout().lock();
    play::run_interactive(&mut engine, stdin().lock(), &mut out)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for key in SCENARIO_KEYS {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn parse_difficulties(raw: &str) -> Result<Vec<Difficulty>> {
    let mut difficulties = Vec::new();
    for token in split_csv(raw) {
        let Some(difficulty) = Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(&token))
        else {
            bail!("Unknown difficulty: {token}");
        };
        if !difficulties.contains(&difficulty) {
            difficulties.push(difficulty);
        }
    }
    Ok(difficulties)
}

fn parse_strategies(raw: &str) -> Result<Vec<GameplayStrategy>> {
    let tokens = split_csv(raw);
    if tokens.iter().any(|token| token.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::new();
    for token in tokens {
        let strategy = GameplayStrategy::from_key(&token)
            .with_context(|| format!("Unknown strategy: {token}"))?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    logic_seeds: &[u64],
    game_tester: GameTester,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();
    if !matches!(args.mode, TestMode::Logic | TestMode::All) {
        return results;
    }

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester);

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            let scenario_results =
                logic_tester.run_scenario(&scenario, logic_seeds, args.iterations);
            results.extend(scenario_results);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type PlayabilitySummary = (
    Option<Vec<PlayabilityRecord>>,
    Option<Vec<PlayabilityAggregate>>,
);

fn gather_playability(
    args: &Args,
    game_tester: GameTester,
    seed_infos: &[SeedInfo],
) -> Result<PlayabilitySummary> {
    if !matches!(args.mode, TestMode::Playability | TestMode::All) {
        return Ok((None, None));
    }

    println!("{}", "🧘 Running Playability Sweep".bright_magenta().bold());
    println!("{}", "-".repeat(30).magenta());

    let difficulties = parse_difficulties(&args.difficulties)?;
    let strategies = parse_strategies(&args.strategies)?;
    let records = run_playability_analysis(
        &game_tester,
        seed_infos,
        args.iterations,
        &difficulties,
        &strategies,
    )?;
    let aggregates = aggregate_playability(&records);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    playability_records: Option<&[PlayabilityRecord]>,
    playability_aggregates: Option<&[PlayabilityAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Xiuxian Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            if let Some(records) = playability_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "No playability data.")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() && playability_aggregates.is_none() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    playability_aggregates.unwrap_or(&[]),
                    duration,
                )?;
            }
        }
    }

    if args.report != "json" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ScenarioResult;
    use crate::logic::game_tester::{Ending, PlayabilityMetrics};
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            mode: TestMode::Logic,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            difficulties: "easy,normal,hard".to_string(),
            strategies: "all".to_string(),
            report: "json".to_string(),
            output: None,
            save_dir: PathBuf::from("saves"),
            name: None,
            difficulty: "normal".to_string(),
            verbose: false,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("xiuxian-{nanos}-{name}"))
    }

    fn sample_record() -> PlayabilityRecord {
        let metrics = PlayabilityMetrics {
            turns_taken: 40,
            ending: Ending::TurnLimit,
            ..PlayabilityMetrics::default()
        };
        PlayabilityRecord {
            scenario_name: "Normal - Balanced".to_string(),
            difficulty: Difficulty::Normal,
            strategy: GameplayStrategy::Balanced,
            seed_label: "1337".to_string(),
            seed_value: 1337,
            metrics,
        }
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), SCENARIO_KEYS.len());
        assert!(expanded.contains(&"ascension-run".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("last-breath,smoke");
        assert_eq!(expanded, vec!["last-breath".to_string(), "smoke".to_string()]);
    }

    #[test]
    fn parses_difficulty_and_strategy_lists() {
        assert_eq!(
            parse_difficulties("Hard, easy,hard").unwrap(),
            vec![Difficulty::Hard, Difficulty::Easy]
        );
        assert!(parse_difficulties("nightmare").is_err());
        assert_eq!(parse_strategies("all").unwrap().len(), GameplayStrategy::ALL.len());
        assert_eq!(
            parse_strategies("reckless,recommend").unwrap(),
            vec![GameplayStrategy::Reckless, GameplayStrategy::Balanced]
        );
        assert!(parse_strategies("lazy").is_err());
    }

    #[test]
    fn run_logic_scenarios_skips_when_not_enabled() {
        let args = Args {
            mode: TestMode::Playability,
            ..base_args()
        };
        let results =
            run_logic_scenarios(&args, &["smoke".to_string()], &[42], GameTester::new(false));
        assert!(results.is_empty());
    }

    #[test]
    fn run_logic_scenarios_runs_each_seed() {
        let results = run_logic_scenarios(
            &base_args(),
            &["smoke".to_string(), "missing".to_string()],
            &[1, 2],
            GameTester::new(false),
        );
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn gather_playability_returns_none_when_disabled() {
        let seeds = vec![SeedInfo::from_numeric(42)];
        let (records, aggregates) =
            gather_playability(&base_args(), GameTester::new(false), &seeds).unwrap();
        assert!(records.is_none());
        assert!(aggregates.is_none());
    }

    #[test]
    fn gather_playability_covers_requested_pairs() {
        let args = Args {
            mode: TestMode::Playability,
            difficulties: "easy".to_string(),
            strategies: "meditator,cultivator".to_string(),
            ..base_args()
        };
        let seeds = vec![SeedInfo::from_numeric(42)];
        let (records, aggregates) =
            gather_playability(&args, GameTester::new(false), &seeds).unwrap();
        assert_eq!(records.unwrap().len(), 2);
        assert_eq!(aggregates.unwrap().len(), 2);
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_file("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert_eq!(content.trim(), "[]");
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_file("report-full.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["scenario_name"], "Smoke Test");
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_file("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("last-breath"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_file("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("No scenarios executed"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let temp = temp_file("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Some(&[sample_record()]), None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("scenario,difficulty,strategy"));
        assert!(content.contains("Normal - Balanced,normal,balanced,1337,1337,40"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_console_includes_playability() {
        let temp = temp_file("report-console.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let aggregates = aggregate_playability(&[sample_record()]);
        write_reports(
            &args,
            &[sample_result(false)],
            None,
            Some(&aggregates),
            Instant::now(),
        )
        .unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("Playability Summary"));
        assert!(content.contains("Normal - Balanced"));
        assert!(content.contains("Total time"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
