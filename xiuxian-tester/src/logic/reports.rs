use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use crate::logic::playability::{PlayabilityAggregate, PlayabilityRecord};
use xiuxian_game::ActionId;

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (passed as f64 / total as f64) * 100.0
    }
}

/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[PlayabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(
        out,
        "Success rate: {:.1}%",
        success_rate(passed_tests, total_tests)
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|r| r.average_duration),
        results.iter().max_by_key(|r| r.average_duration),
    ) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
        writeln!(out)?;
    }

    write_playability_summary(out, aggregates)
}

fn write_playability_summary(out: &mut dyn Write, aggregates: &[PlayabilityAggregate]) -> Result<()> {
    if aggregates.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", "🧘 Playability Summary".bright_magenta().bold())?;
    writeln!(out, "{}", "======================".magenta())?;
    for aggregate in aggregates {
        writeln!(
            out,
            "{:24} runs {:3} | turns {:7.1} ±{:6.1} | ascend {:5.1}% die {:5.1}% cap {:5.1}% | realm {:.2} | power {:9.1} | pills {:5.1} | achievements {:.1}",
            aggregate.scenario_name,
            aggregate.iterations,
            aggregate.mean_turns,
            aggregate.std_turns,
            aggregate.ascension_pct * 100.0,
            aggregate.death_pct * 100.0,
            aggregate.turn_limit_pct * 100.0,
            aggregate.mean_final_realm,
            aggregate.mean_power,
            aggregate.mean_pills_earned,
            aggregate.mean_achievements
        )?;
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Xiuxian Logic Test Results\n")?;
    writeln!(
        out,
        "_Generated {}_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {} (seed {})\n", status, result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// One row per playability run.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_csv_report(out: &mut dyn Write, records: &[PlayabilityRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,difficulty,strategy,seed,seed_value,turns,ending,final_realm,hp,mp,pills,total_exp,power,breakthroughs,pills_earned,pills_consumed,failed_actions,longest_streak,meditate,consume_pill,cultivate,wait,achievements"
    )?;
    for record in records {
        let m = &record.metrics;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&record.scenario_name),
            record.difficulty,
            record.strategy.key(),
            csv_field(&record.seed_label),
            record.seed_value,
            m.turns_taken,
            m.ending.label(),
            m.final_realm,
            m.final_health,
            m.final_mana,
            m.final_pills,
            m.total_experience,
            m.power_level,
            m.breakthroughs,
            m.pills_earned,
            m.pills_consumed,
            m.failed_actions,
            m.longest_meditation_streak,
            m.action_count(ActionId::Meditate),
            m.action_count(ActionId::ConsumePill),
            m.action_count(ActionId::Cultivate),
            m.action_count(ActionId::Wait),
            m.achievements_unlocked
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::game_tester::PlayabilityMetrics;
    use crate::logic::policy::GameplayStrategy;
    use xiuxian_game::Difficulty;

    fn result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".to_string(),
            seed: 1337,
            passed,
            iterations_run: 2,
            successful_iterations: usize::from(passed) * 2,
            failures: if passed {
                Vec::new()
            } else {
                vec!["boom".to_string()]
            },
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn markdown_lists_failures() {
        let text = render(|out| generate_markdown_report(out, &[result(true), result(false)]));
        assert!(text.starts_with("# Xiuxian Logic Test Results"));
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("  - boom"));
    }

    #[test]
    fn console_report_handles_empty_aggregates() {
        let text =
            render(|out| generate_console_report(out, &[result(true)], &[], Duration::ZERO));
        assert!(text.contains("Total scenarios: 1"));
        assert!(!text.contains("Playability Summary"));
    }

    #[test]
    fn csv_has_header_and_escaped_rows() {
        let record = PlayabilityRecord {
            scenario_name: "Easy - Meditator".to_string(),
            difficulty: Difficulty::Easy,
            strategy: GameplayStrategy::Meditator,
            seed_label: "jade, lotus".to_string(),
            seed_value: 9,
            metrics: PlayabilityMetrics::default(),
        };
        let text = render(|out| generate_csv_report(out, &[record]));
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("scenario,difficulty,strategy"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Easy - Meditator,easy,meditator,\"jade, lotus\",9,0,Turn limit,Qi Refining"));
    }

    #[test]
    fn json_report_is_an_array() {
        let text = render(|out| generate_json_report(out, &[result(true)]));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["scenario_name"], "Smoke");
    }
}
