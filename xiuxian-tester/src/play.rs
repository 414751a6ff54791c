//! Line-oriented interactive session over a [`GameEngine`].
use anyhow::Result;
use colored::Colorize;
use std::io::{BufRead, Write};
use xiuxian_game::{GameCore, GameEngine, GameStorage};

pub const DEFAULT_SLOT: &str = "default";

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Read commands from `input` until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails. Game and
/// storage failures are reported to `out` and the loop keeps going.
pub fn run_interactive<S, R, W>(engine: &mut GameEngine<S>, input: R, out: &mut W) -> Result<()>
where
    S: GameStorage,
    S::Error: Into<anyhow::Error>,
    R: BufRead,
    W: Write,
{
    writeln!(out, "{}", "🏯 Xiuxian Cultivation".bright_cyan().bold())?;
    write_help(engine.core(), out)?;
    write_status(engine.core(), out)?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if handle_command(engine, line, out)? == Flow::Quit {
            break;
        }
        out.flush()?;
    }
    writeln!(out, "Farewell.")?;
    out.flush()?;
    Ok(())
}

fn handle_command<S, W>(engine: &mut GameEngine<S>, line: &str, out: &mut W) -> Result<Flow>
where
    S: GameStorage,
    S::Error: Into<anyhow::Error>,
    W: Write,
{
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let argument = parts.next();
    let slot = argument.unwrap_or(DEFAULT_SLOT);

    match command.as_str() {
        "quit" | "exit" | "q" => return Ok(Flow::Quit),
        "help" | "?" => write_help(engine.core(), out)?,
        "status" | "s" => write_status(engine.core(), out)?,
        "log" => {
            for entry in engine.core().log().recent(10) {
                writeln!(out, "  {entry}")?;
            }
        }
        "preview" => write_preview(engine.core(), argument.unwrap_or_default(), out)?,
        "save" => match engine.save_game(slot) {
            Ok(()) => writeln!(out, "Saved to slot '{slot}'.")?,
            Err(err) => writeln!(out, "{} {err:#}", "Save failed:".red())?,
        },
        "load" => match engine.load_game(slot) {
            Ok(true) => {
                writeln!(out, "Loaded slot '{slot}'.")?;
                write_status(engine.core(), out)?;
            }
            Ok(false) => writeln!(out, "No save in slot '{slot}'.")?,
            Err(err) => writeln!(out, "{} {err:#}", "Load failed:".red())?,
        },
        "delete" => match engine.delete_save(slot) {
            Ok(()) => writeln!(out, "Deleted slot '{slot}'.")?,
            Err(err) => {
                let err: anyhow::Error = err.into();
                writeln!(out, "{} {err:#}", "Delete failed:".red())?;
            }
        },
        "new" | "reset" => {
            engine.core_mut().reset(None, argument);
            write_status(engine.core(), out)?;
        }
        _ => return execute(engine.core_mut(), line, out),
    }
    Ok(Flow::Continue)
}

fn execute<W: Write>(core: &mut GameCore, key: &str, out: &mut W) -> Result<Flow> {
    let Some(id) = core.catalog().resolve(key) else {
        writeln!(out, "Unknown command '{key}'. Type 'help' for options.")?;
        return Ok(Flow::Continue);
    };
    let result = core.execute_action(id.as_str());
    if result.success {
        writeln!(out, "{}", result.message.green())?;
    } else {
        writeln!(out, "{}", result.message.yellow())?;
    }
    if core.is_game_over() {
        if let Some(last) = core.log().last() {
            writeln!(out, "{}", last.bold())?;
        }
        writeln!(out, "Type 'new' to begin again or 'quit' to leave.")?;
    } else if result.success {
        write_status(core, out)?;
    }
    Ok(Flow::Continue)
}

fn write_help<W: Write>(core: &GameCore, out: &mut W) -> Result<()> {
    writeln!(out, "Actions:")?;
    for info in core.catalog().infos() {
        writeln!(
            out,
            "  [{}] {:13} {}",
            info.hotkey,
            info.id.as_str(),
            info.description
        )?;
    }
    writeln!(
        out,
        "Commands: status, log, preview <action>, save [slot], load [slot], delete [slot], new [difficulty], help, quit"
    )?;
    Ok(())
}

fn write_status<W: Write>(core: &GameCore, out: &mut W) -> Result<()> {
    let Some(state) = core.game_state() else {
        writeln!(out, "No game in progress.")?;
        return Ok(());
    };
    let c = &state.character;
    writeln!(
        out,
        "{} | {} {:.1}% | HP {}/{} | MP {}/{} | pills {} | talent {} | power {}",
        c.name.bold(),
        c.realm,
        c.exp_progress,
        c.hp,
        c.max_hp,
        c.mp,
        c.max_mp,
        c.pills,
        c.talent,
        state.power_level
    )?;
    let available: Vec<&str> = state
        .actions
        .iter()
        .filter(|status| status.available)
        .map(|status| status.info.id.as_str())
        .collect();
    writeln!(out, "Available: {}", available.join(", "))?;
    if !state.is_game_over {
        writeln!(out, "Advice: {}", state.recommendation)?;
    }
    Ok(())
}

fn write_preview<W: Write>(core: &GameCore, key: &str, out: &mut W) -> Result<()> {
    let preview = core
        .catalog()
        .resolve(key)
        .and_then(|id| core.simulate_action(id.as_str()));
    let Some(preview) = preview else {
        writeln!(out, "Nothing to preview for '{key}'.")?;
        return Ok(());
    };
    let costs: Vec<String> = preview
        .cost
        .to_map()
        .into_iter()
        .map(|(resource, amount)| format!("{resource} {amount}"))
        .collect();
    let p = preview.projected;
    writeln!(
        out,
        "{}: cost [{}] | up to +{} HP +{} MP +{} exp +{} pills",
        preview.id,
        costs.join(", "),
        p.health,
        p.mana,
        p.experience,
        p.pills
    )?;
    if let Some(reason) = preview.reason {
        writeln!(out, "Unavailable: {reason}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use std::io::Cursor;
    use xiuxian_game::{Difficulty, GameSetup, TalentScore};

    fn engine(label: &str) -> GameEngine<FileStorage> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("xiuxian-play-{label}-{nanos}"));
        let mut core = GameCore::new(21);
        core.start(
            GameSetup::new(Difficulty::Normal)
                .name("Yun")
                .talent(TalentScore::new(5).unwrap()),
        );
        GameEngine::new(core, FileStorage::new(dir))
    }

    fn play(engine: &mut GameEngine<FileStorage>, script: &str) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        run_interactive(engine, Cursor::new(script.to_string()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn hotkeys_and_ids_both_execute() {
        let mut engine = engine("keys");
        let text = play(&mut engine, "1\nmeditate\nquit\nwait\n");
        assert_eq!(engine.core().character().unwrap().total_actions, 2);
        assert!(text.contains("You meditate"));
        assert!(text.ends_with("Farewell.\n"));
    }

    #[test]
    fn save_and_load_restore_the_character() {
        let mut engine = engine("slots");
        let text = play(&mut engine, "meditate\nsave alpha\ncultivate\nload alpha\n");
        assert!(text.contains("Saved to slot 'alpha'."));
        assert!(text.contains("Loaded slot 'alpha'."));
        let character = engine.core().character().unwrap();
        assert_eq!(character.total_actions, 1);
        let _ = std::fs::remove_dir_all(engine.storage().dir());
    }

    #[test]
    fn unknown_commands_and_missing_slots_are_reported() {
        let mut engine = engine("unknown");
        let text = play(&mut engine, "fly\nload nowhere\npreview cultivate\n");
        assert!(text.contains("Unknown command 'fly'"));
        assert!(text.contains("No save in slot 'nowhere'."));
        assert!(text.contains("cultivate: cost [mp 20, time 2]"));
    }

    #[test]
    fn failed_actions_leave_state_and_print_reason() {
        let mut engine = engine("fail");
        let text = play(&mut engine, "cultivate\ncultivate\ncultivate\n");
        assert!(text.contains("Insufficient mana to cultivate"));
        assert_eq!(engine.core().character().unwrap().mana.current(), 10);
    }

    #[test]
    fn new_game_resets_progress() {
        let mut engine = engine("reset");
        play(&mut engine, "meditate\nnew hard\n");
        assert_eq!(engine.core().character().unwrap().total_actions, 0);
        assert_eq!(engine.core().difficulty(), Difficulty::Hard);
    }
}
