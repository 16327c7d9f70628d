//! Interactive shellquest runner.
//!
//! Loads a level descriptor (a JSON file given as the first argument,
//! or a bundled demo level) and runs a read-eval-print loop over stdin.
//! Flags found in output are announced on stderr, standing in for the
//! hosting platform's progress tracker.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use shellquest_engine::{RecallDirection, ShellSession};
use shellquest_types::level::LevelDescriptor;
use shellquest_types::transcript::TranscriptKind;

const DEMO_LEVEL: &str = include_str!("../levels/demo.json");

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let source = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading level descriptor {path}"))?,
        None => DEMO_LEVEL.to_string(),
    };
    let level = LevelDescriptor::from_json(&source).context("parsing level descriptor")?;

    let mut session = ShellSession::new(&level).context("building session")?;
    session.set_flag_callback(Box::new(|token| {
        eprintln!("*** flag found: {token} ***");
    }));

    log::info!("session started at {}", session.cwd());
    run_repl(&mut session)
}

fn run_repl(session: &mut ShellSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("{}", session.prompt());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(&['\n', '\r'][..]);
        if line == "exit" {
            break;
        }
        // History recall has no key events on a line-based terminal;
        // `!up` / `!down` stand in for the arrow keys.
        if line == "!up" || line == "!down" {
            let direction = if line == "!up" {
                RecallDirection::Up
            } else {
                RecallDirection::Down
            };
            println!("{}", session.recall(direction));
            continue;
        }

        let result = session.submit(line);
        if result.cleared {
            // ANSI clear screen plus home.
            print!("\x1b[2J\x1b[H");
            continue;
        }
        // Skip the input echo; the user just typed it.
        for entry in result.appended.iter().skip(1) {
            match entry.kind {
                TranscriptKind::Error => println!("error: {}", entry.text),
                _ => println!("{}", entry.text),
            }
        }
    }
    Ok(())
}
