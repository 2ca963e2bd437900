//! Console command runner.
//!
//! Reads one command per line and applies it to a fresh engine, printing
//! each reply. Useful for building and saving states without audio:
//!
//! ```text
//! $ printf 'state set 0 1 0\nstate save 0 left\n' | diffuse console
//! ```

use super::common::{load_config, open_library, print_reply};
use clap::Args;
use diffuse_config::parse_command;
use diffuse_core::{DiffuseEngine, SnapshotRepository};
use std::io::BufRead;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConsoleArgs {
    /// Script file; reads stdin when omitted
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Engine config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State library, overriding the config
    #[arg(long)]
    library: Option<PathBuf>,

    /// Stop at the first failing command
    #[arg(long)]
    strict: bool,
}

pub fn run(args: ConsoleArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut engine = config.build()?;
    let mut library = open_library(&config, args.library.as_ref())?;

    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(std::io::BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(std::io::stdin().lock()),
    };

    let mut failures = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if let Err(e) = execute(&mut engine, &mut library, &line) {
            failures += 1;
            eprintln!("line {}: {e}", number + 1);
            if args.strict {
                anyhow::bail!("stopped after a failing command");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} command(s) failed");
    }
    Ok(())
}

/// Applies one line. Blank lines and `#` comments are ignored.
fn execute(
    engine: &mut DiffuseEngine,
    repository: &mut dyn SnapshotRepository,
    line: &str,
) -> anyhow::Result<()> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }
    let command = parse_command(line)?;
    let reply = engine.apply(command, repository)?;
    print_reply(&reply);
    Ok(())
}
