//! State library management commands.

use super::common::{load_config, open_library};
use clap::{Args, Subcommand};
use diffuse_config::{StateEntry, StateLibrary, default_config_path, default_library_path};
use diffuse_core::{Protection, SnapshotRepository};
use std::path::PathBuf;

#[derive(Args)]
pub struct StatesArgs {
    /// State library, overriding the config
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Engine config (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: StatesCommand,
}

#[derive(Subcommand)]
enum StatesCommand {
    /// List stored states
    List {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the gains of a stored state
    Show {
        /// State name
        name: String,

        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored state
    Delete {
        /// State name
        name: String,

        /// Delete even if the state is protected
        #[arg(long)]
        force: bool,
    },

    /// Rename a stored state
    Rename {
        /// Current name
        from: String,

        /// New name
        to: String,

        /// Rename even if either name is protected
        #[arg(long)]
        force: bool,
    },

    /// Show config and library paths
    Paths,
}

fn protection(force: bool) -> Protection {
    if force {
        Protection::Override
    } else {
        Protection::Default
    }
}

pub fn run(args: StatesArgs) -> anyhow::Result<()> {
    if matches!(args.command, StatesCommand::Paths) {
        return show_paths(&args);
    }

    let config = load_config(args.config.as_deref())?;
    let mut library = open_library(&config, args.library.as_ref())?;
    match args.command {
        StatesCommand::List { json } => list_states(&library, json),
        StatesCommand::Show { name, json } => show_state(&library, &name, json),
        StatesCommand::Delete { name, force } => {
            library.delete(&name, protection(force))?;
            println!("Deleted '{name}'");
            Ok(())
        }
        StatesCommand::Rename { from, to, force } => {
            library.rename(&from, &to, protection(force))?;
            println!("Renamed '{from}' to '{to}'");
            Ok(())
        }
        StatesCommand::Paths => Ok(()),
    }
}

fn list_states(library: &StateLibrary, json: bool) -> anyhow::Result<()> {
    if json {
        let entries: Vec<StateEntry> = library.records().map(StateEntry::from).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    println!("States in {}:", library.path().display());
    if library.is_empty() {
        println!("  (none)");
        println!();
        println!("  Save one with: diffuse console, then 'state save <slot> <name>'");
        return Ok(());
    }
    for record in library.records() {
        let marker = if record.protected { " [protected]" } else { "" };
        println!("  {:20} {} outputs{}", record.name, record.gains.len(), marker);
    }
    Ok(())
}

fn show_state(library: &StateLibrary, name: &str, json: bool) -> anyhow::Result<()> {
    let record = library.load(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&StateEntry::from(&record))?);
        return Ok(());
    }
    println!("State: {}", record.name);
    println!("{}", "=".repeat(7 + record.name.len()));
    println!("Protected: {}", if record.protected { "yes" } else { "no" });
    println!();
    for (output, gain) in record.gains.iter().enumerate() {
        println!(
            "  {output:3}  {gain:.4}  {:7.1} dB",
            diffuse_core::linear_to_db(*gain)
        );
    }
    Ok(())
}

fn show_paths(args: &StatesArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    println!("Config:         {}", default_config_path().display());
    println!("Default states: {}", default_library_path().display());
    let active = args.library.clone().unwrap_or_else(|| config.library_path());
    println!("Active states:  {}", active.display());
    Ok(())
}
