//! Diffuse CLI - offline rendering and state management for the diffuse engine.

mod commands;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "diffuse")]
#[command(author, version, about = "N-to-M audio diffusion engine", long_about = None)]
struct Cli {
    /// Log control-path operations (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render WAV inputs through a cue list to a multichannel WAV
    Render(commands::render::RenderArgs),

    /// Run console commands from stdin or a script
    Console(commands::console::ConsoleArgs),

    /// List and manage the state library
    States(commands::states::StatesArgs),

    /// Print transfer tables for the curve shapes
    Curves(commands::curves::CurvesArgs),

    /// Write a default engine config
    Init(commands::init::InitArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Console(args) => commands::console::run(args),
        Commands::States(args) => commands::states::run(args),
        Commands::Curves(args) => commands::curves::run(args),
        Commands::Init(args) => commands::init::run(args),
    }
}
