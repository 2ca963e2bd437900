//! Default config generation.

use clap::Args;
use diffuse_config::{EngineConfig, default_config_path};
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Where to write the config (defaults to the user config directory)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Number of inputs
    #[arg(long)]
    inputs: Option<usize>,

    /// Number of outputs
    #[arg(long)]
    outputs: Option<usize>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(default_config_path);
    if path.exists() && !args.force {
        anyhow::bail!(
            "'{}' already exists. Use --force to overwrite.",
            path.display()
        );
    }

    let defaults = EngineConfig::default();
    let config = EngineConfig {
        inputs: args.inputs.unwrap_or(defaults.inputs),
        outputs: args.outputs.unwrap_or(defaults.outputs),
        ..defaults
    };
    config.validate()?;
    config.save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
