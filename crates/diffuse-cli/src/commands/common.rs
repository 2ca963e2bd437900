//! Shared CLI helpers used across multiple commands.

use diffuse_config::{EngineConfig, StateLibrary, default_config_path};
use diffuse_core::Reply;
use std::path::{Path, PathBuf};

/// Load the engine config.
///
/// An explicit path must exist. Without one, the default config file is used
/// if present, otherwise built-in defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = path {
        return Ok(EngineConfig::load(path)?);
    }
    let default = default_config_path();
    if default.is_file() {
        return Ok(EngineConfig::load(&default)?);
    }
    tracing::debug!("no engine config found, using defaults");
    Ok(EngineConfig::default())
}

/// Open the state library named on the command line or in the config.
pub fn open_library(
    config: &EngineConfig,
    library: Option<&PathBuf>,
) -> anyhow::Result<StateLibrary> {
    let path = library.cloned().unwrap_or_else(|| config.library_path());
    Ok(StateLibrary::open(path)?)
}

/// Print the visible part of a command reply.
pub fn print_reply(reply: &Reply) {
    match reply {
        Reply::Done => {}
        Reply::Snapshot(info) => println!("{info}"),
        Reply::Channel(info) => println!("{info}"),
        Reply::Engine(info) => println!("{info}"),
        Reply::Report(text) => println!("{text}"),
    }
}
