//! Configuration and persistence for the diffuse engine.
//!
//! This crate is the file-facing side of `diffuse-core`: the engine itself
//! never touches storage.
//!
//! # Features
//!
//! - **Engine config**: [`EngineConfig`] loads channel counts, gains, curves
//!   and the meter mode from TOML and builds a [`DiffuseEngine`]
//! - **State library**: [`StateLibrary`] persists named snapshots in a TOML
//!   file and implements [`SnapshotRepository`]
//! - **Console syntax**: [`parse_command`] turns a text line into a [`Command`]
//! - **Cue lists**: [`CueList`] schedules commands on sample frames
//! - **Paths**: platform-specific config and library locations
//!
//! # Example
//!
//! ```rust,no_run
//! use diffuse_config::{EngineConfig, StateLibrary, parse_command};
//!
//! let config = EngineConfig::load("engine.toml").unwrap();
//! let mut engine = config.build().unwrap();
//! let mut library = StateLibrary::open(config.library_path()).unwrap();
//!
//! let command = parse_command("state load front 0").unwrap();
//! engine.apply(command, &mut library).unwrap();
//! ```
//!
//! [`DiffuseEngine`]: diffuse_core::DiffuseEngine
//! [`SnapshotRepository`]: diffuse_core::SnapshotRepository
//! [`Command`]: diffuse_core::Command

mod config;
mod console;
mod cue;
mod error;
mod library;

/// Platform-specific paths for the engine config and state library.
pub mod paths;

pub use config::{CurveConfig, EngineConfig};
pub use console::parse_command;
pub use cue::{Cue, CueList, ScheduledCue};
pub use error::ConfigError;
pub use library::{StateEntry, StateLibrary};
pub use paths::{default_config_path, default_library_path, ensure_user_config_dir, user_config_dir};
