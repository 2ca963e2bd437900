//! Timed command lists for offline rendering.
//!
//! # TOML Format
//!
//! ```toml
//! [[cues]]
//! at_ms = 0.0
//! command = "channel on all"
//!
//! [[cues]]
//! at_ms = 250.0
//! command = "ramp_to 0 1 1500 ramp"
//! ```
//!
//! Each `command` uses the console syntax of [`parse_command`].

use diffuse_core::Command;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::console::parse_command;
use crate::error::ConfigError;

/// One command and the time it fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cue {
    /// Time from the start of the render, in milliseconds.
    pub at_ms: f64,
    /// Console command text.
    pub command: String,
}

/// A parsed cue, positioned on a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledCue {
    /// Sample frame the command is applied before.
    pub at_sample: u64,
    /// The command.
    pub command: Command,
}

/// Cue list file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CueList {
    /// Cues in file order.
    #[serde(default)]
    pub cues: Vec<Cue>,
}

impl CueList {
    /// Load a cue list from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let cues = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), cues = cues.len(), "cue list loaded");
        Ok(cues)
    }

    /// Load a cue list from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Number of cues.
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Parses every command and converts times to sample frames.
    ///
    /// The result is ordered by time; cues sharing a frame keep file order.
    pub fn schedule(&self, sample_rate: f64) -> Result<Vec<ScheduledCue>, ConfigError> {
        let mut scheduled = Vec::with_capacity(self.cues.len());
        for (i, cue) in self.cues.iter().enumerate() {
            if !(cue.at_ms.is_finite() && cue.at_ms >= 0.0) {
                return Err(ConfigError::setting(
                    format!("cues[{i}].at_ms"),
                    "must be a non-negative time",
                ));
            }
            scheduled.push(ScheduledCue {
                at_sample: (cue.at_ms * sample_rate / 1000.0).round() as u64,
                command: parse_command(&cue.command)?,
            });
        }
        scheduled.sort_by_key(|cue| cue.at_sample);
        Ok(scheduled)
    }
}
