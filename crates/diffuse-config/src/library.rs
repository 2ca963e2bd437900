//! TOML-backed state library.
//!
//! A [`StateLibrary`] is a single TOML file holding named snapshots. It
//! implements [`SnapshotRepository`], so an engine can save, load, delete
//! and rename states straight into it.
//!
//! # TOML Format
//!
//! ```toml
//! [states.front]
//! name = "front"
//! count = 4
//! ordinate = [1.0, 1.0, 0.0, 0.0]
//! protected = true
//!
//! [states.rear]
//! name = "rear"
//! count = 4
//! ordinate = [0.0, 0.0, 1.0, 1.0]
//! ```
//!
//! Every change is written back to disk before it becomes visible. A write
//! that fails leaves the in-memory library as it was.

use diffuse_core::{MemoryRepository, Protection, SnapshotRecord, SnapshotRepository};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths::ensure_parent_dir;

/// One `[states.<name>]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateEntry {
    /// Entry name. Must match the table key.
    pub name: String,
    /// Number of gain values.
    pub count: usize,
    /// Per-output gains in [0, 1].
    pub ordinate: Vec<f64>,
    /// Whether default writes to this entry are refused.
    #[serde(default)]
    pub protected: bool,
}

impl StateEntry {
    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidState {
            name: key.to_string(),
            reason,
        };
        if self.name != key {
            return Err(invalid(format!("name '{}' does not match its table", self.name)));
        }
        if self.count != self.ordinate.len() {
            return Err(invalid(format!(
                "count {} does not match {} ordinate values",
                self.count,
                self.ordinate.len()
            )));
        }
        if let Some(bad) = self.ordinate.iter().find(|g| !(0.0..=1.0).contains(*g)) {
            return Err(invalid(format!("gain {bad} is outside [0, 1]")));
        }
        Ok(())
    }
}

impl From<&SnapshotRecord> for StateEntry {
    fn from(record: &SnapshotRecord) -> Self {
        Self {
            name: record.name.clone(),
            count: record.gains.len(),
            ordinate: record.gains.clone(),
            protected: record.protected,
        }
    }
}

impl From<StateEntry> for SnapshotRecord {
    fn from(entry: StateEntry) -> Self {
        Self {
            name: entry.name,
            gains: entry.ordinate,
            protected: entry.protected,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    states: BTreeMap<String, StateEntry>,
}

/// Named snapshots persisted in a TOML file.
#[derive(Debug, Clone)]
pub struct StateLibrary {
    path: PathBuf,
    states: MemoryRepository,
}

impl StateLibrary {
    /// Opens the library at `path`.
    ///
    /// A missing file is an empty library; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "state library not found, starting empty");
            return Ok(Self {
                path,
                states: MemoryRepository::new(),
            });
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| ConfigError::read_file(&path, e))?;
        let states = parse(&content)?;
        tracing::debug!(path = %path.display(), states = states.len(), "state library loaded");
        Ok(Self { path, states })
    }

    /// File backing this library.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in name order.
    pub fn records(&self) -> impl Iterator<Item = &SnapshotRecord> {
        self.states.records()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Serializes the library.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        render(&self.states)
    }

    fn commit(&mut self, next: MemoryRepository) -> Result<(), ConfigError> {
        let content = render(&next)?;
        ensure_parent_dir(&self.path)?;
        std::fs::write(&self.path, content).map_err(|e| ConfigError::write_file(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), states = next.len(), "state library saved");
        self.states = next;
        Ok(())
    }
}

fn parse(content: &str) -> Result<MemoryRepository, ConfigError> {
    let file: LibraryFile = toml::from_str(content)?;
    let mut states = MemoryRepository::new();
    for (key, entry) in file.states {
        entry.validate(&key)?;
        states.insert(entry.into());
    }
    Ok(states)
}

fn render(states: &MemoryRepository) -> Result<String, ConfigError> {
    let file = LibraryFile {
        states: states
            .records()
            .map(|record| (record.name.clone(), StateEntry::from(record)))
            .collect(),
    };
    Ok(toml::to_string_pretty(&file)?)
}

impl SnapshotRepository for StateLibrary {
    fn save(&mut self, name: &str, gains: &[f64], protection: Protection) -> diffuse_core::Result<()> {
        let mut next = self.states.clone();
        next.save(name, gains, protection)?;
        Ok(self.commit(next)?)
    }

    fn load(&self, name: &str) -> diffuse_core::Result<SnapshotRecord> {
        self.states.load(name)
    }

    fn delete(&mut self, name: &str, protection: Protection) -> diffuse_core::Result<()> {
        let mut next = self.states.clone();
        next.delete(name, protection)?;
        Ok(self.commit(next)?)
    }

    fn rename(&mut self, from: &str, to: &str, protection: Protection) -> diffuse_core::Result<()> {
        let mut next = self.states.clone();
        next.rename(from, to, protection)?;
        Ok(self.commit(next)?)
    }

    fn names(&self) -> diffuse_core::Result<Vec<String>> {
        self.states.names()
    }
}
