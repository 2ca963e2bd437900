//! Named snapshot persistence.
//!
//! The engine never touches storage itself. Save, load, delete and rename go
//! through a [`SnapshotRepository`], which stores exactly a name, the gain
//! vector and a protection flag. Abscissae are never stored; they are
//! recomputed after every load.
//!
//! # Protection
//!
//! | Operation | [`Protection::Default`] | [`Protection::Protect`] | [`Protection::Override`] |
//! |-----------|-------------------------|-------------------------|--------------------------|
//! | save | fails on a protected entry, stores unprotected | overwrites, stores protected | overwrites, stores unprotected |
//! | delete / rename | fails on a protected entry | proceeds | proceeds |

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str::FromStr;

use crate::error::{DiffuseError, Lookup, Result};

/// A persisted snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    /// Entry name.
    pub name: String,
    /// Per-output gains.
    pub gains: Vec<f64>,
    /// Whether default writes to this entry are refused.
    pub protected: bool,
}

/// How a write treats the protection flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protection {
    /// Refuse to touch a protected entry.
    #[default]
    Default,
    /// Bypass the check and mark the saved entry protected.
    Protect,
    /// Bypass the check.
    Override,
}

impl Protection {
    /// Whether a protected entry may be touched.
    pub fn bypasses(self) -> bool {
        self != Self::Default
    }

    /// Protection flag stored by a save.
    pub fn stored_flag(self) -> bool {
        self == Self::Protect
    }
}

impl FromStr for Protection {
    type Err = DiffuseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "default" => Ok(Self::Default),
            "protect" => Ok(Self::Protect),
            "override" => Ok(Self::Override),
            _ => Err(DiffuseError::InvalidArgument("expected protect or override")),
        }
    }
}

/// Storage for named snapshots.
pub trait SnapshotRepository {
    /// Stores `gains` under `name`.
    fn save(&mut self, name: &str, gains: &[f64], protection: Protection) -> Result<()>;

    /// Fetches the entry called `name`.
    fn load(&self, name: &str) -> Result<SnapshotRecord>;

    /// Removes the entry called `name`.
    fn delete(&mut self, name: &str, protection: Protection) -> Result<()>;

    /// Moves the entry `from` to `to`.
    fn rename(&mut self, from: &str, to: &str, protection: Protection) -> Result<()>;

    /// Entry names in sorted order.
    fn names(&self) -> Result<Vec<String>>;
}

/// In-memory [`SnapshotRepository`].
///
/// Also the shared bookkeeping for file-backed stores, which load their
/// entries into one of these and write it back after each change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRepository {
    entries: BTreeMap<String, SnapshotRecord>,
}

impl MemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, bypassing protection.
    pub fn insert(&mut self, record: SnapshotRecord) {
        self.entries.insert(record.name.clone(), record);
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = &SnapshotRecord> {
        self.entries.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn guard(&self, name: &str, protection: Protection) -> Result<()> {
        match self.entries.get(name) {
            Some(entry) if entry.protected && !protection.bypasses() => {
                Err(DiffuseError::WriteProtected(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn require(&self, name: &str) -> Result<&SnapshotRecord> {
        self.entries
            .get(name)
            .ok_or_else(|| DiffuseError::NotFound(Lookup::State(name.to_string())))
    }
}

impl SnapshotRepository for MemoryRepository {
    fn save(&mut self, name: &str, gains: &[f64], protection: Protection) -> Result<()> {
        if name.is_empty() {
            return Err(DiffuseError::InvalidArgument("state name must not be empty"));
        }
        self.guard(name, protection)?;
        self.insert(SnapshotRecord {
            name: name.to_string(),
            gains: gains.to_vec(),
            protected: protection.stored_flag(),
        });
        Ok(())
    }

    fn load(&self, name: &str) -> Result<SnapshotRecord> {
        self.require(name).cloned()
    }

    fn delete(&mut self, name: &str, protection: Protection) -> Result<()> {
        self.require(name)?;
        self.guard(name, protection)?;
        self.entries.remove(name);
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str, protection: Protection) -> Result<()> {
        if to.is_empty() {
            return Err(DiffuseError::InvalidArgument("state name must not be empty"));
        }
        self.require(from)?;
        self.guard(from, protection)?;
        self.guard(to, protection)?;
        if let Some(mut record) = self.entries.remove(from) {
            record.name = to.to_string();
            self.insert(record);
        }
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load() {
        let mut repo = MemoryRepository::new();
        repo.save("front", &[1.0, 0.5], Protection::Default).unwrap();
        let record = repo.load("front").unwrap();
        assert_eq!(record.gains, [1.0, 0.5]);
        assert!(!record.protected);
        assert_eq!(
            repo.load("rear"),
            Err(DiffuseError::NotFound(Lookup::State("rear".into())))
        );
    }

    #[test]
    fn protected_entry_refuses_default_writes() {
        let mut repo = MemoryRepository::new();
        repo.save("x", &[0.1], Protection::Protect).unwrap();
        assert!(repo.load("x").unwrap().protected);

        assert_eq!(
            repo.save("x", &[0.2], Protection::Default),
            Err(DiffuseError::WriteProtected("x".into()))
        );
        assert_eq!(
            repo.delete("x", Protection::Default),
            Err(DiffuseError::WriteProtected("x".into()))
        );
        assert!(repo.rename("x", "y", Protection::Default).is_err());
        assert_eq!(repo.load("x").unwrap().gains, [0.1]);

        // override writes and clears the flag
        repo.save("x", &[0.3], Protection::Override).unwrap();
        let record = repo.load("x").unwrap();
        assert_eq!(record.gains, [0.3]);
        assert!(!record.protected);
        repo.save("x", &[0.4], Protection::Default).unwrap();
    }

    #[test]
    fn delete_and_rename() {
        let mut repo = MemoryRepository::new();
        repo.save("a", &[0.5], Protection::Default).unwrap();
        repo.save("b", &[0.7], Protection::Protect).unwrap();

        assert!(matches!(
            repo.delete("zzz", Protection::Override),
            Err(DiffuseError::NotFound(_))
        ));

        // destination is protected
        assert!(matches!(
            repo.rename("a", "b", Protection::Default),
            Err(DiffuseError::WriteProtected(_))
        ));
        repo.rename("a", "c", Protection::Default).unwrap();
        assert_eq!(repo.names().unwrap(), ["b", "c"]);
        assert_eq!(repo.load("c").unwrap().name, "c");

        repo.delete("b", Protection::Override).unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn protection_keywords() {
        assert_eq!("protect".parse::<Protection>().unwrap(), Protection::Protect);
        assert_eq!("override".parse::<Protection>().unwrap(), Protection::Override);
        assert_eq!("".parse::<Protection>().unwrap(), Protection::Default);
        assert!("force".parse::<Protection>().is_err());
        assert!(Protection::Override.bypasses());
        assert!(!Protection::Override.stored_flag());
    }
}
