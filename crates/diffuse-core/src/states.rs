//! Slot commands: allocate, edit, store, and the persistence round trip.

use alloc::string::String;
use alloc::vec::Vec;

use crate::engine::DiffuseEngine;
use crate::error::{DiffuseError, Lookup, Result};
use crate::persistence::{Protection, SnapshotRepository};

impl DiffuseEngine {
    /// Allocates `count` slots after [`free_snapshots`](Self::free_snapshots).
    ///
    /// Fails with [`DiffuseError::InvalidArgument`] if slots already exist.
    pub fn new_snapshots(&mut self, count: usize) -> Result<()> {
        self.bank.create(count)?;
        self.bank.recompute(&self.curves);
        Ok(())
    }

    /// Releases every slot. Slot-addressed commands fail until re-created.
    pub fn free_snapshots(&mut self) {
        self.bank.destroy();
    }

    /// Changes the number of slots, keeping the first `min(old, new)`.
    pub fn resize_snapshots(&mut self, count: usize) -> Result<()> {
        self.bank.resize(count)?;
        self.bank.recompute(&self.curves);
        Ok(())
    }

    /// Rewrites a slot's gains.
    pub fn set_snapshot(&mut self, slot: usize, gains: &[f64]) -> Result<()> {
        self.bank.set_gains(slot, gains, &self.curves)
    }

    /// Renames a slot.
    pub fn name_snapshot(&mut self, slot: usize, name: &str) -> Result<()> {
        self.bank.rename(slot, name)
    }

    /// Copies one slot into another.
    pub fn copy_snapshot(&mut self, src: usize, dst: usize) -> Result<()> {
        self.bank.copy_between(src, dst)
    }

    /// Captures a channel's current amplitudes into a slot.
    pub fn store(&mut self, channel: usize, slot: usize, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(DiffuseError::InvalidArgument("state name must not be empty"));
        }
        let channel = self
            .channels
            .get(channel)
            .ok_or(DiffuseError::NotFound(Lookup::Channel(channel)))?;
        let snapshot = self.bank.get_mut(slot)?;
        snapshot.set_gains(channel.current_gain(), &self.curves)?;
        snapshot.set_name(name);
        Ok(())
    }

    /// Persists a slot's gains under `name`.
    pub fn save(
        &mut self,
        slot: usize,
        name: &str,
        protection: Protection,
        repository: &mut dyn SnapshotRepository,
    ) -> Result<()> {
        let snapshot = self.bank.get(slot)?;
        repository.save(name, snapshot.gains(), protection)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(slot, name, "state saved");
        Ok(())
    }

    /// Loads the entry `name` into a slot and recomputes its abscissae.
    ///
    /// The slot takes the entry's name. A gain count that differs from the
    /// output count fails with [`DiffuseError::CountMismatch`].
    pub fn load(
        &mut self,
        name: &str,
        slot: usize,
        repository: &dyn SnapshotRepository,
    ) -> Result<()> {
        self.bank.get(slot)?;
        let record = repository.load(name)?;
        let snapshot = self.bank.get_mut(slot)?;
        snapshot.set_gains(&record.gains, &self.curves)?;
        snapshot.set_name(&record.name);

        #[cfg(feature = "tracing")]
        tracing::debug!(slot, name, "state loaded");
        Ok(())
    }

    /// Removes a persisted entry.
    pub fn delete(
        &mut self,
        name: &str,
        protection: Protection,
        repository: &mut dyn SnapshotRepository,
    ) -> Result<()> {
        repository.delete(name, protection)
    }

    /// Renames a persisted entry.
    pub fn rename(
        &mut self,
        from: &str,
        to: &str,
        protection: Protection,
        repository: &mut dyn SnapshotRepository,
    ) -> Result<()> {
        repository.rename(from, to, protection)
    }

    /// Names of every persisted entry.
    pub fn stored_names(&self, repository: &dyn SnapshotRepository) -> Result<Vec<String>> {
        repository.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveFamily;
    use crate::engine::EngineSettings;
    use crate::error::Lookup;
    use crate::persistence::MemoryRepository;

    fn engine() -> DiffuseEngine {
        DiffuseEngine::new(EngineSettings {
            inputs: 1,
            outputs: 2,
            slots: 3,
            sample_rate: 1000.0,
            ..EngineSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn store_captures_current_gains() {
        let mut e = engine();
        e.set_channel_gains(0, &[0.2, 0.9]).unwrap();
        e.store(0, 1, "capture").unwrap();
        let slot = e.snapshots().get(1).unwrap();
        assert_eq!(slot.gains(), &[0.2, 0.9]);
        assert_eq!(slot.name(), "capture");
        assert!(e.store(0, 1, "").is_err());
        assert!(e.store(3, 1, "x").is_err());
    }

    #[test]
    fn save_load_round_trip() {
        let mut e = engine();
        let mut repo = MemoryRepository::new();
        e.set_snapshot(0, &[0.4, 0.6]).unwrap();
        e.save(0, "wide", Protection::Default, &mut repo).unwrap();

        e.load("wide", 2, &repo).unwrap();
        let slot = e.snapshots().get(2).unwrap();
        assert_eq!(slot.gains(), &[0.4, 0.6]);
        assert_eq!(slot.name(), "wide");
        let curve = e.curves().get(CurveFamily::Xfade);
        assert!((slot.abscissa(CurveFamily::Xfade)[0] - curve.inverse(0.4)).abs() < 1e-12);
    }

    #[test]
    fn load_rejects_wrong_count() {
        let mut e = engine();
        let mut repo = MemoryRepository::new();
        repo.save("mono", &[1.0], Protection::Default).unwrap();
        assert_eq!(
            e.load("mono", 0, &repo),
            Err(DiffuseError::CountMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            e.load("missing", 0, &repo),
            Err(DiffuseError::NotFound(Lookup::State(_)))
        ));
    }

    #[test]
    fn protection_is_enforced_through_the_engine() {
        let mut e = engine();
        let mut repo = MemoryRepository::new();
        e.save(0, "x", Protection::Protect, &mut repo).unwrap();
        assert_eq!(
            e.save(0, "x", Protection::Default, &mut repo),
            Err(DiffuseError::WriteProtected("x".into()))
        );
        e.save(1, "y", Protection::Default, &mut repo).unwrap();
        e.save(1, "y", Protection::Default, &mut repo).unwrap();

        e.rename("y", "z", Protection::Default, &mut repo).unwrap();
        e.delete("z", Protection::Default, &mut repo).unwrap();
        assert_eq!(e.stored_names(&repo).unwrap(), ["x"]);
    }

    #[test]
    fn free_new_resize_cycle() {
        let mut e = engine();
        assert!(e.new_snapshots(4).is_err());
        e.free_snapshots();
        assert_eq!(
            e.set_snapshot(0, &[0.0, 0.0]),
            Err(DiffuseError::NotFound(Lookup::Slots))
        );
        assert!(e.ramp_to(0, 0, 10.0, CurveFamily::Ramp).is_err());

        e.new_snapshots(2).unwrap();
        e.set_snapshot(1, &[1.0, 1.0]).unwrap();
        e.resize_snapshots(6).unwrap();
        assert_eq!(e.snapshots().len(), 6);
        assert_eq!(e.snapshots().get(1).unwrap().gains(), &[1.0, 1.0]);
    }

    #[test]
    fn copy_and_name() {
        let mut e = engine();
        e.set_snapshot(0, &[0.5, 0.5]).unwrap();
        e.name_snapshot(0, "center").unwrap();
        e.copy_snapshot(0, 2).unwrap();
        assert_eq!(e.snapshots().get(2).unwrap().name(), "center");
    }
}
