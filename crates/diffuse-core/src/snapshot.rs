//! Snapshot (state) store.
//!
//! A [`Snapshot`] is a named per-output gain vector together with its
//! abscissa under both global curves, so a ramp can start without inverting
//! anything. [`SnapshotBank`] owns a fixed array of user-addressable slots
//! plus one reserved scratch snapshot that holds intermediate results of
//! `ramp_between`, `ramp_max` and `circular`.
//!
//! Slots are allocated together and never freed individually. Operations
//! overwrite slot content in place.

use alloc::string::String;
use alloc::vec::Vec;

use crate::curve::{CurveFamily, CurveSet};
use crate::error::{try_filled, try_with_capacity, DiffuseError, Lookup, Result};

/// Name given to freshly allocated slots.
pub const DEFAULT_NAME: &str = "null";

/// One named gain vector with both precomputed abscissa vectors.
///
/// `abscissa(family)[i]` always equals `curves.get(family).inverse(gains[i])`
/// for the curves it was last recomputed with.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    name: String,
    index: Option<usize>,
    gains: Vec<f64>,
    abscissa_ramp: Vec<f64>,
    abscissa_xfade: Vec<f64>,
    selector: CurveFamily,
}

impl Snapshot {
    /// Allocates a silent snapshot. `index` is `None` for scratch.
    fn silent(outputs: usize, index: Option<usize>) -> Result<Self> {
        let mut name = String::new();
        name.try_reserve(DEFAULT_NAME.len())
            .map_err(|_| DiffuseError::AllocationFailure)?;
        name.push_str(DEFAULT_NAME);
        Ok(Self {
            name,
            index,
            gains: try_filled(outputs, 0.0)?,
            abscissa_ramp: try_filled(outputs, 0.0)?,
            abscissa_xfade: try_filled(outputs, 0.0)?,
            selector: CurveFamily::default(),
        })
    }

    /// Snapshot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable slot position, `None` for the scratch snapshot.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Per-output gains in `[0, 1]`.
    pub fn gains(&self) -> &[f64] {
        &self.gains
    }

    /// Precomputed abscissa vector for a curve family.
    pub fn abscissa(&self, family: CurveFamily) -> &[f64] {
        match family {
            CurveFamily::Ramp => &self.abscissa_ramp,
            CurveFamily::Xfade => &self.abscissa_xfade,
        }
    }

    /// Family whose abscissa was last used from this snapshot.
    pub fn selector(&self) -> CurveFamily {
        self.selector
    }

    pub(crate) fn select(&mut self, family: CurveFamily) {
        self.selector = family;
    }

    fn abscissa_mut(&mut self, family: CurveFamily) -> &mut [f64] {
        match family {
            CurveFamily::Ramp => &mut self.abscissa_ramp,
            CurveFamily::Xfade => &mut self.abscissa_xfade,
        }
    }

    /// Rewrites the gains and both abscissa vectors.
    ///
    /// Fails with [`DiffuseError::CountMismatch`] when the length differs
    /// from the output count, and with [`DiffuseError::InvalidArgument`]
    /// when a value lies outside `[0, 1]`. Nothing is written on failure.
    pub fn set_gains(&mut self, values: &[f64], curves: &CurveSet) -> Result<()> {
        check_gains(values, self.gains.len())?;
        self.gains.copy_from_slice(values);
        self.recompute(curves);
        Ok(())
    }

    /// Recomputes both abscissa vectors from the gains.
    pub fn recompute(&mut self, curves: &CurveSet) {
        let ramp = curves.ramp.resolve();
        let xfade = curves.xfade.resolve();
        for ((g, ur), ux) in self
            .gains
            .iter()
            .zip(self.abscissa_ramp.iter_mut())
            .zip(self.abscissa_xfade.iter_mut())
        {
            *ur = ramp.inverse(*g);
            *ux = xfade.inverse(*g);
        }
    }

    /// Writes an abscissa vector for `family` and derives everything else.
    ///
    /// Gains become `forward(u)` under the family's curve and the other
    /// family's abscissa is recomputed from them. Values are clamped to
    /// `[0, 1]`.
    pub(crate) fn fill_abscissa(
        &mut self,
        family: CurveFamily,
        curves: &CurveSet,
        mut abscissa_at: impl FnMut(usize) -> f64,
    ) {
        let curve = curves.get(family).resolve();
        let other = curves.get(family.other()).resolve();
        for i in 0..self.gains.len() {
            let u = abscissa_at(i).clamp(0.0, 1.0);
            let g = curve.forward(u);
            self.abscissa_mut(family)[i] = u;
            self.gains[i] = g;
            self.abscissa_mut(family.other())[i] = other.inverse(g);
        }
        self.selector = family;
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name.clear();
        self.name.push_str(name);
    }

    /// Copies content (not the index) from another snapshot.
    fn copy_from(&mut self, other: &Snapshot) {
        self.set_name(&other.name);
        self.gains.copy_from_slice(&other.gains);
        self.abscissa_ramp.copy_from_slice(&other.abscissa_ramp);
        self.abscissa_xfade.copy_from_slice(&other.abscissa_xfade);
        self.selector = other.selector;
    }
}

/// Validates a gain vector against the output count.
pub(crate) fn check_gains(values: &[f64], outputs: usize) -> Result<()> {
    if values.len() != outputs {
        return Err(DiffuseError::CountMismatch {
            expected: outputs,
            found: values.len(),
        });
    }
    if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
        return Err(DiffuseError::InvalidArgument("gains must lie in [0, 1]"));
    }
    Ok(())
}

/// Fixed array of snapshot slots plus the reserved scratch snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotBank {
    outputs: usize,
    slots: Option<Vec<Snapshot>>,
    scratch: Snapshot,
}

impl SnapshotBank {
    /// Allocates `capacity` silent slots of `outputs` gains each.
    pub fn new(capacity: usize, outputs: usize) -> Result<Self> {
        Ok(Self {
            outputs,
            slots: Some(allocate_slots(0..capacity, outputs)?),
            scratch: Snapshot::silent(outputs, None)?,
        })
    }

    /// Allocates the slot array after [`destroy`](Self::destroy).
    ///
    /// Fails with [`DiffuseError::InvalidArgument`] if an array already exists.
    pub fn create(&mut self, capacity: usize) -> Result<()> {
        if self.slots.is_some() {
            return Err(DiffuseError::InvalidArgument("state array already exists"));
        }
        self.slots = Some(allocate_slots(0..capacity, self.outputs)?);
        Ok(())
    }

    /// Releases the slot array. Slot lookups fail until it is re-created.
    pub fn destroy(&mut self) {
        self.slots = None;
    }

    /// Changes the number of slots, keeping the first `min(old, new)`.
    ///
    /// Allocates the array if it was destroyed. On failure the bank is
    /// unchanged.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        let Some(slots) = self.slots.as_mut() else {
            self.slots = Some(allocate_slots(0..capacity, self.outputs)?);
            return Ok(());
        };
        if capacity <= slots.len() {
            slots.truncate(capacity);
            return Ok(());
        }
        let mut extra = allocate_slots(slots.len()..capacity, self.outputs)?;
        slots
            .try_reserve_exact(extra.len())
            .map_err(|_| DiffuseError::AllocationFailure)?;
        slots.append(&mut extra);
        Ok(())
    }

    /// Whether the slot array is allocated.
    pub fn is_allocated(&self) -> bool {
        self.slots.is_some()
    }

    /// Number of user-addressable slots (0 when destroyed).
    pub fn len(&self) -> usize {
        self.slots.as_ref().map_or(0, Vec::len)
    }

    /// Whether there are no user-addressable slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gain vector length.
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    fn slots(&self) -> Result<&[Snapshot]> {
        self.slots
            .as_deref()
            .ok_or(DiffuseError::NotFound(Lookup::Slots))
    }

    fn slots_mut(&mut self) -> Result<&mut [Snapshot]> {
        self.slots
            .as_deref_mut()
            .ok_or(DiffuseError::NotFound(Lookup::Slots))
    }

    /// Slot at `index`.
    pub fn get(&self, index: usize) -> Result<&Snapshot> {
        self.slots()?
            .get(index)
            .ok_or(DiffuseError::NotFound(Lookup::Slot(index)))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Result<&mut Snapshot> {
        self.slots_mut()?
            .get_mut(index)
            .ok_or(DiffuseError::NotFound(Lookup::Slot(index)))
    }

    /// Iterates over the user-addressable slots.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.slots.iter().flatten()
    }

    /// The reserved scratch snapshot.
    pub fn scratch(&self) -> &Snapshot {
        &self.scratch
    }

    /// Slots for reading plus scratch for writing.
    pub(crate) fn split_scratch(&mut self) -> Result<(&[Snapshot], &mut Snapshot)> {
        let slots = self
            .slots
            .as_deref()
            .ok_or(DiffuseError::NotFound(Lookup::Slots))?;
        Ok((slots, &mut self.scratch))
    }

    /// Rewrites a slot's gains and abscissae.
    pub fn set_gains(&mut self, index: usize, values: &[f64], curves: &CurveSet) -> Result<()> {
        self.get_mut(index)?.set_gains(values, curves)
    }

    /// Renames a slot.
    pub fn rename(&mut self, index: usize, name: &str) -> Result<()> {
        self.get_mut(index)?.set_name(name);
        Ok(())
    }

    /// Copies the content of `src` into `dst`.
    pub fn copy_between(&mut self, src: usize, dst: usize) -> Result<()> {
        let slots = self.slots_mut()?;
        let len = slots.len();
        if src >= len {
            return Err(DiffuseError::NotFound(Lookup::Slot(src)));
        }
        if dst >= len {
            return Err(DiffuseError::NotFound(Lookup::Slot(dst)));
        }
        if src == dst {
            return Ok(());
        }
        if src < dst {
            let (head, tail) = slots.split_at_mut(dst);
            tail[0].copy_from(&head[src]);
        } else {
            let (head, tail) = slots.split_at_mut(src);
            head[dst].copy_from(&tail[0]);
        }
        Ok(())
    }

    /// Recomputes every snapshot's abscissae, scratch included.
    pub fn recompute(&mut self, curves: &CurveSet) {
        if let Some(slots) = self.slots.as_mut() {
            for slot in slots {
                slot.recompute(curves);
            }
        }
        self.scratch.recompute(curves);
    }
}

fn allocate_slots(range: core::ops::Range<usize>, outputs: usize) -> Result<Vec<Snapshot>> {
    let mut slots = try_with_capacity(range.len())?;
    for index in range {
        slots.push(Snapshot::silent(outputs, Some(index))?);
    }
    Ok(slots)
}
