//! Ramp-initiating operations.
//!
//! Each operation validates every argument first, then computes target
//! vectors (directly from a slot or through the scratch snapshot) and
//! schedules one or more channels. A new ramp overwrites any ramp already in
//! flight on the same channel.

use libm::floor;

use crate::curve::CurveFamily;
use crate::engine::DiffuseEngine;
use crate::error::{DiffuseError, Lookup, Result};
use crate::math::ms_to_countdown;

impl DiffuseEngine {
    fn countdown_for(&self, duration_ms: f64) -> Result<u64> {
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(DiffuseError::InvalidArgument("ramp duration must be positive"));
        }
        Ok(ms_to_countdown(duration_ms, self.sample_rate))
    }

    fn check_channel(&self, channel: usize) -> Result<()> {
        self.channel(channel).map(|_| ())
    }

    /// Ramps `channel` to the gains of `slot` over `duration_ms`.
    pub fn ramp_to(
        &mut self,
        channel: usize,
        slot: usize,
        duration_ms: f64,
        family: CurveFamily,
    ) -> Result<()> {
        let countdown = self.countdown_for(duration_ms)?;
        self.check_channel(channel)?;
        let curve = self.curves.get(family);
        let snapshot = self.bank.get_mut(slot)?;
        snapshot.select(family);
        self.channels[channel].schedule(snapshot, family, curve, countdown, 0);

        #[cfg(feature = "tracing")]
        tracing::debug!(channel, slot, duration_ms, family = family.name(), "ramp_to");
        Ok(())
    }

    /// Ramps `channel` to an interpolation between two slots.
    ///
    /// Per output, `u = u_a + t·(u_b − u_a)` in the family's abscissa space;
    /// the result lands in scratch.
    pub fn ramp_between(
        &mut self,
        channel: usize,
        slot_a: usize,
        slot_b: usize,
        t: f64,
        duration_ms: f64,
        family: CurveFamily,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&t) {
            return Err(DiffuseError::InvalidArgument("interpolation factor must lie in [0, 1]"));
        }
        let countdown = self.countdown_for(duration_ms)?;
        self.check_channel(channel)?;
        self.bank.get(slot_a)?;
        self.bank.get(slot_b)?;

        self.bank.get_mut(slot_a)?.select(family);
        self.bank.get_mut(slot_b)?.select(family);
        let (slots, scratch) = self.bank.split_scratch()?;
        let ua = slots[slot_a].abscissa(family);
        let ub = slots[slot_b].abscissa(family);
        scratch.fill_abscissa(family, &self.curves, |i| ua[i] + t * (ub[i] - ua[i]));

        let curve = self.curves.get(family);
        self.channels[channel].schedule(scratch, family, curve, countdown, 0);

        #[cfg(feature = "tracing")]
        tracing::debug!(channel, slot_a, slot_b, t, duration_ms, "ramp_between");
        Ok(())
    }

    /// Ramps `channel` to the per-output maximum of weighted slots.
    ///
    /// Per output, `u = max(weight · u_slot)` over all pairs, then the
    /// family's forward curve gives the gain.
    pub fn ramp_max(
        &mut self,
        channel: usize,
        pairs: &[(usize, f64)],
        duration_ms: f64,
        family: CurveFamily,
    ) -> Result<()> {
        if pairs.is_empty() {
            return Err(DiffuseError::InvalidArgument("at least one state/weight pair is required"));
        }
        let countdown = self.countdown_for(duration_ms)?;
        self.check_channel(channel)?;
        for &(slot, weight) in pairs {
            self.bank.get(slot)?;
            if !(0.0..=1.0).contains(&weight) {
                return Err(DiffuseError::InvalidArgument("weights must lie in [0, 1]"));
            }
        }

        for &(slot, _) in pairs {
            self.bank.get_mut(slot)?.select(family);
        }
        let (slots, scratch) = self.bank.split_scratch()?;
        scratch.fill_abscissa(family, &self.curves, |i| {
            pairs
                .iter()
                .map(|&(slot, weight)| weight * slots[slot].abscissa(family)[i])
                .fold(0.0, f64::max)
        });

        let curve = self.curves.get(family);
        self.channels[channel].schedule(scratch, family, curve, countdown, 0);

        #[cfg(feature = "tracing")]
        tracing::debug!(channel, pairs = pairs.len(), duration_ms, "ramp_max");
        Ok(())
    }

    /// Rotates `slot` around the output ring onto `count` consecutive
    /// channels starting at `first`, using the crossfade curve.
    ///
    /// `rotation` splits into an integer output offset (Euclidean, so
    /// negative rotations wrap) and a fraction that blends each output
    /// with its neighbour at `output − 1`. Channel `first + rank` receives
    /// the result rotated by `offset + rank`.
    pub fn circular(
        &mut self,
        first: usize,
        count: usize,
        slot: usize,
        rotation: f64,
        duration_ms: f64,
    ) -> Result<()> {
        if count == 0 {
            return Err(DiffuseError::InvalidArgument("channel count must be at least 1"));
        }
        if !rotation.is_finite() {
            return Err(DiffuseError::InvalidArgument("rotation must be finite"));
        }
        let countdown = self.countdown_for(duration_ms)?;
        let end = first
            .checked_add(count)
            .ok_or(DiffuseError::InvalidArgument("channel range overflows"))?;
        if end > self.channels.len() {
            return Err(DiffuseError::NotFound(Lookup::Channel(end - 1)));
        }
        self.bank.get(slot)?;

        let outputs = self.out_gains.len();
        let whole = floor(rotation);
        let frac = rotation - whole;
        let offset = (whole as i64).rem_euclid(outputs as i64) as usize;

        let family = CurveFamily::Xfade;
        self.bank.get_mut(slot)?.select(family);
        let (slots, scratch) = self.bank.split_scratch()?;
        let u = slots[slot].abscissa(family);
        scratch.fill_abscissa(family, &self.curves, |i| {
            let prev = u[(i + outputs - 1) % outputs];
            u[i] + frac * (prev - u[i])
        });

        let curve = self.curves.get(family);
        for (rank, channel) in self.channels[first..end].iter_mut().enumerate() {
            channel.schedule(scratch, family, curve, countdown, (offset + rank) % outputs);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(first, count, slot, rotation, duration_ms, "circular");
        Ok(())
    }
}
