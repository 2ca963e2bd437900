//! Channel and global controls: velocity, freeze, gains, on/off, curves, meter.

use crate::curve::{CurveFamily, CurveShape};
use crate::engine::DiffuseEngine;
use crate::error::{DiffuseError, Lookup, Result};
use crate::meter::MeterMode;

fn check_velocity(velocity: f64) -> Result<()> {
    if velocity.is_finite() && velocity > 0.0 {
        Ok(())
    } else {
        Err(DiffuseError::InvalidArgument("velocity must be positive"))
    }
}

fn check_gain(gain: f64) -> Result<()> {
    if gain.is_finite() && gain >= 0.0 {
        Ok(())
    } else {
        Err(DiffuseError::InvalidArgument("gain must be non-negative"))
    }
}

impl DiffuseEngine {
    /// Sets the countdown rate multiplier of one channel.
    pub fn set_velocity(&mut self, channel: usize, velocity: f64) -> Result<()> {
        check_velocity(velocity)?;
        self.channel_mut(channel)?.set_velocity(velocity);
        Ok(())
    }

    /// Sets the countdown rate multiplier of every channel.
    pub fn set_velocity_all(&mut self, velocity: f64) -> Result<()> {
        check_velocity(velocity)?;
        for channel in &mut self.channels {
            channel.set_velocity(velocity);
        }
        Ok(())
    }

    /// Freezes or resumes ramp progress on one channel.
    pub fn freeze(&mut self, channel: usize, frozen: bool) -> Result<()> {
        self.channel_mut(channel)?.set_frozen(frozen);
        Ok(())
    }

    /// Freezes or resumes ramp progress on every channel.
    pub fn freeze_all(&mut self, frozen: bool) {
        for channel in &mut self.channels {
            channel.set_frozen(frozen);
        }
    }

    /// Switches one channel on or off.
    pub fn set_active(&mut self, channel: usize, on: bool) -> Result<()> {
        self.channel_mut(channel)?.set_on(on);
        Ok(())
    }

    /// Switches every channel on or off.
    pub fn set_active_all(&mut self, on: bool) {
        for channel in &mut self.channels {
            channel.set_on(on);
        }
    }

    /// Static gain applied to one input.
    pub fn set_input_gain(&mut self, channel: usize, gain: f64) -> Result<()> {
        check_gain(gain)?;
        self.channel_mut(channel)?.set_gain(gain);
        Ok(())
    }

    /// Static gain applied to one output.
    pub fn set_output_gain(&mut self, output: usize, gain: f64) -> Result<()> {
        check_gain(gain)?;
        let slot = self
            .out_gains
            .get_mut(output)
            .ok_or(DiffuseError::NotFound(Lookup::Output(output)))?;
        *slot = gain;
        Ok(())
    }

    /// Global gain applied to every channel and output.
    pub fn set_master(&mut self, gain: f64) -> Result<()> {
        check_gain(gain)?;
        self.master = gain;
        Ok(())
    }

    /// Suppresses (or restores) completion notifications for one channel.
    pub fn mute_ramp(&mut self, channel: usize, muted: bool) -> Result<()> {
        self.channel_mut(channel)?.set_muted(muted);
        Ok(())
    }

    /// Overwrites a channel's current amplitudes.
    ///
    /// A ramp in flight continues from the new values.
    pub fn set_channel_gains(&mut self, channel: usize, gains: &[f64]) -> Result<()> {
        self.channel_mut(channel)?.set_gains(gains)
    }

    /// Selects the channel reported by the meter.
    pub fn observe(&mut self, channel: usize) -> Result<()> {
        self.channel(channel)?;
        self.meter.observe(channel);
        Ok(())
    }

    /// Selects how the observed channel is reported.
    pub fn set_meter(&mut self, mode: MeterMode) {
        self.meter.set_mode(mode);
    }

    /// Replaces the shape and/or parameter of a global curve.
    ///
    /// Every snapshot's abscissae are recomputed, and channels currently
    /// using `family` switch to the new curve with their abscissae
    /// re-derived from their amplitudes.
    pub fn set_curve(
        &mut self,
        family: CurveFamily,
        shape: Option<CurveShape>,
        param: Option<f64>,
    ) -> Result<()> {
        if shape.is_some_and(|s| !s.belongs_to(family)) {
            return Err(DiffuseError::InvalidArgument("shape does not belong to this curve family"));
        }
        if param.is_some_and(|p| !p.is_finite()) {
            return Err(DiffuseError::InvalidArgument("curve parameter must be finite"));
        }

        let curve = self.curves.get_mut(family);
        if let Some(shape) = shape {
            curve.shape = shape;
        }
        if let Some(param) = param {
            curve.param = param;
        }
        let curve = *curve;

        self.bank.recompute(&self.curves);
        for channel in &mut self.channels {
            channel.retune(family, curve);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(family = family.name(), curve = %curve, "curve changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use crate::engine::EngineSettings;

    fn engine() -> DiffuseEngine {
        DiffuseEngine::new(EngineSettings {
            inputs: 2,
            outputs: 2,
            slots: 2,
            sample_rate: 1000.0,
            ..EngineSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn velocity_validation() {
        let mut e = engine();
        e.set_velocity(1, 2.0).unwrap();
        assert_eq!(e.channel(1).unwrap().velocity(), 2.0);
        assert!(e.set_velocity(0, 0.0).is_err());
        assert!(e.set_velocity(0, -1.0).is_err());
        assert!(e.set_velocity_all(f64::INFINITY).is_err());
        assert_eq!(e.channel(0).unwrap().velocity(), 1.0);

        e.set_velocity_all(0.5).unwrap();
        assert!(e.channels().iter().all(|c| c.velocity() == 0.5));
    }

    #[test]
    fn flags_apply_per_channel_and_globally() {
        let mut e = engine();
        e.freeze(0, true).unwrap();
        assert!(e.channel(0).unwrap().is_frozen());
        assert!(!e.channel(1).unwrap().is_frozen());
        e.freeze_all(false);
        assert!(!e.channel(0).unwrap().is_frozen());

        e.set_active_all(true);
        e.set_active(1, false).unwrap();
        assert!(e.channel(0).unwrap().is_on());
        assert!(!e.channel(1).unwrap().is_on());

        e.mute_ramp(0, true).unwrap();
        assert!(e.channel(0).unwrap().is_muted());

        assert!(e.freeze(2, true).is_err());
    }

    #[test]
    fn gains_are_validated() {
        let mut e = engine();
        e.set_input_gain(0, 0.5).unwrap();
        e.set_output_gain(1, 0.25).unwrap();
        e.set_master(2.0).unwrap();
        assert_eq!(e.channel(0).unwrap().gain(), 0.5);
        assert_eq!(e.output_gains(), &[1.0, 0.25]);
        assert_eq!(e.master(), 2.0);

        assert!(e.set_input_gain(0, -0.1).is_err());
        assert_eq!(
            e.set_output_gain(2, 1.0),
            Err(DiffuseError::NotFound(Lookup::Output(2)))
        );
        assert!(e.set_master(f64::NAN).is_err());
    }

    #[test]
    fn gain_chain_scales_output() {
        let mut e = engine();
        e.set_active(0, true).unwrap();
        e.set_channel_gains(0, &[1.0, 0.5]).unwrap();
        e.set_input_gain(0, 0.5).unwrap();
        e.set_output_gain(1, 0.5).unwrap();
        e.set_master(2.0).unwrap();

        let input = [1.0; 4];
        let mut a = [0.0; 4];
        let mut b = [0.0; 4];
        e.process(1000.0, &[&input], &mut [&mut a, &mut b]);
        assert!(a.iter().all(|&y| (y - 1.0).abs() < 1e-12));
        assert!(b.iter().all(|&y| (y - 0.25).abs() < 1e-12));
    }

    #[test]
    fn set_curve_recomputes_snapshots_and_channels() {
        let mut e = engine();
        e.set_snapshot(0, &[0.25, 1.0]).unwrap();
        e.set_curve(CurveFamily::Ramp, Some(CurveShape::Poly), Some(2.0))
            .unwrap();
        assert_eq!(e.curves().ramp, Curve::new(CurveShape::Poly, 2.0));
        let u = e.snapshots().get(0).unwrap().abscissa(CurveFamily::Ramp);
        assert!((u[0] - 0.5).abs() < 1e-12);

        e.ramp_to(0, 0, 10.0, CurveFamily::Ramp).unwrap();
        e.set_curve(CurveFamily::Ramp, None, Some(4.0)).unwrap();
        let ch = e.channel(0).unwrap();
        assert_eq!(ch.curve(), Curve::new(CurveShape::Poly, 4.0));
        assert!((ch.target_abscissa()[0] - 0.25_f64.powf(0.25)).abs() < 1e-12);
    }

    #[test]
    fn set_curve_rejects_foreign_shape() {
        let mut e = engine();
        let before = *e.curves();
        assert!(
            e.set_curve(CurveFamily::Xfade, Some(CurveShape::Exp), None)
                .is_err()
        );
        assert!(
            e.set_curve(CurveFamily::Ramp, None, Some(f64::NAN))
                .is_err()
        );
        assert_eq!(*e.curves(), before);
    }

    #[test]
    fn observe_checks_channel() {
        let mut e = engine();
        e.observe(1).unwrap();
        assert_eq!(e.meter().channel(), 1);
        assert!(e.observe(2).is_err());
        e.set_meter(MeterMode::Off);
        assert!(e.meter().levels().is_none());
    }
}
