//! Output reporting for one observed channel.

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::{try_filled, DiffuseError, Result};
use crate::math::linear_to_db;

/// How the observed channel's amplitudes are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeterMode {
    /// No report.
    Off,
    /// `20·log10(a)`, floored at -200 dB.
    #[default]
    Decibels,
    /// Linear amplitude.
    Amplitude,
}

impl MeterMode {
    /// Symbolic name: `"off"`, `"db"` or `"ampl"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Decibels => "db",
            Self::Amplitude => "ampl",
        }
    }
}

impl fmt::Display for MeterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeterMode {
    type Err = DiffuseError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "db" => Ok(Self::Decibels),
            "ampl" => Ok(Self::Amplitude),
            _ => Err(DiffuseError::InvalidArgument("meter mode must be off, db or ampl")),
        }
    }
}

/// Per-output levels of the observed channel, refreshed after every block.
///
/// Purely observational: nothing here feeds back into mixing.
#[derive(Debug, Clone)]
pub struct Meter {
    mode: MeterMode,
    channel: usize,
    levels: Vec<f64>,
}

impl Meter {
    pub(crate) fn new(outputs: usize) -> Result<Self> {
        Ok(Self {
            mode: MeterMode::default(),
            channel: 0,
            levels: try_filled(outputs, 0.0)?,
        })
    }

    /// Report mode.
    pub fn mode(&self) -> MeterMode {
        self.mode
    }

    /// Observed input channel.
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Last reported levels, `None` when the meter is off.
    pub fn levels(&self) -> Option<&[f64]> {
        (self.mode != MeterMode::Off).then_some(self.levels.as_slice())
    }

    pub(crate) fn set_mode(&mut self, mode: MeterMode) {
        self.mode = mode;
    }

    pub(crate) fn observe(&mut self, channel: usize) {
        self.channel = channel;
    }

    pub(crate) fn update(&mut self, amplitudes: &[f64]) {
        match self.mode {
            MeterMode::Off => {}
            MeterMode::Amplitude => {
                for (level, a) in self.levels.iter_mut().zip(amplitudes) {
                    *level = *a;
                }
            }
            MeterMode::Decibels => {
                for (level, a) in self.levels.iter_mut().zip(amplitudes) {
                    *level = linear_to_db(*a);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_in_selected_unit() {
        let mut meter = Meter::new(2).unwrap();
        meter.update(&[1.0, 0.5]);
        let db = meter.levels().unwrap();
        assert!(db[0].abs() < 1e-12);
        assert!((db[1] + 6.0206).abs() < 1e-3);

        meter.set_mode(MeterMode::Amplitude);
        meter.update(&[0.25, 0.0]);
        assert_eq!(meter.levels().unwrap(), &[0.25, 0.0]);

        meter.set_mode(MeterMode::Off);
        assert!(meter.levels().is_none());
    }

    #[test]
    fn mode_names() {
        for mode in [MeterMode::Off, MeterMode::Decibels, MeterMode::Amplitude] {
            assert_eq!(mode.name().parse::<MeterMode>().unwrap(), mode);
        }
    }
}
