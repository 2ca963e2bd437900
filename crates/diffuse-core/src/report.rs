//! Structured "get" replies and human-readable "post" reports.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};

use crate::channel::Mode;
use crate::curve::{Curve, CurveFamily, CurveSet};
use crate::engine::DiffuseEngine;
use crate::error::Result;
use crate::meter::MeterMode;
use crate::snapshot::Snapshot;

/// Snapshot contents as reported by `get`.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    /// Slot index, `None` for scratch.
    pub index: Option<usize>,
    /// Slot name.
    pub name: String,
    /// Family of the abscissa last used.
    pub selector: CurveFamily,
    /// Per-output gains.
    pub gains: Vec<f64>,
}

impl From<&Snapshot> for SnapshotInfo {
    fn from(s: &Snapshot) -> Self {
        Self {
            index: s.index(),
            name: s.name().into(),
            selector: s.selector(),
            gains: s.gains().to_vec(),
        }
    }
}

/// Channel state as reported by `get`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    /// Input index.
    pub channel: usize,
    /// Reported mode.
    pub mode: Mode,
    /// Remaining countdown, `None` when indefinite.
    pub countdown: Option<u64>,
    /// Countdown rate multiplier.
    pub velocity: f64,
    /// Freeze flag.
    pub frozen: bool,
    /// Notification mute flag.
    pub muted: bool,
    /// Static input gain.
    pub gain: f64,
    /// Family of the current ramp.
    pub family: CurveFamily,
    /// Curve of the current ramp.
    pub curve: Curve,
    /// Slot the ramp came from.
    pub origin: Option<usize>,
    /// Current amplitudes.
    pub current: Vec<f64>,
    /// Target amplitudes.
    pub target: Vec<f64>,
}

/// Engine-wide settings as reported by `get`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInfo {
    /// Input count.
    pub inputs: usize,
    /// Output count.
    pub outputs: usize,
    /// Slot count (0 when freed).
    pub slots: usize,
    /// Current sample rate.
    pub sample_rate: f64,
    /// Master gain.
    pub master: f64,
    /// Per-output gains.
    pub output_gains: Vec<f64>,
    /// Global curves.
    pub curves: CurveSet,
    /// Meter mode.
    pub meter: MeterMode,
    /// Observed channel.
    pub observed: usize,
}

struct Gains<'a>(&'a [f64]);

impl fmt::Display for Gains<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, g) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{g:.3}")?;
        }
        Ok(())
    }
}

struct Index(Option<usize>);

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(i) => write!(f, "{i}"),
            None => f.write_str("none"),
        }
    }
}

impl fmt::Display for SnapshotInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State {}:  Name: {} - Count: {} - Gains: {}",
            Index(self.index),
            self.name,
            self.gains.len(),
            Gains(&self.gains)
        )
    }
}

impl fmt::Display for ChannelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel {}:  {}", self.channel, self.mode)?;
        match self.countdown {
            Some(n) => write!(f, " - Countdown: {n}")?,
            None => f.write_str(" - Countdown: indefinite")?,
        }
        write!(
            f,
            " - Velocity: {} - Gain: {} - Curve: {} ({}) - From: {}",
            self.velocity,
            self.gain,
            self.family,
            self.curve,
            Index(self.origin)
        )?;
        if self.frozen {
            f.write_str(" - frozen")?;
        }
        if self.muted {
            f.write_str(" - muted")?;
        }
        write!(f, "\n  Current: {}\n  Target: {}", Gains(&self.current), Gains(&self.target))
    }
}

impl fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Diffuse:  {} in - {} out - {} states - {} Hz\n  Master: {} - Outputs: {}\n  Ramp: {} - Xfade: {} - Meter: {} on channel {}",
            self.inputs,
            self.outputs,
            self.slots,
            self.sample_rate,
            self.master,
            Gains(&self.output_gains),
            self.curves.ramp,
            self.curves.xfade,
            self.meter,
            self.observed
        )
    }
}

impl DiffuseEngine {
    /// Engine-wide settings.
    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            inputs: self.inputs(),
            outputs: self.outputs(),
            slots: self.bank.len(),
            sample_rate: self.sample_rate,
            master: self.master,
            output_gains: self.out_gains.clone(),
            curves: self.curves,
            meter: self.meter.mode(),
            observed: self.meter.channel(),
        }
    }

    /// State of one channel.
    pub fn channel_info(&self, channel: usize) -> Result<ChannelInfo> {
        let ch = self.channel(channel)?;
        Ok(ChannelInfo {
            channel,
            mode: ch.mode(),
            countdown: ch.countdown(),
            velocity: ch.velocity(),
            frozen: ch.is_frozen(),
            muted: ch.is_muted(),
            gain: ch.gain(),
            family: ch.family(),
            curve: ch.curve(),
            origin: ch.origin(),
            current: ch.current_gain().to_vec(),
            target: ch.target_gain().to_vec(),
        })
    }

    /// Contents of one slot.
    pub fn snapshot_info(&self, slot: usize) -> Result<SnapshotInfo> {
        self.bank.get(slot).map(SnapshotInfo::from)
    }

    /// Human-readable report of one slot, or of every slot when `None`.
    pub fn post_snapshots(&self, slot: Option<usize>) -> Result<String> {
        let mut out = String::new();
        match slot {
            Some(slot) => {
                let _ = write!(out, "{}", self.snapshot_info(slot)?);
            }
            None => {
                let _ = write!(out, "States: {}", self.bank.len());
                for snapshot in self.bank.iter() {
                    let _ = write!(out, "\n  {}", SnapshotInfo::from(snapshot));
                }
            }
        }
        log_post(&out);
        Ok(out)
    }

    /// Human-readable report of one channel, or of every channel when `None`.
    pub fn post_channels(&self, channel: Option<usize>) -> Result<String> {
        let mut out = String::new();
        match channel {
            Some(channel) => {
                let _ = write!(out, "{}", self.channel_info(channel)?);
            }
            None => {
                let _ = write!(out, "{}", self.info());
                for channel in 0..self.inputs() {
                    let _ = write!(out, "\n{}", self.channel_info(channel)?);
                }
            }
        }
        log_post(&out);
        Ok(out)
    }
}

#[cfg(feature = "tracing")]
fn log_post(report: &str) {
    tracing::info!("{report}");
}

#[cfg(not(feature = "tracing"))]
fn log_post(_report: &str) {}
