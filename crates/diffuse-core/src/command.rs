//! Typed command surface.
//!
//! A front end (console parser, cue file, OSC bridge) decodes its input into
//! a [`Command`] and hands it to [`DiffuseEngine::apply`] between blocks.
//! Arguments are typed but not range-checked here; the engine validates
//! them and rejects bad ones before mutating anything.

use alloc::string::String;
use alloc::vec::Vec;

use crate::curve::{CurveFamily, CurveShape};
use crate::engine::DiffuseEngine;
use crate::error::Result;
use crate::meter::MeterMode;
use crate::persistence::{Protection, SnapshotRepository};
use crate::report::{ChannelInfo, EngineInfo, SnapshotInfo};

/// One control-path operation.
///
/// Where a field is `Option<usize>` over channels or slots, `None` means
/// "all". Field meanings follow the engine method each variant calls.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Allocate `count` slots after [`Command::Free`].
    New { count: usize },
    /// Release the slot array.
    Free,
    /// Change the slot count, keeping existing slots.
    Resize { count: usize },
    /// Write gains into a slot.
    Set { slot: usize, gains: Vec<f64> },
    /// Rename a slot.
    Name { slot: usize, name: String },
    /// Report a slot.
    Get { slot: usize },
    /// Post a human-readable slot report.
    Post { slot: Option<usize> },
    /// Capture a channel's current gains into a slot.
    Store {
        channel: usize,
        slot: usize,
        name: String,
    },
    /// Persist a slot.
    Save {
        slot: usize,
        name: String,
        protection: Protection,
    },
    /// Load a persisted entry into a slot.
    Load { name: String, slot: usize },
    /// Remove a persisted entry.
    Delete { name: String, protection: Protection },
    /// Rename a persisted entry.
    Rename {
        from: String,
        to: String,
        protection: Protection,
    },
    /// Ramp a channel to a slot.
    RampTo {
        channel: usize,
        slot: usize,
        duration_ms: f64,
        family: CurveFamily,
    },
    /// Ramp a channel to an interpolation of two slots.
    RampBetween {
        channel: usize,
        from: usize,
        to: usize,
        t: f64,
        duration_ms: f64,
        family: CurveFamily,
    },
    /// Ramp a channel to the weighted maximum of several slots.
    RampMax {
        channel: usize,
        pairs: Vec<(usize, f64)>,
        duration_ms: f64,
        family: CurveFamily,
    },
    /// Rotate a slot onto consecutive channels.
    Circular {
        first: usize,
        count: usize,
        slot: usize,
        rotation: f64,
        duration_ms: f64,
    },
    /// Countdown rate multiplier.
    Velocity { channel: Option<usize>, value: f64 },
    /// Suspend or resume ramp progress.
    Freeze { channel: Option<usize>, frozen: bool },
    /// Switch channels on or off.
    Active { channel: Option<usize>, on: bool },
    /// Overwrite a channel's current gains.
    ChannelSet { channel: usize, gains: Vec<f64> },
    /// Report a channel.
    ChannelGet { channel: usize },
    /// Post a human-readable channel report.
    ChannelPost { channel: Option<usize> },
    /// Select the metered channel.
    Observe { channel: usize },
    /// Static input gain.
    GainIn { channel: usize, gain: f64 },
    /// Static output gain.
    GainOut { output: usize, gain: f64 },
    /// Master gain.
    Master { gain: f64 },
    /// Mute completion notifications.
    MuteRamp { channel: usize, muted: bool },
    /// Meter report mode.
    Meter { mode: MeterMode },
    /// Change a global curve.
    Curve {
        family: CurveFamily,
        shape: Option<CurveShape>,
        param: Option<f64>,
    },
    /// Report engine-wide settings.
    Info,
}

/// Result of a successful [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to report.
    Done,
    /// Slot contents.
    Snapshot(SnapshotInfo),
    /// Channel state.
    Channel(ChannelInfo),
    /// Engine settings.
    Engine(EngineInfo),
    /// Human-readable report.
    Report(String),
}

impl DiffuseEngine {
    /// Runs one command.
    ///
    /// Only persistence commands touch `repository`.
    pub fn apply(
        &mut self,
        command: Command,
        repository: &mut dyn SnapshotRepository,
    ) -> Result<Reply> {
        match command {
            Command::New { count } => self.new_snapshots(count)?,
            Command::Free => self.free_snapshots(),
            Command::Resize { count } => self.resize_snapshots(count)?,
            Command::Set { slot, gains } => self.set_snapshot(slot, &gains)?,
            Command::Name { slot, name } => self.name_snapshot(slot, &name)?,
            Command::Get { slot } => return self.snapshot_info(slot).map(Reply::Snapshot),
            Command::Post { slot } => return self.post_snapshots(slot).map(Reply::Report),
            Command::Store {
                channel,
                slot,
                name,
            } => self.store(channel, slot, &name)?,
            Command::Save {
                slot,
                name,
                protection,
            } => self.save(slot, &name, protection, repository)?,
            Command::Load { name, slot } => self.load(&name, slot, repository)?,
            Command::Delete { name, protection } => self.delete(&name, protection, repository)?,
            Command::Rename {
                from,
                to,
                protection,
            } => self.rename(&from, &to, protection, repository)?,
            Command::RampTo {
                channel,
                slot,
                duration_ms,
                family,
            } => self.ramp_to(channel, slot, duration_ms, family)?,
            Command::RampBetween {
                channel,
                from,
                to,
                t,
                duration_ms,
                family,
            } => self.ramp_between(channel, from, to, t, duration_ms, family)?,
            Command::RampMax {
                channel,
                pairs,
                duration_ms,
                family,
            } => self.ramp_max(channel, &pairs, duration_ms, family)?,
            Command::Circular {
                first,
                count,
                slot,
                rotation,
                duration_ms,
            } => self.circular(first, count, slot, rotation, duration_ms)?,
            Command::Velocity { channel, value } => match channel {
                Some(channel) => self.set_velocity(channel, value)?,
                None => self.set_velocity_all(value)?,
            },
            Command::Freeze { channel, frozen } => match channel {
                Some(channel) => self.freeze(channel, frozen)?,
                None => self.freeze_all(frozen),
            },
            Command::Active { channel, on } => match channel {
                Some(channel) => self.set_active(channel, on)?,
                None => self.set_active_all(on),
            },
            Command::ChannelSet { channel, gains } => self.set_channel_gains(channel, &gains)?,
            Command::ChannelGet { channel } => {
                return self.channel_info(channel).map(Reply::Channel);
            }
            Command::ChannelPost { channel } => {
                return self.post_channels(channel).map(Reply::Report);
            }
            Command::Observe { channel } => self.observe(channel)?,
            Command::GainIn { channel, gain } => self.set_input_gain(channel, gain)?,
            Command::GainOut { output, gain } => self.set_output_gain(output, gain)?,
            Command::Master { gain } => self.set_master(gain)?,
            Command::MuteRamp { channel, muted } => self.mute_ramp(channel, muted)?,
            Command::Meter { mode } => self.set_meter(mode),
            Command::Curve {
                family,
                shape,
                param,
            } => self.set_curve(family, shape, param)?,
            Command::Info => return Ok(Reply::Engine(self.info())),
        }
        Ok(Reply::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Mode;
    use crate::engine::EngineSettings;
    use crate::error::DiffuseError;
    use crate::persistence::MemoryRepository;
    use alloc::vec;

    fn engine() -> DiffuseEngine {
        DiffuseEngine::new(EngineSettings {
            inputs: 2,
            outputs: 2,
            slots: 4,
            sample_rate: 1000.0,
            ..EngineSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn dispatches_state_commands() {
        let mut e = engine();
        let mut repo = MemoryRepository::new();

        let reply = e
            .apply(
                Command::Set {
                    slot: 0,
                    gains: vec![1.0, 0.0],
                },
                &mut repo,
            )
            .unwrap();
        assert_eq!(reply, Reply::Done);

        e.apply(
            Command::Save {
                slot: 0,
                name: "left".into(),
                protection: Protection::Protect,
            },
            &mut repo,
        )
        .unwrap();
        e.apply(
            Command::Load {
                name: "left".into(),
                slot: 3,
            },
            &mut repo,
        )
        .unwrap();

        let Reply::Snapshot(info) = e.apply(Command::Get { slot: 3 }, &mut repo).unwrap() else {
            panic!("expected snapshot reply");
        };
        assert_eq!(info.name, "left");
        assert_eq!(info.gains, [1.0, 0.0]);

        let err = e
            .apply(
                Command::Delete {
                    name: "left".into(),
                    protection: Protection::Default,
                },
                &mut repo,
            )
            .unwrap_err();
        assert_eq!(err, DiffuseError::WriteProtected("left".into()));
    }

    #[test]
    fn dispatches_ramps_and_controls() {
        let mut e = engine();
        let mut repo = MemoryRepository::new();
        let commands = vec![
            Command::Set {
                slot: 1,
                gains: vec![0.0, 1.0],
            },
            Command::Active {
                channel: None,
                on: true,
            },
            Command::Velocity {
                channel: Some(1),
                value: 2.0,
            },
            Command::RampTo {
                channel: 1,
                slot: 1,
                duration_ms: 20.0,
                family: CurveFamily::Ramp,
            },
            Command::Freeze {
                channel: Some(0),
                frozen: true,
            },
            Command::Meter {
                mode: MeterMode::Amplitude,
            },
            Command::Observe { channel: 1 },
        ];
        for command in commands {
            e.apply(command, &mut repo).unwrap();
        }

        let Reply::Channel(info) = e
            .apply(Command::ChannelGet { channel: 1 }, &mut repo)
            .unwrap()
        else {
            panic!("expected channel reply");
        };
        assert_eq!(info.mode, Mode::Ramping);
        assert_eq!(info.velocity, 2.0);
        assert!(e.channel(0).unwrap().is_frozen());

        let input = [0.0; 10];
        let mut a = [0.0; 10];
        let mut b = [0.0; 10];
        e.process(1000.0, &[&input, &input], &mut [&mut a, &mut b]);
        assert_eq!(e.meter().levels().unwrap(), &[0.0, 1.0]);
        assert_eq!(e.channel(1).unwrap().mode(), Mode::Fixed);
    }

    #[test]
    fn reports_come_back_as_replies() {
        let mut e = engine();
        let mut repo = MemoryRepository::new();
        assert!(matches!(
            e.apply(Command::Info, &mut repo).unwrap(),
            Reply::Engine(EngineInfo { inputs: 2, .. })
        ));
        assert!(matches!(
            e.apply(Command::Post { slot: None }, &mut repo).unwrap(),
            Reply::Report(_)
        ));
        assert!(matches!(
            e.apply(Command::ChannelPost { channel: Some(0) }, &mut repo)
                .unwrap(),
            Reply::Report(_)
        ));
    }

    #[test]
    fn errors_propagate() {
        let mut e = engine();
        let mut repo = MemoryRepository::new();
        assert!(e.apply(Command::New { count: 3 }, &mut repo).is_err());
        assert!(
            e.apply(
                Command::Velocity {
                    channel: None,
                    value: 0.0
                },
                &mut repo
            )
            .is_err()
        );
        assert!(
            e.apply(
                Command::Curve {
                    family: CurveFamily::Ramp,
                    shape: Some(CurveShape::Sinus),
                    param: None
                },
                &mut repo
            )
            .is_err()
        );
    }
}
