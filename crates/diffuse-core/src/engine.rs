//! The diffusion engine: owned context plus the per-block mixing entry point.
//!
//! [`DiffuseEngine`] owns every array the audio path touches. All of them
//! are allocated in [`DiffuseEngine::new`] and none grow afterwards, so
//! [`process`](DiffuseEngine::process) never allocates.
//!
//! Command-surface operations live in sibling modules as further `impl`
//! blocks: ramps in [`ramp`](crate::ramp), channel and global controls in
//! [`control`](crate::control), slot and persistence operations in
//! [`states`](crate::states).
//!
//! # Threading
//!
//! Both `process` and every command take `&mut self`. Commands therefore
//! happen strictly between blocks; a host that drives the engine from
//! several threads wraps it in its own synchronization.

use alloc::vec::Vec;

use crate::channel::{Channel, MixGains};
use crate::curve::CurveSet;
use crate::error::{try_filled, try_with_capacity, DiffuseError, Lookup, Result};
use crate::event::{EventQueue, RampEnd};
use crate::meter::Meter;
use crate::snapshot::SnapshotBank;

/// Construction parameters for [`DiffuseEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Number of input channels (N).
    pub inputs: usize,
    /// Number of output channels (M).
    pub outputs: usize,
    /// Number of user-addressable snapshot slots.
    pub slots: usize,
    /// Initial sample rate in Hz.
    pub sample_rate: f64,
    /// Initial global curves.
    pub curves: CurveSet,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            inputs: 2,
            outputs: 2,
            slots: 10,
            sample_rate: 44100.0,
            curves: CurveSet::default(),
        }
    }
}

/// N-input, M-output gain diffusion engine.
#[derive(Debug, Clone)]
pub struct DiffuseEngine {
    pub(crate) sample_rate: f64,
    pub(crate) channels: Vec<Channel>,
    pub(crate) bank: SnapshotBank,
    pub(crate) curves: CurveSet,
    pub(crate) master: f64,
    pub(crate) out_gains: Vec<f64>,
    pub(crate) meter: Meter,
    pub(crate) events: EventQueue,
}

impl DiffuseEngine {
    /// Allocates an engine.
    ///
    /// Either every array is allocated or an error is returned and nothing
    /// is kept.
    pub fn new(settings: EngineSettings) -> Result<Self> {
        if settings.inputs == 0 {
            return Err(DiffuseError::InvalidArgument("at least one input is required"));
        }
        if settings.outputs == 0 {
            return Err(DiffuseError::InvalidArgument("at least one output is required"));
        }
        if !(settings.sample_rate.is_finite() && settings.sample_rate > 0.0) {
            return Err(DiffuseError::InvalidArgument("sample rate must be positive"));
        }

        let mut channels = try_with_capacity(settings.inputs)?;
        for _ in 0..settings.inputs {
            channels.push(Channel::new(settings.outputs, &settings.curves)?);
        }
        let mut bank = SnapshotBank::new(settings.slots, settings.outputs)?;
        bank.recompute(&settings.curves);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            inputs = settings.inputs,
            outputs = settings.outputs,
            slots = settings.slots,
            "diffuse engine allocated"
        );

        Ok(Self {
            sample_rate: settings.sample_rate,
            channels,
            bank,
            curves: settings.curves,
            master: 1.0,
            out_gains: try_filled(settings.outputs, 1.0)?,
            meter: Meter::new(settings.outputs)?,
            events: EventQueue::with_capacity(settings.inputs)?,
        })
    }

    /// Number of input channels.
    pub fn inputs(&self) -> usize {
        self.channels.len()
    }

    /// Number of output channels.
    pub fn outputs(&self) -> usize {
        self.out_gains.len()
    }

    /// Sample rate used to convert ramp durations.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Channel at `index`.
    pub fn channel(&self, index: usize) -> Result<&Channel> {
        self.channels
            .get(index)
            .ok_or(DiffuseError::NotFound(Lookup::Channel(index)))
    }

    pub(crate) fn channel_mut(&mut self, index: usize) -> Result<&mut Channel> {
        self.channels
            .get_mut(index)
            .ok_or(DiffuseError::NotFound(Lookup::Channel(index)))
    }

    /// All channels, indexed by input.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Snapshot slots and scratch.
    pub fn snapshots(&self) -> &SnapshotBank {
        &self.bank
    }

    /// Global curves.
    pub fn curves(&self) -> &CurveSet {
        &self.curves
    }

    /// Master gain.
    pub fn master(&self) -> f64 {
        self.master
    }

    /// Static per-output gains.
    pub fn output_gains(&self) -> &[f64] {
        &self.out_gains
    }

    /// Observed-channel report.
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Ramps that completed during the last block.
    pub fn ramp_ends(&self) -> &[RampEnd] {
        self.events.as_slice()
    }

    /// Mixes one block.
    ///
    /// Outputs are zeroed, then every switched-on channel accumulates into
    /// them. Only the overlap of the supplied buffers is processed: the
    /// first `min(N, inputs.len())` channels, the first
    /// `min(M, outputs.len())` outputs and the shortest buffer length.
    /// Ramps advance on every output whether or not its buffer is supplied.
    ///
    /// A `sample_rate` that differs from the previous block rescales every
    /// in-flight countdown so its remaining duration is preserved. Invalid
    /// rates are ignored.
    ///
    /// Never fails and never allocates.
    pub fn process(&mut self, sample_rate: f64, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        for out in outputs.iter_mut() {
            out.fill(0.0);
        }
        self.events.clear();

        if sample_rate != self.sample_rate && sample_rate.is_finite() && sample_rate > 0.0 {
            for channel in &mut self.channels {
                channel.rescale(self.sample_rate, sample_rate);
            }
            self.sample_rate = sample_rate;
        }

        let out_count = outputs.len().min(self.out_gains.len());
        let outputs = &mut outputs[..out_count];
        let len = inputs
            .iter()
            .map(|b| b.len())
            .chain(outputs.iter().map(|b| b.len()))
            .min()
            .unwrap_or(0);

        let gains = MixGains {
            master: self.master,
            outputs: &self.out_gains[..out_count],
        };
        for (index, (channel, input)) in self.channels.iter_mut().zip(inputs).enumerate() {
            channel.process(index, &input[..len], outputs, gains, &mut self.events);
        }

        if let Some(observed) = self.channels.get(self.meter.channel()) {
            self.meter.update(observed.current_gain());
        }
    }
}
