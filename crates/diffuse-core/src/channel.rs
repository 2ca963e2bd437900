//! Per-input channel state and its ramp state machine.
//!
//! ```text
//!            ramp_to / ramp_between / ramp_max / circular
//!   Fixed ───────────────────────────────────────────────▶ Ramping
//!     ▲                                                      │
//!     └────────────── countdown reaches 0 ───────────────────┘
//!                   (current := target, exactly)
//! ```
//!
//! `on` and `frozen` are orthogonal flags. A channel that is off is skipped
//! by the mixer and reports [`Mode::Off`]. A frozen channel keeps mixing at
//! its current amplitudes without consuming its countdown.

use alloc::vec::Vec;
use core::fmt;

use libm::floor;

use crate::curve::{Curve, CurveFamily, CurveSet};
use crate::error::{try_filled, Result};
use crate::event::{EventQueue, RampEnd};
use crate::math::{rescale_countdown, velocity_scaled};
use crate::snapshot::{check_gains, Snapshot};

/// Absorbs rounding in the accumulated velocity budget.
const BUDGET_EPSILON: f64 = 1e-9;

/// Reported channel mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Switched off: no contribution, no state change.
    Off,
    /// Static gains, no countdown activity.
    Fixed,
    /// Countdown active.
    Ramping,
}

impl Mode {
    /// Symbolic name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Fixed => "fixed",
            Self::Ramping => "ramping",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Global gains applied on top of each channel's own gain.
#[derive(Clone, Copy)]
pub(crate) struct MixGains<'a> {
    pub master: f64,
    pub outputs: &'a [f64],
}

/// Live amplitude state of one input channel.
///
/// When the channel is fixed, `current_* == target_*` for every output.
/// While ramping, the countdown is finite and positive between blocks.
#[derive(Debug, Clone)]
pub struct Channel {
    current_abscissa: Vec<f64>,
    current_gain: Vec<f64>,
    target_abscissa: Vec<f64>,
    target_gain: Vec<f64>,
    /// Samples left in the ramp, `None` when indefinite.
    countdown: Option<u64>,
    velocity: f64,
    /// Fractional countdown units owed from previous blocks.
    carry: f64,
    ramping: bool,
    on: bool,
    frozen: bool,
    muted: bool,
    family: CurveFamily,
    curve: Curve,
    gain: f64,
    origin: Option<usize>,
}

impl Channel {
    /// A silent, switched-off channel using the crossfade curve.
    pub(crate) fn new(outputs: usize, curves: &CurveSet) -> Result<Self> {
        Ok(Self {
            current_abscissa: try_filled(outputs, 0.0)?,
            current_gain: try_filled(outputs, 0.0)?,
            target_abscissa: try_filled(outputs, 0.0)?,
            target_gain: try_filled(outputs, 0.0)?,
            countdown: None,
            velocity: 1.0,
            carry: 0.0,
            ramping: false,
            on: false,
            frozen: false,
            muted: false,
            family: CurveFamily::Xfade,
            curve: curves.xfade,
            gain: 1.0,
            origin: None,
        })
    }

    /// Reported mode; [`Mode::Off`] whenever the channel is switched off.
    pub fn mode(&self) -> Mode {
        match (self.on, self.ramping) {
            (false, _) => Mode::Off,
            (true, false) => Mode::Fixed,
            (true, true) => Mode::Ramping,
        }
    }

    /// Whether the ramp state machine is in its ramping state, regardless of `on`.
    pub fn is_ramping(&self) -> bool {
        self.ramping
    }

    /// Current per-output amplitudes.
    pub fn current_gain(&self) -> &[f64] {
        &self.current_gain
    }

    /// Current per-output abscissae.
    pub fn current_abscissa(&self) -> &[f64] {
        &self.current_abscissa
    }

    /// Ramp target amplitudes.
    pub fn target_gain(&self) -> &[f64] {
        &self.target_gain
    }

    /// Ramp target abscissae.
    pub fn target_abscissa(&self) -> &[f64] {
        &self.target_abscissa
    }

    /// Remaining countdown in samples, `None` when indefinite.
    pub fn countdown(&self) -> Option<u64> {
        self.countdown
    }

    /// Countdown rate multiplier.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Whether the mixer processes this channel.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Whether ramp progress is suspended.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether completion notifications are suppressed.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Static input gain.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Curve family of the current (or last) ramp.
    pub fn family(&self) -> CurveFamily {
        self.family
    }

    /// Curve of the current (or last) ramp.
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Slot the current ramp came from, `None` for scratch.
    pub fn origin(&self) -> Option<usize> {
        self.origin
    }

    pub(crate) fn set_velocity(&mut self, velocity: f64) {
        self.velocity = velocity;
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub(crate) fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub(crate) fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }

    /// Starts a ramp towards `source`, rotated by `offset` outputs.
    ///
    /// Output `(i + offset) % M` receives the snapshot's value `i`. The ramp
    /// starts from the current amplitudes, re-expressed under the new curve.
    /// An in-flight ramp is abandoned.
    pub(crate) fn schedule(
        &mut self,
        source: &Snapshot,
        family: CurveFamily,
        curve: Curve,
        countdown: u64,
        offset: usize,
    ) {
        let outputs = self.target_gain.len();
        let abscissa = source.abscissa(family);
        for (i, (u, g)) in abscissa.iter().zip(source.gains()).enumerate() {
            let j = (i + offset) % outputs;
            self.target_abscissa[j] = *u;
            self.target_gain[j] = *g;
        }

        let resolved = curve.resolve();
        for (u, a) in self.current_abscissa.iter_mut().zip(&self.current_gain) {
            *u = resolved.inverse(*a);
        }

        self.family = family;
        self.curve = curve;
        self.countdown = Some(countdown.max(1));
        self.carry = 0.0;
        self.ramping = true;
        self.origin = source.index();
    }

    /// Overwrites the current amplitudes. In fixed mode the targets follow.
    pub(crate) fn set_gains(&mut self, values: &[f64]) -> Result<()> {
        check_gains(values, self.current_gain.len())?;
        let curve = self.curve.resolve();
        self.current_gain.copy_from_slice(values);
        for (u, a) in self.current_abscissa.iter_mut().zip(values) {
            *u = curve.inverse(*a);
        }
        if !self.ramping {
            self.target_gain.copy_from_slice(&self.current_gain);
            self.target_abscissa.copy_from_slice(&self.current_abscissa);
        }
        Ok(())
    }

    /// Follows a global curve change if this channel uses `family`.
    pub(crate) fn retune(&mut self, family: CurveFamily, curve: Curve) {
        if self.family != family {
            return;
        }
        self.curve = curve;
        let resolved = curve.resolve();
        for (u, a) in self.current_abscissa.iter_mut().zip(&self.current_gain) {
            *u = resolved.inverse(*a);
        }
        for (u, a) in self.target_abscissa.iter_mut().zip(&self.target_gain) {
            *u = resolved.inverse(*a);
        }
    }

    /// Keeps the remaining ramp duration across a sample-rate change.
    pub(crate) fn rescale(&mut self, from_rate: f64, to_rate: f64) {
        if let Some(remaining) = self.countdown.filter(|&n| n > 0) {
            self.countdown = Some(rescale_countdown(remaining, from_rate, to_rate));
        }
    }

    /// Commits the ramp target and notifies.
    fn complete(&mut self, index: usize, events: &mut EventQueue) {
        self.current_gain.copy_from_slice(&self.target_gain);
        self.current_abscissa.copy_from_slice(&self.target_abscissa);
        self.countdown = None;
        self.ramping = false;
        if !self.muted {
            events.push(RampEnd {
                channel: index,
                slot: self.origin,
            });
        }
    }

    /// Mixes this channel's input into `outputs` for one block.
    ///
    /// All slices must be at least `input.len()` long and `gains.outputs`
    /// must match `outputs` in length. Never allocates.
    pub(crate) fn process(
        &mut self,
        index: usize,
        input: &[f64],
        outputs: &mut [&mut [f64]],
        gains: MixGains<'_>,
        events: &mut EventQueue,
    ) {
        if !self.on {
            return;
        }

        let mut start = 0;
        let mut left = input.len();
        while left > 0 {
            // `Some(progress)` while the chunk advances a ramp
            let mut step = None;
            let chunk = if self.frozen {
                left
            } else {
                match self.countdown {
                    Some(0) => {
                        self.complete(index, events);
                        continue;
                    }
                    None => left,
                    Some(remaining) => {
                        let budget = left as f64 * self.velocity + self.carry;
                        let span = floor(budget + BUDGET_EPSILON) as u64;
                        if remaining > span {
                            // progress is measured in countdown units consumed
                            step = Some(span as f64 / remaining as f64);
                            self.countdown = Some(remaining - span);
                            self.carry = (budget - span as f64).max(0.0);
                            left
                        } else {
                            step = Some(1.0);
                            self.countdown = Some(0);
                            self.carry = 0.0;
                            (velocity_scaled(remaining, self.velocity) as usize).min(left)
                        }
                    }
                }
            };

            let dry = &input[start..start + chunk];
            match step {
                Some(progress) if self.ramping => {
                    self.mix_ramp(dry, outputs, start, progress, gains);
                }
                _ => self.mix_fixed(dry, outputs, start, gains),
            }

            start += chunk;
            left -= chunk;
        }

        if !self.frozen && self.countdown == Some(0) {
            self.complete(index, events);
        }
    }

    fn mix_fixed(&self, dry: &[f64], outputs: &mut [&mut [f64]], start: usize, gains: MixGains<'_>) {
        let end = start + dry.len();
        for ((out, &a), &out_gain) in outputs
            .iter_mut()
            .zip(&self.current_gain)
            .zip(gains.outputs)
        {
            let g = gains.master * self.gain * out_gain;
            if g == 0.0 || a == 0.0 {
                continue;
            }
            let k = a * g;
            for (y, x) in out[start..end].iter_mut().zip(dry) {
                *y += x * k;
            }
        }
    }

    /// Advances every output's abscissa by `progress` of its remaining
    /// distance, then mixes with a linear amplitude segment.
    ///
    /// Outputs without a buffer still advance so reports stay current.
    fn mix_ramp(
        &mut self,
        dry: &[f64],
        outputs: &mut [&mut [f64]],
        start: usize,
        progress: f64,
        gains: MixGains<'_>,
    ) {
        let chunk = dry.len();
        let end = start + chunk;
        let curve = self.curve.resolve();

        for o in 0..self.current_abscissa.len() {
            let u = self.current_abscissa[o];
            let u = u + progress * (self.target_abscissa[o] - u);
            self.current_abscissa[o] = u;

            let from = self.current_gain[o];
            let to = curve.forward(u);
            self.current_gain[o] = to;

            let (Some(out), Some(&out_gain)) = (outputs.get_mut(o), gains.outputs.get(o)) else {
                continue;
            };
            let g = gains.master * self.gain * out_gain;
            if g == 0.0 || chunk == 0 || (from == 0.0 && self.target_gain[o] == 0.0) {
                continue;
            }

            let da = (to - from) / chunk as f64;
            let mut a = from;
            for (y, x) in out[start..end].iter_mut().zip(dry) {
                *y += x * a * g;
                a += da;
            }
        }
    }
}
