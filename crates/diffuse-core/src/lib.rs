//! Diffuse Core - real-time N-input to M-output gain diffusion
//!
//! Every input channel is mixed onto every output through its own gain.
//! Gains move between named snapshots ("states") with sample-accurate ramps
//! shaped by a curve, and the engine mixes a whole block at a time without
//! allocating.
//!
//! # Core Abstractions
//!
//! ## Curves
//!
//! - [`Curve`] / [`CurveShape`] - Transfer function between abscissa and amplitude
//! - [`CurveFamily`] - Ramp or crossfade; each family has one global curve
//! - [`CurveSet`] - The two global curves
//!
//! ## States
//!
//! - [`Snapshot`] - Named gain vector with precomputed abscissae
//! - [`SnapshotBank`] - Fixed slot array plus a reserved scratch snapshot
//!
//! ## Mixing
//!
//! - [`DiffuseEngine`] - Owned context; [`DiffuseEngine::process`] mixes a block
//! - [`Channel`] / [`Mode`] - Per-input ramp state machine
//! - [`RampEnd`] - Completion notification
//! - [`Meter`] - Observed-channel level report
//!
//! ## Control
//!
//! - [`Command`] / [`Reply`] - Typed command surface for front ends
//! - [`SnapshotRepository`] - Persistence service seam, with [`MemoryRepository`]
//! - [`DiffuseError`] - Error taxonomy for control-path operations
//!
//! # Block Processing
//!
//! Each channel slices the block into chunks that end on ramp-completion
//! boundaries. Within a chunk the abscissa advances linearly and the
//! amplitude is interpolated linearly towards the curve's value at the end
//! of the chunk, so chunk size never affects where a ramp ends.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! diffuse-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use diffuse_core::{CurveFamily, DiffuseEngine, EngineSettings};
//!
//! let mut engine = DiffuseEngine::new(EngineSettings {
//!     inputs: 1,
//!     outputs: 2,
//!     ..EngineSettings::default()
//! })
//! .unwrap();
//!
//! engine.set_snapshot(0, &[0.0, 1.0]).unwrap();
//! engine.set_active(0, true).unwrap();
//! engine.ramp_to(0, 0, 10.0, CurveFamily::Ramp).unwrap();
//!
//! let input = [0.5_f64; 512];
//! let mut left = [0.0_f64; 512];
//! let mut right = [0.0_f64; 512];
//! engine.process(44100.0, &[&input], &mut [&mut left, &mut right]);
//!
//! assert_eq!(engine.channel(0).unwrap().current_gain(), &[0.0, 1.0]);
//! ```
//!
//! # Design Principles
//!
//! - **No allocations in the audio path**: every array is sized at construction
//! - **No errors in the audio path**: degenerate input is skipped, never reported
//! - **Exact completion**: a finished ramp assigns its target, no drift remains
//! - **No dependencies on std**: Pure `no_std` with `libm` for math

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod channel;
pub mod command;
pub mod control;
pub mod curve;
pub mod engine;
pub mod error;
pub mod event;
pub mod math;
pub mod meter;
pub mod persistence;
pub mod ramp;
pub mod report;
pub mod snapshot;
pub mod states;

pub use channel::{Channel, Mode};
pub use command::{Command, Reply};
pub use curve::{Curve, CurveFamily, CurveSet, CurveShape, ResolvedCurve};
pub use engine::{DiffuseEngine, EngineSettings};
pub use error::{DiffuseError, Lookup, Result};
pub use event::RampEnd;
pub use math::{db_to_linear, linear_to_db, ms_to_countdown, rescale_countdown};
pub use meter::{Meter, MeterMode};
pub use persistence::{MemoryRepository, Protection, SnapshotRecord, SnapshotRepository};
pub use report::{ChannelInfo, EngineInfo, SnapshotInfo};
pub use snapshot::{Snapshot, SnapshotBank};
