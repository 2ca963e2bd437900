//! Integration tests for diffuse-core.
//!
//! Drives the engine through whole scenarios: ramp scheduling and completion,
//! signal-level checks of the mixed output, scratch-based operations,
//! sample-rate changes and the persistence round trip.

use diffuse_core::{
    Command, Curve, CurveFamily, CurveSet, CurveShape, DiffuseEngine, DiffuseError,
    EngineSettings, Lookup, MemoryRepository, MeterMode, Mode, Protection, RampEnd, Reply,
    SnapshotRepository,
};

fn linear_engine(inputs: usize, outputs: usize, sample_rate: f64) -> DiffuseEngine {
    DiffuseEngine::new(EngineSettings {
        inputs,
        outputs,
        slots: 8,
        sample_rate,
        curves: CurveSet {
            ramp: Curve::LINEAR,
            xfade: Curve::LINEAR,
        },
    })
    .unwrap()
}

/// Processes `len` samples of constant input and returns the outputs.
fn render(engine: &mut DiffuseEngine, sample_rate: f64, value: f64, len: usize) -> Vec<Vec<f64>> {
    let inputs: Vec<Vec<f64>> = vec![vec![value; len]; engine.inputs()];
    let input_refs: Vec<&[f64]> = inputs.iter().map(Vec::as_slice).collect();
    let mut outputs = vec![vec![0.0; len]; engine.outputs()];
    let mut output_refs: Vec<&mut [f64]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
    engine.process(sample_rate, &input_refs, &mut output_refs);
    outputs
}

#[test]
fn ten_millisecond_ramp_at_one_kilohertz() {
    let mut e = linear_engine(1, 2, 1000.0);
    e.set_snapshot(0, &[0.0, 1.0]).unwrap();
    e.set_active(0, true).unwrap();
    e.ramp_to(0, 0, 10.0, CurveFamily::Ramp).unwrap();

    let out = render(&mut e, 1000.0, 1.0, 10);
    let ch = e.channel(0).unwrap();
    assert_eq!(ch.current_gain(), &[0.0, 1.0]);
    assert_eq!(ch.mode(), Mode::Fixed);
    assert_eq!(
        e.ramp_ends(),
        &[RampEnd {
            channel: 0,
            slot: Some(0)
        }]
    );

    // linear fade-in on output 1: 0.0, 0.1, ... 0.9
    assert_eq!(out[0], vec![0.0; 10]);
    for (n, y) in out[1].iter().enumerate() {
        assert!((y - n as f64 / 10.0).abs() < 1e-12, "sample {n}: {y}");
    }
}

#[test]
fn ramp_between_halfway_on_linear_curve() {
    let mut e = linear_engine(1, 2, 1000.0);
    e.set_snapshot(0, &[0.0, 0.0]).unwrap();
    e.set_snapshot(1, &[1.0, 1.0]).unwrap();
    e.ramp_between(0, 0, 1, 0.5, 20.0, CurveFamily::Ramp)
        .unwrap();
    assert_eq!(e.snapshots().scratch().gains(), &[0.5, 0.5]);
    assert_eq!(e.snapshots().scratch().index(), None);
}

#[test]
fn ramps_cross_many_small_blocks() {
    let mut e = DiffuseEngine::new(EngineSettings {
        inputs: 2,
        outputs: 4,
        slots: 4,
        sample_rate: 48000.0,
        curves: CurveSet::default(),
    })
    .unwrap();
    e.set_active_all(true);
    e.set_snapshot(2, &[0.1, 0.9, 0.4, 0.0]).unwrap();
    e.ramp_to(0, 2, 25.0, CurveFamily::Ramp).unwrap();
    e.ramp_to(1, 2, 5.0, CurveFamily::Xfade).unwrap();

    let mut finished = Vec::new();
    for _ in 0..(1200 / 32 + 1) {
        render(&mut e, 48000.0, 0.5, 32);
        finished.extend(e.ramp_ends().iter().map(|end| end.channel));
    }
    assert_eq!(finished, [1, 0]);
    for channel in e.channels() {
        assert_eq!(channel.current_gain(), &[0.1, 0.9, 0.4, 0.0]);
    }
}

#[test]
fn output_is_weighted_sum_of_channels() {
    let mut e = linear_engine(2, 2, 1000.0);
    e.set_active_all(true);
    e.set_channel_gains(0, &[1.0, 0.0]).unwrap();
    e.set_channel_gains(1, &[0.5, 0.5]).unwrap();

    let first = [0.2; 8];
    let second = [0.4; 8];
    let mut left = [0.0; 8];
    let mut right = [0.0; 8];
    e.process(1000.0, &[&first, &second], &mut [&mut left, &mut right]);
    assert!(left.iter().all(|&y| (y - 0.4).abs() < 1e-12));
    assert!(right.iter().all(|&y| (y - 0.2).abs() < 1e-12));
}

#[test]
fn exponential_ramp_is_monotonic_and_bounded() {
    let mut e = DiffuseEngine::new(EngineSettings {
        inputs: 1,
        outputs: 1,
        slots: 1,
        sample_rate: 1000.0,
        curves: CurveSet {
            ramp: Curve::new(CurveShape::Exp, 4.0),
            xfade: Curve::DEFAULT_XFADE,
        },
    })
    .unwrap();
    e.set_active(0, true).unwrap();
    e.set_snapshot(0, &[1.0]).unwrap();
    e.ramp_to(0, 0, 100.0, CurveFamily::Ramp).unwrap();

    let mut prev = 0.0;
    for _ in 0..25 {
        let out = render(&mut e, 1000.0, 1.0, 4);
        for &y in &out[0] {
            assert!(y >= prev - 1e-12 && y <= 1.0, "{y} after {prev}");
            prev = y;
        }
    }
    assert_eq!(e.channel(0).unwrap().current_gain(), &[1.0]);
}

#[test]
fn sample_rate_change_preserves_remaining_time() {
    let mut e = linear_engine(1, 1, 1000.0);
    e.set_snapshot(0, &[1.0]).unwrap();
    e.set_active(0, true).unwrap();
    e.ramp_to(0, 0, 20.0, CurveFamily::Ramp).unwrap();
    render(&mut e, 1000.0, 0.0, 10);
    assert_eq!(e.channel(0).unwrap().countdown(), Some(10));

    // 10 ms left: 20 samples at 2 kHz
    render(&mut e, 2000.0, 0.0, 1);
    assert_eq!(e.channel(0).unwrap().countdown(), Some(19));
    assert_eq!(e.sample_rate(), 2000.0);

    render(&mut e, 2000.0, 0.0, 19);
    assert_eq!(e.channel(0).unwrap().mode(), Mode::Fixed);
}

#[test]
fn circular_pans_a_point_source_around_the_ring() {
    let mut e = linear_engine(3, 4, 1000.0);
    e.set_snapshot(0, &[1.0, 0.0, 0.0, 0.0]).unwrap();
    e.set_active_all(true);
    e.circular(0, 3, 0, 1.5, 1.0).unwrap();
    render(&mut e, 1000.0, 0.0, 1);

    // rotation 1.5: half on the next output, half on the one after
    assert_eq!(e.channel(0).unwrap().current_gain(), &[0.0, 0.5, 0.5, 0.0]);
    assert_eq!(e.channel(1).unwrap().current_gain(), &[0.0, 0.0, 0.5, 0.5]);
    assert_eq!(e.channel(2).unwrap().current_gain(), &[0.5, 0.0, 0.0, 0.5]);
}

#[test]
fn meter_reports_observed_channel() {
    let mut e = linear_engine(2, 2, 1000.0);
    e.set_active_all(true);
    e.set_channel_gains(1, &[1.0, 0.1]).unwrap();
    e.observe(1).unwrap();
    render(&mut e, 1000.0, 0.0, 4);
    let db = e.meter().levels().unwrap();
    assert!(db[0].abs() < 1e-9);
    assert!((db[1] + 20.0).abs() < 1e-9);

    e.set_meter(MeterMode::Amplitude);
    render(&mut e, 1000.0, 0.0, 4);
    assert_eq!(e.meter().levels().unwrap(), &[1.0, 0.1]);
}

#[test]
fn failed_commands_do_not_mutate() {
    let mut e = linear_engine(2, 2, 1000.0);
    let mut repo = MemoryRepository::new();
    e.set_snapshot(0, &[0.3, 0.6]).unwrap();
    let before = e.clone();

    let attempts = vec![
        Command::RampTo {
            channel: 9,
            slot: 0,
            duration_ms: 5.0,
            family: CurveFamily::Ramp,
        },
        Command::RampTo {
            channel: 0,
            slot: 0,
            duration_ms: -5.0,
            family: CurveFamily::Ramp,
        },
        Command::Set {
            slot: 0,
            gains: vec![0.3],
        },
        Command::Set {
            slot: 0,
            gains: vec![0.3, 2.0],
        },
        Command::GainOut {
            output: 2,
            gain: 1.0,
        },
        Command::Circular {
            first: 1,
            count: 2,
            slot: 0,
            rotation: 0.0,
            duration_ms: 5.0,
        },
        Command::Load {
            name: "absent".into(),
            slot: 0,
        },
    ];
    for command in attempts {
        assert!(e.apply(command, &mut repo).is_err());
    }

    assert_eq!(e.info(), before.info());
    for ch in 0..2 {
        assert_eq!(e.channel_info(ch).unwrap(), before.channel_info(ch).unwrap());
    }
    assert_eq!(
        e.snapshot_info(0).unwrap(),
        before.snapshot_info(0).unwrap()
    );
    assert_eq!(e.snapshots().scratch(), before.snapshots().scratch());
}

#[test]
fn persistence_round_trip_through_commands() {
    let mut e = linear_engine(1, 3, 1000.0);
    let mut repo = MemoryRepository::new();

    e.set_channel_gains(0, &[0.2, 0.4, 0.8]).unwrap();
    e.apply(
        Command::Store {
            channel: 0,
            slot: 1,
            name: "snap".into(),
        },
        &mut repo,
    )
    .unwrap();
    e.apply(
        Command::Save {
            slot: 1,
            name: "snap".into(),
            protection: Protection::Protect,
        },
        &mut repo,
    )
    .unwrap();

    let err = e
        .apply(
            Command::Save {
                slot: 0,
                name: "snap".into(),
                protection: Protection::Default,
            },
            &mut repo,
        )
        .unwrap_err();
    assert_eq!(err, DiffuseError::WriteProtected("snap".into()));

    e.apply(
        Command::Rename {
            from: "snap".into(),
            to: "kept".into(),
            protection: Protection::Override,
        },
        &mut repo,
    )
    .unwrap();
    e.apply(
        Command::Load {
            name: "kept".into(),
            slot: 5,
        },
        &mut repo,
    )
    .unwrap();

    let Reply::Snapshot(info) = e.apply(Command::Get { slot: 5 }, &mut repo).unwrap() else {
        panic!("expected a snapshot reply");
    };
    assert_eq!(info.gains, [0.2, 0.4, 0.8]);
    assert_eq!(info.name, "kept");
    assert_eq!(repo.names().unwrap(), ["kept"]);
    assert!(matches!(
        repo.load("snap"),
        Err(DiffuseError::NotFound(Lookup::State(_)))
    ));
}
