//! Offline rendering through a cue list.

use super::common::{load_config, open_library, print_reply};
use crate::wav::{WavSpec, read_wav, write_wav};
use clap::Args;
use diffuse_config::{CueList, ScheduledCue};
use diffuse_core::{DiffuseEngine, SnapshotRepository};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV files; their channels become the engine inputs in order
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output WAV file, one channel per engine output
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Engine config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cue list (TOML)
    #[arg(long)]
    cues: Option<PathBuf>,

    /// State library, overriding the config
    #[arg(long)]
    library: Option<PathBuf>,

    /// Silence rendered after the inputs end, in ms
    #[arg(long, default_value = "0")]
    tail_ms: f64,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.block_size > 0, "block size must be positive");
    anyhow::ensure!(
        matches!(args.bit_depth, 16 | 24 | 32),
        "bit depth must be 16, 24 or 32"
    );

    let (inputs, sample_rate) = read_inputs(&args.inputs)?;
    let mut config = load_config(args.config.as_deref())?;
    if config.inputs != inputs.len() {
        tracing::info!(
            configured = config.inputs,
            found = inputs.len(),
            "input count follows the WAV channels"
        );
        config.inputs = inputs.len();
    }
    config.sample_rate = f64::from(sample_rate);

    let mut engine = config.build()?;
    let mut library = open_library(&config, args.library.as_ref())?;
    let cues = match &args.cues {
        Some(path) => CueList::load(path)?.schedule(config.sample_rate)?,
        None => Vec::new(),
    };

    let input_frames = inputs.iter().map(Vec::len).max().unwrap_or(0);
    let tail = (args.tail_ms.max(0.0) * config.sample_rate / 1000.0).round() as usize;
    let total = input_frames + tail;

    println!(
        "Rendering {} input(s) to {} output(s), {} frames at {} Hz, {} cue(s)...",
        engine.inputs(),
        engine.outputs(),
        total,
        sample_rate,
        cues.len()
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    let outputs = render(
        &mut engine,
        &mut library,
        &inputs,
        &cues,
        total,
        args.block_size,
        Some(&pb),
    );
    pb.finish_with_message("done");

    for (o, buffer) in outputs.iter().enumerate() {
        let peak = buffer.iter().map(|s| s.abs()).fold(0.0, f64::max);
        println!("  Output {o}: peak {:.1} dB", diffuse_core::linear_to_db(peak));
    }

    let spec = WavSpec {
        channels: u16::try_from(outputs.len())?,
        sample_rate,
        bits_per_sample: args.bit_depth,
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &outputs, spec)?;
    println!("Done!");
    Ok(())
}

/// Reads every input file and concatenates their channels.
fn read_inputs(paths: &[PathBuf]) -> anyhow::Result<(Vec<Vec<f64>>, u32)> {
    let mut channels = Vec::new();
    let mut rate = None;
    for path in paths {
        let (buffers, spec) = read_wav(path)?;
        println!(
            "Reading {}: {} channel(s), {} Hz",
            path.display(),
            spec.channels,
            spec.sample_rate
        );
        match rate {
            Some(rate) if rate != spec.sample_rate => anyhow::bail!(
                "{} is {} Hz, expected {} Hz",
                path.display(),
                spec.sample_rate,
                rate
            ),
            _ => rate = Some(spec.sample_rate),
        }
        channels.extend(buffers);
    }
    let rate = rate.ok_or_else(|| anyhow::anyhow!("no input files"))?;
    anyhow::ensure!(!channels.is_empty(), "inputs contain no channels");
    Ok((channels, rate))
}

/// Mixes `total` frames, applying each cue before the frame it names.
///
/// Blocks are split at cue frames so every command lands on its exact
/// sample. Inputs shorter than `total` are padded with silence. A command
/// the engine rejects is logged and skipped.
pub(crate) fn render(
    engine: &mut DiffuseEngine,
    repository: &mut dyn SnapshotRepository,
    inputs: &[Vec<f64>],
    cues: &[ScheduledCue],
    total: usize,
    block_size: usize,
    progress: Option<&ProgressBar>,
) -> Vec<Vec<f64>> {
    let sample_rate = engine.sample_rate();
    let mut outputs = vec![vec![0.0; total]; engine.outputs()];
    let mut block = vec![vec![0.0; block_size]; inputs.len()];
    let mut pending = cues.iter().peekable();
    let mut pos = 0;

    while pos < total {
        while let Some(cue) = pending.next_if(|cue| cue.at_sample <= pos as u64) {
            match engine.apply(cue.command.clone(), repository) {
                Ok(reply) => print_reply(&reply),
                Err(e) => tracing::warn!(frame = pos, error = %e, "cue failed"),
            }
        }

        let mut end = (pos + block_size).min(total);
        if let Some(next) = pending.peek() {
            end = end.min(next.at_sample as usize);
        }
        let len = end - pos;

        for (buffer, input) in block.iter_mut().zip(inputs) {
            for (i, sample) in buffer[..len].iter_mut().enumerate() {
                *sample = input.get(pos + i).copied().unwrap_or(0.0);
            }
        }
        let in_refs: Vec<&[f64]> = block.iter().map(|b| &b[..len]).collect();
        let mut out_refs: Vec<&mut [f64]> = outputs.iter_mut().map(|b| &mut b[pos..end]).collect();
        engine.process(sample_rate, &in_refs, &mut out_refs);

        for ramp_end in engine.ramp_ends() {
            tracing::debug!(
                channel = ramp_end.channel,
                slot = ?ramp_end.slot,
                frame = end,
                "ramp finished"
            );
        }

        pos = end;
        if let Some(pb) = progress {
            pb.set_position(pos as u64);
        }
    }

    let skipped = pending.count();
    if skipped > 0 {
        tracing::warn!(skipped, "cues after the end of the render were not applied");
    }
    outputs
}
