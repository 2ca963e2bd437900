//! Multichannel WAV reading and writing.

use anyhow::Context;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32).
    pub bits_per_sample: u16,
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Magnitude of full scale for integer PCM of the given bit depth.
fn full_scale(bits_per_sample: u16) -> f64 {
    f64::from(1u32 << (bits_per_sample.clamp(1, 32) - 1))
}

/// Reads a WAV file into one buffer per channel.
pub fn read_wav(path: &Path) -> anyhow::Result<(Vec<Vec<f64>>, WavSpec)> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = WavSpec::from(reader.spec());
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f64> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let max_val = full_scale(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let mut buffers = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (buffer, &sample) in buffers.iter_mut().zip(frame) {
            buffer.push(sample);
        }
    }
    Ok((buffers, spec))
}

/// Writes one buffer per channel as an interleaved WAV file.
///
/// Shorter buffers are padded with silence.
pub fn write_wav(path: &Path, buffers: &[Vec<f64>], spec: WavSpec) -> anyhow::Result<()> {
    anyhow::ensure!(
        buffers.len() == usize::from(spec.channels),
        "expected {} channel buffers, found {}",
        spec.channels,
        buffers.len()
    );
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))
        .with_context(|| format!("failed to create {}", path.display()))?;
    let frames = buffers.iter().map(Vec::len).max().unwrap_or(0);
    let sample_at = |buffer: &Vec<f64>, i: usize| buffer.get(i).copied().unwrap_or(0.0);

    if spec.bits_per_sample == 32 {
        for i in 0..frames {
            for buffer in buffers {
                writer.write_sample(sample_at(buffer, i) as f32)?;
            }
        }
    } else {
        let max_val = full_scale(spec.bits_per_sample);
        for i in 0..frames {
            for buffer in buffers {
                let int_sample =
                    (sample_at(buffer, i) * max_val).clamp(-max_val, max_val - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}
