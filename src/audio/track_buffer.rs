use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use super::frame::StereoFrame;

/// A fully decoded instrument track at the engine's sample rate. Cloning is
/// cheap; the frames are shared.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackBuffer {
    pub data: Arc<[StereoFrame]>,
}

impl TrackBuffer {
    pub fn from_frames(frames: Vec<StereoFrame>) -> Self {
        Self { data: frames.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Load a WAV file from disk and bring it to the output rate
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        let spec = reader.spec();
        let file_channels = spec.channels as usize;
        if file_channels == 0 {
            anyhow::bail!("{} has no channels", path.display());
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        // mono is duplicated, anything past two channels is dropped
        let mut frames: Vec<StereoFrame> = if file_channels == 1 {
            samples.into_iter().map(StereoFrame::mono).collect()
        } else {
            samples
                .chunks_exact(file_channels)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect()
        };

        if spec.sample_rate != target_rate {
            frames = resample_linear(&frames, spec.sample_rate, target_rate);
        }

        Ok(Self::from_frames(frames))
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || source_rate == 0 {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;
        if idx >= frames.len().saturating_sub(1) {
            out.push(frames.last().copied().unwrap_or_default());
        } else {
            out.push(StereoFrame::lerp(frames[idx], frames[idx + 1], frac));
        }
    }
    out
}
