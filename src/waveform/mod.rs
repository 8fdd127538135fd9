pub mod pyramid;

use std::sync::Arc;

pub use pyramid::WaveformPyramid;

/// Mono PCM at a fixed sample rate, shared read-only between threads.
#[derive(Clone, Debug)]
pub struct Waveform {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Converts to `target_rate`, sharing the buffer when the rate already matches.
    pub fn resampled(&self, target_rate: u32) -> Self {
        if self.sample_rate == target_rate {
            return self.clone();
        }
        Self::new(resample_linear(&self.samples, self.sample_rate, target_rate), target_rate)
    }
}

pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || source_rate == 0 {
        return samples.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (samples.len() as f64 * ratio).ceil() as usize;
    let last = samples.last().copied().unwrap_or(0.0);

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            let frac = (src_pos - idx as f64) as f32;
            if idx + 1 >= samples.len() {
                last
            } else {
                samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
            }
        })
        .collect()
}
