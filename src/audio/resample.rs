use super::grain::GrainTable;
use crate::mapper::TimeMap;

// pitch bends beyond four octaves are clamped so one grain stays bounded
const MIN_RATE: f64 = 1.0 / 16.0;
const MAX_RATE: f64 = 16.0;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Semitones to playback rate.
pub fn bend_to_rate(pitch_bend: f64) -> f64 {
    2f64.powf(pitch_bend / 12.0).clamp(MIN_RATE, MAX_RATE)
}

/// Plays one grain at a time, pitch-shifted by linear interpolation.
///
/// The fractional read offset left over at the end of a grain is carried into
/// the next one so the phase stays continuous across grain boundaries.
#[derive(Clone, Debug, Default)]
pub struct Resampler {
    bias: f64,
}

impl Resampler {
    pub fn reset(&mut self) {
        self.bias = 0.0;
    }

    /// Resamples the grain under `cursor` (seconds, warped) onto the end of `out`.
    ///
    /// Returns how much warped time the produced audio spans, or `None` once the
    /// cursor maps past the last grain.
    pub fn process(
        &mut self,
        map: &mut TimeMap,
        grains: &GrainTable,
        cursor: f64,
        out: &mut Vec<f32>,
    ) -> Option<f64> {
        let sample_rate = map.sample_rate().max(1) as f64;
        let rate = bend_to_rate(map.time_to_pitch_bend(cursor));
        let grain = grains.grain_at(map.time_to_sample(cursor))?;
        let len = grain.samples.len();

        // number of output samples whose read position lands inside the grain
        let mut produced = 0usize;
        while produced as f64 * rate + self.bias < len as f64 {
            produced += 1;
        }

        // the read position past the last sample blends into whatever plays next
        let next_first = grains
            .grain_at(map.time_to_sample(cursor + produced as f64 / sample_rate))
            .and_then(|g| g.samples.first().copied())
            .unwrap_or(0.0);

        out.reserve(produced);
        for i in 0..produced {
            let pos = i as f64 * rate + self.bias;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            let s0 = grain.samples[idx];
            let s1 = grain.samples.get(idx + 1).copied().unwrap_or(next_first);
            out.push(lerp(s0, s1, frac));
        }

        let overshoot = produced as f64 * rate + self.bias - len as f64;
        self.bias = overshoot.fract();

        Some(produced as f64 / sample_rate)
    }
}
