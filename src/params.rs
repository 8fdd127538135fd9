//! Tuning parameters with units and defaults.
//!
//! None of these are correctness requirements; they trade latency, memory
//! and smoothness against each other.

use std::time::Duration;

/// Grain segmentation and resynthesis tuning
#[derive(Debug, Clone)]
pub struct EngineParams {
    /// Preferred grain length (samples)
    /// ~34ms @ 44.1kHz
    pub grain_size: usize,

    /// Consecutive negative/non-negative samples required for a primary zero crossing
    pub look_around: usize,

    /// Same, for the fallback forward scan
    pub loose_look_around: usize,

    /// Linear fade applied to leftover audio when playback stops (samples)
    pub stop_fade: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            grain_size: 1500,
            look_around: 7,
            loose_look_around: 3,
            stop_fade: 100,
        }
    }
}

/// Spectrogram engine configuration
#[derive(Debug, Clone)]
pub struct SpectrumParams {
    /// FFT window size (samples, power of 2)
    pub fft_size: usize,

    /// Pre-roll attenuation per sample left of the range start
    /// exp(-0.00025 * 4096) ≈ 0.36
    pub preroll_decay: f32,

    /// Maximum cached ranges before LRU eviction
    pub cache_capacity: usize,

    /// Worker sleep when the job queue is empty
    pub poll_interval: Duration,
}

impl Default for SpectrumParams {
    fn default() -> Self {
        Self {
            fft_size: 8 * 4096,
            preroll_decay: 0.00025,
            cache_capacity: 4000,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl SpectrumParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!("FFT size must be power of 2, got {}", self.fft_size));
        }
        if self.cache_capacity == 0 {
            return Err("Spectrum cache capacity must be > 0".to_string());
        }
        Ok(())
    }
}

/// Editor view defaults
#[derive(Debug, Clone)]
pub struct ViewParams {
    /// Visible time span when a file is opened (seconds)
    pub range_time: f64,

    /// Lowest visible note (MIDI)
    pub start_note: f64,

    /// Visible note span (semitones)
    pub range_note: f64,

    /// Spectrogram brightness slider (0..100)
    pub brightness: f32,

    /// Beat grid tempo (BPM)
    pub tempo: f32,

    /// Texture cache capacity (columns)
    pub texture_capacity: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            range_time: 10.0,
            start_note: 24.0,
            range_note: 60.0,
            brightness: 50.0,
            tempo: 130.0,
            texture_capacity: 4000,
        }
    }
}

/// Every tunable, grouped by the component that reads it
#[derive(Debug, Clone, Default)]
pub struct Params {
    pub engine: EngineParams,
    pub spectrum: SpectrumParams,
    pub view: ViewParams,
}

/// Brightness slider value to spectrum magnitude scale
pub fn brightness_to_gain(brightness: f32) -> f32 {
    2.0_f32.powf(brightness / 10.0 + 9.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spectrum_params_valid() {
        assert!(SpectrumParams::default().validate().is_ok());

        let bad = SpectrumParams {
            fft_size: 1000,
            ..SpectrumParams::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_brightness_to_gain() {
        // 50 -> 2^14
        assert!((brightness_to_gain(50.0) - 16384.0).abs() < 0.01);
        assert!(brightness_to_gain(60.0) > brightness_to_gain(50.0));
    }
}
