use std::path::Path;

use thiserror::Error;

use crate::waveform::Waveform;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read audio file: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported sample format: {bits}-bit {format:?}")]
    Unsupported { format: hound::SampleFormat, bits: u16 },
    #[error("audio file has no channels")]
    NoChannels,
}

// Load a WAV from disk as mono PCM at `target_rate`
pub fn load(path: &Path, target_rate: u32) -> Result<Waveform, LoadError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(LoadError::NoChannels);
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float if spec.bits_per_sample == 32 => {
            reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?
        }
        hound::SampleFormat::Int if (1..=32).contains(&spec.bits_per_sample) => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<Result<Vec<_>, _>>()?
        }
        format => {
            return Err(LoadError::Unsupported {
                format,
                bits: spec.bits_per_sample,
            });
        }
    };

    // average every frame down to one channel
    let channels = spec.channels as usize;
    let mono: Vec<f32> = if channels == 1 {
        samples
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    log::info!(
        "loaded {} ({} frames, {} ch @ {} Hz)",
        path.display(),
        mono.len(),
        channels,
        spec.sample_rate
    );
    Ok(Waveform::new(mono, spec.sample_rate).resampled(target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stereo(path: &Path, rate: u32, frames: &[(i16, i16)]) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for &(l, r) in frames {
            writer.write_sample(l).expect("write");
            writer.write_sample(r).expect("write");
        }
        writer.finalize().expect("finalize");
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stereo.wav");
        write_stereo(&path, 44100, &[(16384, 0), (-16384, -16384), (0, 32767)]);

        let wave = load(&path, 44100).expect("load");
        assert_eq!(wave.sample_rate, 44100);
        assert_eq!(wave.len(), 3);
        assert!((wave.samples[0] - 0.25).abs() < 1e-4);
        assert!((wave.samples[1] + 0.5).abs() < 1e-4);
        assert!((wave.samples[2] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_resamples_to_target_rate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("half_rate.wav");
        write_stereo(&path, 22050, &[(0, 0); 100]);

        let wave = load(&path, 44100).expect("load");
        assert_eq!(wave.sample_rate, 44100);
        assert_eq!(wave.len(), 200);
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("/definitely/not/here.wav"), 44100);
        assert!(matches!(err, Err(LoadError::Wav(_))));
    }
}
