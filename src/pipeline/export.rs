use std::path::Path;

use anyhow::Context;

pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

// Write mono 16-bit PCM
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for s in to_pcm16(samples) {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    log::info!("exported {} samples to {}", samples.len(), path.display());
    Ok(())
}
