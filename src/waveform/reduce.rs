use tracing::debug;

use super::WaveformEnvelope;

/// Divisor mapping signed 16-bit samples into `[-1.0, 1.0]`.
pub const PCM_FULL_SCALE: f32 = 32768.0;

const BYTES_PER_SAMPLE: usize = 2;

/// Reduce raw s16le mono PCM to a unit-peak envelope of exactly `target_points` values.
///
/// Samples are split into `target_points` contiguous blocks of
/// `max(1, samples / target_points)` samples; each block keeps its peak absolute
/// value. Blocks past the end of short input stay zero, and a trailing odd byte
/// is ignored. The envelope is then scaled so its loudest block is `1.0`;
/// silent input stays all zeros. A zero target is treated as one point.
pub fn reduce(pcm: &[u8], target_points: usize) -> WaveformEnvelope {
    let target = target_points.max(1);
    let mut values = vec![0.0_f32; target];
    let sample_count = pcm.len() / BYTES_PER_SAMPLE;
    if sample_count == 0 {
        return WaveformEnvelope::from_values(values);
    }
    if sample_count < target {
        debug!(
            "PCM holds {sample_count} samples for {target} waveform points; tail stays silent"
        );
    }

    let block = (sample_count / target).max(1);
    let whole_samples = &pcm[..sample_count * BYTES_PER_SAMPLE];
    for (value, block_bytes) in values
        .iter_mut()
        .zip(whole_samples.chunks(block * BYTES_PER_SAMPLE))
    {
        *value = block_peak(block_bytes);
    }

    normalize_to_unit_peak(&mut values);
    WaveformEnvelope::from_values(values)
}

fn block_peak(bytes: &[u8]) -> f32 {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| (f32::from(i16::from_le_bytes([pair[0], pair[1]])) / PCM_FULL_SCALE).abs())
        .fold(0.0_f32, f32::max)
}

fn normalize_to_unit_peak(values: &mut [f32]) {
    let peak = values.iter().copied().fold(0.0_f32, f32::max);
    if peak <= 0.0 {
        return;
    }
    for value in values.iter_mut() {
        *value /= peak;
    }
}
