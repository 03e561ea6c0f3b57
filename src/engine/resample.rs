//! Sample rate conversion
//!
//! Linear interpolation only. Used when exporting at the fixed output rate and
//! when mixing buffers decoded at different rates.

use crate::engine::buffer::AudioBuffer;

/// Resample a buffer to `target_rate`, returning it unchanged if the rate matches
pub fn resample(buffer: AudioBuffer, target_rate: u32) -> AudioBuffer {
    if buffer.sample_rate == target_rate || buffer.sample_rate == 0 || target_rate == 0 {
        return buffer;
    }

    let samples = resample_channels(&buffer.samples, buffer.sample_rate, target_rate);
    AudioBuffer {
        samples,
        sample_rate: target_rate,
    }
}

/// Resample audio channels to a different sample rate
pub fn resample_channels(
    channels: &[Vec<f32>],
    source_rate: u32,
    target_rate: u32,
) -> Vec<Vec<f32>> {
    let ratio = target_rate as f64 / source_rate as f64;

    channels
        .iter()
        .map(|channel| resample_linear(channel, ratio))
        .collect()
}

/// Linear interpolation resampling
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).round() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_linear_upsample() {
        let samples = vec![0.0, 1.0, 0.0];
        let resampled = resample_linear(&samples, 2.0);

        assert_eq!(resampled.len(), 6);
        // src pos 0.5 sits halfway between 0.0 and 1.0
        assert!((resampled[1] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_resample_linear_downsample() {
        let samples = vec![0.0, 0.5, 1.0, 0.5, 0.0, -0.5, -1.0, -0.5];
        let resampled = resample_linear(&samples, 0.5);
        assert_eq!(resampled.len(), 4);
    }

    #[test]
    fn test_resample_preserves_duration() {
        let buffer = AudioBuffer {
            samples: vec![vec![0.25; 22050]],
            sample_rate: 22050,
        };
        let resampled = resample(buffer, 44100);
        assert_eq!(resampled.sample_rate, 44100);
        assert_eq!(resampled.len(), 44100);
        assert!((resampled.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let buffer = AudioBuffer {
            samples: vec![vec![0.1, 0.2, 0.3]],
            sample_rate: 44100,
        };
        assert_eq!(resample(buffer.clone(), 44100), buffer);
    }
}
