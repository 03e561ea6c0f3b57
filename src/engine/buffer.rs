//! Audio Buffer Management
//!
//! Provides the owned audio buffer type every pipeline stage consumes and
//! produces. Buffers have value semantics: a stage takes a buffer by value and
//! hands a new one to the next stage, so no two stages ever alias samples.

use crate::error::{ClipError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Sample rate used for decoded audio and for every exported file (44.1kHz)
pub const OUTPUT_SAMPLE_RATE: u32 = 44100;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// # Returns
/// Value in decibels. Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Maximum absolute sample value across all channels
///
/// Returns 0.0 for empty buffers. NaN samples are ignored.
pub fn calculate_peak(samples: &[Vec<f32>]) -> f32 {
    samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Decoded PCM audio held in memory
///
/// Stores audio as non-interleaved 32-bit floating point samples, one
/// `Vec<f32>` per channel, all channels the same length.
///
/// # Example
/// ```
/// use clipforge::engine::buffer::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(44100, ChannelLayout::Stereo, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer with the given number of samples per channel
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// `InvalidAudio` if there are no channels, the channels differ in length,
    /// or the sample rate is zero.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(ClipError::InvalidAudio {
                reason: "Buffer must have at least one channel".to_string(),
                source: None,
            });
        }
        if sample_rate == 0 {
            return Err(ClipError::InvalidAudio {
                reason: "Sample rate must be non-zero".to_string(),
                source: None,
            });
        }
        let len = samples[0].len();
        if samples.iter().any(|ch| ch.len() != len) {
            return Err(ClipError::InvalidAudio {
                reason: "All channels must have the same length".to_string(),
                source: None,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Errors
    /// `InvalidAudio` if the data length is not a multiple of the channel count.
    pub fn from_interleaved(
        interleaved: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 || interleaved.len() % num_channels != 0 {
            return Err(ClipError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ... for stereo)
    ///
    /// Channels shorter than the longest one are padded with silence.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.samples.iter().map(|ch| ch.len()).max().unwrap_or(0);

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel.get(sample_idx).copied().unwrap_or(0.0));
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds, always >= 0
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get a sample at the specified channel and index
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Maximum absolute sample value, recomputed on every call
    pub fn peak_amplitude(&self) -> f32 {
        calculate_peak(&self.samples)
    }

    /// Peak amplitude in dBFS
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peak_amplitude())
    }

    /// Drop every sample before `start_secs`
    ///
    /// The start is rounded to the nearest sample and clamped to the buffer
    /// length, so trimming past the end yields an empty buffer.
    pub fn trim_start(mut self, start_secs: f64) -> AudioBuffer {
        let start = (start_secs.max(0.0) * self.sample_rate as f64).round() as usize;
        let start = start.min(self.len());
        for channel in &mut self.samples {
            channel.drain(..start);
        }
        self
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Stereo, OUTPUT_SAMPLE_RATE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_buffer(samples: Vec<Vec<f32>>) -> AudioBuffer {
        AudioBuffer {
            samples,
            sample_rate: 1000,
        }
    }

    #[test]
    fn test_linear_to_db() {
        assert!((linear_to_db(1.0) - 0.0).abs() < 1e-6);
        assert!((linear_to_db(0.5) - (-6.0206)).abs() < 1e-3);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_peak_takes_absolute_value() {
        let buffer = create_test_buffer(vec![vec![0.1, -0.7, 0.3], vec![0.2, 0.4, -0.1]]);
        assert_relative_eq!(buffer.peak_amplitude(), 0.7);
    }

    #[test]
    fn test_peak_of_empty_and_silent_is_zero() {
        assert_eq!(create_test_buffer(vec![]).peak_amplitude(), 0.0);
        assert_eq!(create_test_buffer(vec![vec![0.0; 16]]).peak_amplitude(), 0.0);
    }

    #[test]
    fn test_peak_recomputed_after_mutation() {
        let mut buffer = create_test_buffer(vec![vec![0.2; 8]]);
        assert_relative_eq!(buffer.peak_amplitude(), 0.2);
        buffer.samples[0][3] = -0.9;
        assert_relative_eq!(buffer.peak_amplitude(), 0.9);
    }

    #[test]
    fn test_channel_layout() {
        assert_eq!(ChannelLayout::Mono.num_channels(), 1);
        assert_eq!(ChannelLayout::Stereo.num_channels(), 2);
        assert_eq!(ChannelLayout::from_count(2), Some(ChannelLayout::Stereo));
        assert_eq!(ChannelLayout::from_count(6), None);
    }

    #[test]
    fn test_buffer_duration() {
        let buffer = AudioBuffer::new(2500, ChannelLayout::Mono, 1000);
        assert_relative_eq!(buffer.duration_secs(), 2.5);

        let zero_rate = AudioBuffer {
            samples: vec![vec![0.0; 10]],
            sample_rate: 0,
        };
        assert_eq!(zero_rate.duration_secs(), 0.0);
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 3], vec![0.0; 4]], 1000);
        assert!(matches!(result, Err(ClipError::InvalidAudio { .. })));
        assert!(AudioBuffer::from_channels(vec![], 1000).is_err());
        assert!(AudioBuffer::from_channels(vec![vec![0.0]], 0).is_err());
    }

    #[test]
    fn test_buffer_from_interleaved_stereo() {
        let interleaved = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let buffer = AudioBuffer::from_interleaved(&interleaved, 2, 1000).unwrap();

        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get_sample(0, 1), Some(0.3));
        assert_eq!(buffer.get_sample(1, 1), Some(0.4));
        assert_eq!(buffer.to_interleaved(), interleaved);
    }

    #[test]
    fn test_buffer_from_interleaved_invalid() {
        let result = AudioBuffer::from_interleaved(&[0.1, 0.2, 0.3], 2, 1000);
        assert!(result.is_err());
    }

    #[test]
    fn test_ragged_channels_interleave_with_silence() {
        let buffer = create_test_buffer(vec![vec![0.1, 0.2, 0.3], vec![0.4]]);
        assert_eq!(buffer.to_interleaved(), vec![0.1, 0.4, 0.2, 0.0, 0.3, 0.0]);
    }

    #[test]
    fn test_trim_start() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let buffer = AudioBuffer {
            samples: vec![samples],
            sample_rate: 10,
        };
        let trimmed = buffer.clone().trim_start(0.3);
        assert_eq!(trimmed.len(), 7);
        assert_eq!(trimmed.get_sample(0, 0), Some(3.0));

        let past_end = buffer.trim_start(5.0);
        assert!(past_end.is_empty());
        assert_eq!(past_end.channels(), 1);
    }
}
