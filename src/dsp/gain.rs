//! Gain stages
//!
//! Volume scaling and peak normalization. Both take a buffer by value and
//! return the transformed buffer.

use crate::engine::AudioBuffer;

// ============================================================================
// Constants
// ============================================================================

/// Peak amplitude a normalized buffer reaches (full scale)
pub const NORMALIZED_PEAK: f32 = 1.0;

// ============================================================================
// Gain Functions
// ============================================================================

/// Multiply every sample by `factor`
pub fn scale_volume(buffer: AudioBuffer, factor: f32) -> AudioBuffer {
    // Unity gain optimization
    if (factor - 1.0).abs() < f32::EPSILON {
        return buffer;
    }
    apply_gain(buffer, factor as f64)
}

/// Multiply every sample by a wide `factor`
///
/// Each product is formed in f64 and rounded once, so a factor too large for
/// f32 still maps a tiny sample to a representable one.
pub fn apply_gain(mut buffer: AudioBuffer, factor: f64) -> AudioBuffer {
    for channel in &mut buffer.samples {
        for sample in channel.iter_mut() {
            *sample = (*sample as f64 * factor) as f32;
        }
    }
    buffer
}

/// Scale so the peak amplitude equals [`NORMALIZED_PEAK`]
///
/// Silent and empty buffers are returned unchanged.
pub fn normalize(buffer: AudioBuffer) -> AudioBuffer {
    let peak = buffer.peak_amplitude();
    if peak <= 0.0 || !peak.is_finite() {
        return buffer;
    }
    apply_gain(buffer, NORMALIZED_PEAK as f64 / peak as f64)
}
