//! Duration-matched looping
//!
//! Background music usually opens with an intro that sounds wrong when
//! repeated, so the first [`LEAD_IN_FRACTION`] of the source is always
//! dropped before the remainder is tiled out to the target length.

use crate::engine::AudioBuffer;

/// Fraction of the source duration discarded before looping
pub const LEAD_IN_FRACTION: f64 = 0.15;

/// Where looping starts and how long the result is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPlan {
    pub source_secs: f64,
    pub trim_start_secs: f64,
    pub target_secs: f64,
}

impl LoopPlan {
    pub fn for_source(source: &AudioBuffer, target_secs: f64) -> Self {
        let source_secs = source.duration_secs();
        Self {
            source_secs,
            trim_start_secs: source_secs * LEAD_IN_FRACTION,
            target_secs,
        }
    }
}

/// Trim the lead-in, then repeat or truncate the remainder to `target_secs`
///
/// The result holds `round(target_secs * sample_rate)` samples per channel.
/// If nothing remains after trimming, the result is silence of that length.
pub fn loop_to_duration(buffer: AudioBuffer, target_secs: f64) -> AudioBuffer {
    let plan = LoopPlan::for_source(&buffer, target_secs);
    let sample_rate = buffer.sample_rate;
    let target_len = (target_secs.max(0.0) * sample_rate as f64).round() as usize;

    let body = buffer.trim_start(plan.trim_start_secs);

    let samples = body
        .samples
        .iter()
        .map(|channel| {
            if channel.is_empty() {
                vec![0.0; target_len]
            } else {
                channel.iter().copied().cycle().take(target_len).collect()
            }
        })
        .collect();

    AudioBuffer {
        samples,
        sample_rate,
    }
}
