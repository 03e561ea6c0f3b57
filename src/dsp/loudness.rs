//! Loudness convergence
//!
//! Drives a buffer's peak amplitude into a `[min_peak, max_peak]` band by
//! repeatedly adjusting a cumulative volume factor. Each attempt rescales the
//! original buffer with the running factor, never an already-scaled copy, so
//! rounding error does not compound across iterations.
//!
//! Overshoot is damped by the smoothing fraction: a loud buffer is pulled down
//! to slightly below `max_peak`, a quiet one pushed to slightly above
//! `min_peak`.

use serde::{Deserialize, Serialize};

use super::gain::apply_gain;
use crate::engine::AudioBuffer;
use crate::error::{ClipError, Result};
use crate::events::{ProgressEvent, ProgressObserver};

/// Default iteration cap for [`converge`]
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Acceptable peak-amplitude range plus the overshoot damping fraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoudnessBand {
    pub min_peak: f32,
    pub max_peak: f32,
    pub smoothing: f32,
}

impl Default for LoudnessBand {
    fn default() -> Self {
        Self {
            min_peak: 0.10,
            max_peak: 0.30,
            smoothing: 0.10,
        }
    }
}

impl LoudnessBand {
    /// Build a validated band
    pub fn new(min_peak: f32, max_peak: f32, smoothing: f32) -> Result<Self> {
        let band = Self {
            min_peak,
            max_peak,
            smoothing,
        };
        band.validate()?;
        Ok(band)
    }

    /// Require `0 < min_peak <= max_peak` and `0 <= smoothing < 1`
    pub fn validate(&self) -> Result<()> {
        if !(self.min_peak.is_finite() && self.min_peak > 0.0) {
            return Err(ClipError::InvalidParameter {
                name: "min_peak".to_string(),
                reason: format!("must be positive, got {}", self.min_peak),
            });
        }
        if !(self.max_peak.is_finite() && self.max_peak >= self.min_peak) {
            return Err(ClipError::InvalidParameter {
                name: "max_peak".to_string(),
                reason: format!(
                    "must be at least min_peak ({}), got {}",
                    self.min_peak, self.max_peak
                ),
            });
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(ClipError::InvalidParameter {
                name: "smoothing".to_string(),
                reason: format!("must be in [0, 1), got {}", self.smoothing),
            });
        }
        Ok(())
    }

    /// True if `peak` lies inside the closed band
    #[inline]
    pub fn contains(&self, peak: f32) -> bool {
        peak >= self.min_peak && peak <= self.max_peak
    }
}

/// Result of a successful convergence
#[derive(Debug, Clone, PartialEq)]
pub struct Converged {
    /// The input scaled by `volume_factor`
    pub buffer: AudioBuffer,
    /// Cumulative factor applied to the input
    pub volume_factor: f64,
    /// Number of rescaling attempts made
    pub iterations: usize,
}

/// Rescale `buffer` until its peak lies inside `band`
///
/// A silent buffer (peak 0) is already considered converged and is returned
/// unchanged after zero iterations.
///
/// # Errors
/// `ConvergenceFailure` once `max_iterations` attempts have been made without
/// landing in the band, or if the running factor stops being a positive
/// finite number.
pub fn converge(
    buffer: AudioBuffer,
    band: &LoudnessBand,
    max_iterations: usize,
    observer: &dyn ProgressObserver,
) -> Result<Converged> {
    let mut detected = buffer.peak_amplitude();

    if detected == 0.0 || band.contains(detected) {
        observer.on_event(&ProgressEvent::VolumeConverged {
            peak: detected,
            volume_factor: 1.0,
            iterations: 0,
        });
        return Ok(Converged {
            buffer,
            volume_factor: 1.0,
            iterations: 0,
        });
    }

    let failure = |iterations: usize, last_peak: f32| ClipError::ConvergenceFailure {
        iterations,
        last_peak,
        min_peak: band.min_peak,
        max_peak: band.max_peak,
    };

    let smoothing = band.smoothing as f64;
    let mut volume_factor = 1.0_f64;
    let mut iterations = 0;
    let mut current: Option<AudioBuffer> = None;

    while !band.contains(detected) {
        if iterations >= max_iterations {
            return Err(failure(iterations, detected));
        }

        if detected > band.max_peak {
            observer.on_event(&ProgressEvent::VolumeTooHigh {
                detected,
                iteration: iterations,
            });
            volume_factor *= (band.max_peak as f64 / detected as f64) * (1.0 - smoothing);
        } else {
            observer.on_event(&ProgressEvent::VolumeTooLow {
                detected,
                iteration: iterations,
            });
            volume_factor *= (band.min_peak as f64 / detected as f64) * (1.0 + smoothing);
        }
        iterations += 1;

        if !(volume_factor.is_finite() && volume_factor > 0.0) {
            return Err(failure(iterations, detected));
        }

        let attempt = apply_gain(buffer.clone(), volume_factor);
        detected = attempt.peak_amplitude();
        current = Some(attempt);
    }

    observer.on_event(&ProgressEvent::VolumeConverged {
        peak: detected,
        volume_factor,
        iterations,
    });

    Ok(Converged {
        buffer: current.unwrap_or(buffer),
        volume_factor,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullObserver, RecordingObserver};
    use approx::assert_relative_eq;

    fn with_peak(peak: f32) -> AudioBuffer {
        AudioBuffer {
            samples: vec![vec![0.0, peak, -peak * 0.5, peak * 0.25]],
            sample_rate: 1000,
        }
    }

    #[test]
    fn test_loud_buffer_converges_in_one_step() {
        let result = converge(with_peak(0.60), &LoudnessBand::default(), 20, &NullObserver)
            .unwrap();

        assert_eq!(result.iterations, 1);
        assert_relative_eq!(result.volume_factor, 0.45, epsilon = 1e-6);
        assert_relative_eq!(result.buffer.peak_amplitude(), 0.27, epsilon = 1e-5);
    }

    #[test]
    fn test_quiet_buffer_converges_in_one_step() {
        let result = converge(with_peak(0.05), &LoudnessBand::default(), 20, &NullObserver)
            .unwrap();

        assert_eq!(result.iterations, 1);
        assert_relative_eq!(result.volume_factor, 2.2, epsilon = 1e-6);
        assert_relative_eq!(result.buffer.peak_amplitude(), 0.11, epsilon = 1e-5);
    }

    #[test]
    fn test_in_band_buffer_untouched() {
        let input = with_peak(0.2);
        let result = converge(input.clone(), &LoudnessBand::default(), 20, &NullObserver)
            .unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.buffer, input);
    }

    #[test]
    fn test_silence_returned_unchanged() {
        let silent = AudioBuffer {
            samples: vec![vec![0.0; 64]],
            sample_rate: 1000,
        };
        let result = converge(silent.clone(), &LoudnessBand::default(), 0, &NullObserver)
            .unwrap();
        assert_eq!(result.buffer, silent);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.volume_factor, 1.0);
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let err = converge(with_peak(0.9), &LoudnessBand::default(), 0, &NullObserver)
            .unwrap_err();
        match err {
            ClipError::ConvergenceFailure {
                iterations,
                last_peak,
                ..
            } => {
                assert_eq!(iterations, 0);
                assert_relative_eq!(last_peak, 0.9);
            }
            other => panic!("Expected ConvergenceFailure, got: {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_band_fails_after_exact_cap() {
        // Band so narrow that the damped corrections keep stepping over it
        let band = LoudnessBand::new(0.2, 0.2, 0.5).unwrap();
        let observer = RecordingObserver::new();
        let err = converge(with_peak(0.8), &band, 7, &observer).unwrap_err();

        assert!(matches!(err, ClipError::ConvergenceFailure { iterations: 7, .. }));
        let attempts = observer
            .events()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    ProgressEvent::VolumeTooHigh { .. } | ProgressEvent::VolumeTooLow { .. }
                )
            })
            .count();
        assert_eq!(attempts, 7);
    }

    #[test]
    fn test_subnormal_peak_converges() {
        let tiny = AudioBuffer {
            samples: vec![vec![0.0, 1e-40, -5e-41]],
            sample_rate: 1000,
        };
        let result = converge(tiny, &LoudnessBand::default(), 20, &NullObserver).unwrap();

        assert_eq!(result.iterations, 1);
        assert!(result.buffer.samples[0].iter().all(|s| s.is_finite()));
        assert_relative_eq!(result.buffer.peak_amplitude(), 0.11, epsilon = 1e-4);
    }

    #[test]
    fn test_band_validation() {
        assert!(LoudnessBand::new(0.1, 0.3, 0.1).is_ok());
        assert!(LoudnessBand::new(0.0, 0.3, 0.1).is_err());
        assert!(LoudnessBand::new(0.4, 0.3, 0.1).is_err());
        assert!(LoudnessBand::new(0.1, 0.3, 1.0).is_err());
        assert!(LoudnessBand::new(0.1, 0.3, -0.1).is_err());
    }
}
