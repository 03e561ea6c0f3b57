//! Mix settings
//!
//! Every field has a default, so a settings file only needs to name what it
//! changes:
//!
//! ```json
//! { "band": { "max_peak": 0.25 }, "music_volume": 0.4 }
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dsp::{LoudnessBand, DEFAULT_MAX_ITERATIONS};
use crate::engine::{ExportFormat, OUTPUT_SAMPLE_RATE};
use crate::error::{ClipError, Result};

/// Tunables for pipelines, composition and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixSettings {
    /// Target peak band for looped music
    pub band: LoudnessBand,
    /// Convergence attempts before giving up
    pub max_iterations: usize,
    /// Gain applied to normalized speech
    pub speech_volume: f32,
    /// Gain applied to looped, converged music
    pub music_volume: f32,
    /// Output bit depth: 16, 24 or 32
    pub bit_depth: u16,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            band: LoudnessBand::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            speech_volume: 1.0,
            music_volume: 0.5,
            bit_depth: 16,
        }
    }
}

impl MixSettings {
    /// Read settings from a JSON file and validate them
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ClipError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        let settings = Self::from_json(&text)?;
        debug!("Loaded mix settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Parse settings from a JSON string and validate them
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: MixSettings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.band.validate()?;
        for (name, value) in [
            ("speech_volume", self.speech_volume),
            ("music_volume", self.music_volume),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ClipError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be positive, got {}", value),
                });
            }
        }
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(ClipError::InvalidParameter {
                name: "bit_depth".to_string(),
                reason: format!("must be 16, 24 or 32, got {}", self.bit_depth),
            });
        }
        Ok(())
    }

    /// Export format for finished mixes, always at the fixed output rate
    pub fn export_format(&self) -> ExportFormat {
        ExportFormat::new(OUTPUT_SAMPLE_RATE, self.bit_depth)
    }
}
