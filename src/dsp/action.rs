//! Pipeline actions
//!
//! `Action` is the validated, typed form of an action descriptor. Descriptors
//! arrive as `{ "type": ..., "param": ... }` objects; unrecognized types are
//! kept as [`Action::Unknown`] and pass through the pipeline untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClipError, Result};

/// Descriptor tag for [`Action::Normalize`]
pub const NORMALIZE_TAG: &str = "normalize_music";
/// Descriptor tag for [`Action::LoopToDuration`]
pub const LOOP_TAG: &str = "loop_background_music";
/// Descriptor tag for [`Action::ScaleVolume`]
pub const VOLUME_TAG: &str = "volume_percentage";

/// One transformation step applied to a buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Bring the peak to full scale
    Normalize,
    /// Skip the lead-in, repeat to `target_secs`, then converge loudness
    LoopToDuration { target_secs: f64 },
    /// Multiply every sample by `factor`
    ScaleVolume { factor: f32 },
    /// An action kind this version does not know; a no-op
    Unknown { tag: String },
}

impl Action {
    /// Build a validated loop action
    pub fn loop_to_duration(target_secs: f64) -> Result<Self> {
        let action = Action::LoopToDuration { target_secs };
        action.validate()?;
        Ok(action)
    }

    /// Build a validated volume action
    pub fn scale_volume(factor: f32) -> Result<Self> {
        let action = Action::ScaleVolume { factor };
        action.validate()?;
        Ok(action)
    }

    /// Check parameters are finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        match self {
            Action::LoopToDuration { target_secs } => {
                if !(target_secs.is_finite() && *target_secs > 0.0) {
                    return Err(ClipError::InvalidAction {
                        reason: format!(
                            "{} target must be a positive duration, got {}",
                            LOOP_TAG, target_secs
                        ),
                    });
                }
            }
            Action::ScaleVolume { factor } => {
                if !(factor.is_finite() && *factor > 0.0) {
                    return Err(ClipError::InvalidAction {
                        reason: format!(
                            "{} factor must be positive, got {}",
                            VOLUME_TAG, factor
                        ),
                    });
                }
            }
            Action::Normalize | Action::Unknown { .. } => {}
        }
        Ok(())
    }

    /// The descriptor tag this action serializes under
    pub fn tag(&self) -> &str {
        match self {
            Action::Normalize => NORMALIZE_TAG,
            Action::LoopToDuration { .. } => LOOP_TAG,
            Action::ScaleVolume { .. } => VOLUME_TAG,
            Action::Unknown { tag } => tag,
        }
    }

    /// Parse and validate a descriptor
    pub fn from_descriptor(descriptor: &ActionDescriptor) -> Result<Self> {
        let param = |tag: &str| {
            descriptor.param.ok_or_else(|| ClipError::InvalidAction {
                reason: format!("{} requires a numeric param", tag),
            })
        };

        let action = match descriptor.kind.as_str() {
            NORMALIZE_TAG => Action::Normalize,
            LOOP_TAG => Action::LoopToDuration {
                target_secs: param(LOOP_TAG)?,
            },
            VOLUME_TAG => Action::ScaleVolume {
                factor: param(VOLUME_TAG)? as f32,
            },
            other => Action::Unknown {
                tag: other.to_string(),
            },
        };
        action.validate()?;
        Ok(action)
    }

    /// Convert back into descriptor form
    pub fn to_descriptor(&self) -> ActionDescriptor {
        let param = match self {
            Action::LoopToDuration { target_secs } => Some(*target_secs),
            Action::ScaleVolume { factor } => Some(*factor as f64),
            Action::Normalize | Action::Unknown { .. } => None,
        };
        ActionDescriptor {
            kind: self.tag().to_string(),
            param,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Normalize => write!(f, "normalize"),
            Action::LoopToDuration { target_secs } => write!(f, "loop to {:.2}s", target_secs),
            Action::ScaleVolume { factor } => write!(f, "volume {:.0}%", factor * 100.0),
            Action::Unknown { tag } => write!(f, "unknown action '{}'", tag),
        }
    }
}

/// Serialized form of an action: `{ "type": "...", "param": 1.5 }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<f64>,
}

/// Parse a whole descriptor list, preserving order
pub fn parse_actions(descriptors: &[ActionDescriptor]) -> Result<Vec<Action>> {
    descriptors.iter().map(Action::from_descriptor).collect()
}
