//! Audio asset descriptors
//!
//! An asset names a source and the actions to run over it:
//!
//! ```json
//! {
//!   "parameters": { "url": "music/bed.mp3" },
//!   "actions": [
//!     { "type": "normalize_music" },
//!     { "type": "loop_background_music", "param": 30.0 },
//!     { "type": "volume_percentage", "param": 0.5 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::{parse_actions, Action, ActionDescriptor};
use crate::error::{ClipError, Result};

/// Serialized asset parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetParameters {
    pub url: String,
}

/// Serialized form of an [`AudioAsset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub parameters: AssetParameters,
    #[serde(default)]
    pub actions: Vec<ActionDescriptor>,
}

/// A source plus the ordered actions to apply to it
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    pub source_uri: String,
    pub actions: Vec<Action>,
}

impl AudioAsset {
    pub fn new(source_uri: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            source_uri: source_uri.into(),
            actions,
        }
    }

    /// Validate a descriptor into an asset, keeping action order
    pub fn from_descriptor(descriptor: &AssetDescriptor) -> Result<Self> {
        if descriptor.parameters.url.trim().is_empty() {
            return Err(ClipError::InvalidParameter {
                name: "parameters.url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            source_uri: descriptor.parameters.url.clone(),
            actions: parse_actions(&descriptor.actions)?,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let descriptor: AssetDescriptor = serde_json::from_str(text)?;
        Self::from_descriptor(&descriptor)
    }

    /// Read a descriptor file
    ///
    /// Relative source URLs resolve against the descriptor's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ClipError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        let mut asset = Self::from_json(&text)?;

        let source = Path::new(&asset.source_uri);
        if source.is_relative() {
            if let Some(dir) = path.parent() {
                asset.source_uri = dir.join(source).display().to_string();
            }
        }
        Ok(asset)
    }

    pub fn to_descriptor(&self) -> AssetDescriptor {
        AssetDescriptor {
            parameters: AssetParameters {
                url: self.source_uri.clone(),
            },
            actions: self.actions.iter().map(Action::to_descriptor).collect(),
        }
    }
}
