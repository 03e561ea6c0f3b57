//! Error handling for clipforge
//!
//! Load failures, convergence failures and export failures are all explicit
//! variants so callers can tell them apart at the composition boundary.

use thiserror::Error;

/// Result type alias for clipforge operations
pub type Result<T> = std::result::Result<T, ClipError>;

/// Main error type for clipforge operations
#[derive(Error, Debug)]
pub enum ClipError {
    // Load Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Failed to transcode {path}: {reason}")]
    Transcode { path: String, reason: String },

    // Pipeline Errors
    #[error("Invalid action: {reason}")]
    InvalidAction { reason: String },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(
        "Loudness did not converge after {iterations} iterations \
         (last peak {last_peak:.4}, band [{min_peak:.2}, {max_peak:.2}])"
    )]
    ConvergenceFailure {
        iterations: usize,
        last_peak: f32,
        min_peak: f32,
        max_peak: f32,
    },

    // Export Errors
    #[error("Failed to export audio to {path}: {reason}")]
    Export { path: String, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClipError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ClipError::FileNotFound { .. } => "FILE_NOT_FOUND",
            ClipError::InvalidAudio { .. } => "INVALID_AUDIO",
            ClipError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            ClipError::EmptyAudio => "EMPTY_AUDIO",
            ClipError::Transcode { .. } => "TRANSCODE_FAILED",
            ClipError::InvalidAction { .. } => "INVALID_ACTION",
            ClipError::InvalidParameter { .. } => "INVALID_PARAMETER",
            ClipError::ConvergenceFailure { .. } => "CONVERGENCE_FAILURE",
            ClipError::Export { .. } => "EXPORT_FAILED",
            ClipError::Io(_) => "IO_ERROR",
            ClipError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for failures raised while reading or decoding a source
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ClipError::FileNotFound { .. }
                | ClipError::InvalidAudio { .. }
                | ClipError::UnsupportedFormat { .. }
                | ClipError::EmptyAudio
                | ClipError::Transcode { .. }
        )
    }

    /// Check if this error is recoverable by retrying with different input
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClipError::FileNotFound { .. } => true,
            ClipError::InvalidAudio { .. } => true,
            ClipError::UnsupportedFormat { .. } => true,
            ClipError::Transcode { .. } => true,
            ClipError::ConvergenceFailure { .. } => true,
            ClipError::InvalidAction { .. } => true,
            ClipError::InvalidParameter { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn export(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        ClipError::Export {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}
