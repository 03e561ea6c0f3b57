//! Clipforge - Declarative Audio Asset Processing
//!
//! Clipforge turns an audio asset description (a source plus an ordered list
//! of actions) into a processed buffer, and mixes narration over a music bed
//! looped to the narration's length.
//!
//! # Architecture
//!
//! - `engine`: buffers, the `AudioCodec` seam, WAV I/O and transcoding
//! - `dsp`: actions, the effect pipeline, loudness convergence and mixing
//! - `compose`: asset descriptors and the speech + music composer
//! - `events`: progress reporting through an observer instead of stdout

pub mod cli;
pub mod compose;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod events;

pub use compose::{merge_speech_with_music, save_audio_clip, AudioAsset, TrackComposer};
pub use config::MixSettings;
pub use dsp::{Action, EffectPipeline, LoudnessBand};
pub use engine::{AudioBuffer, AudioCodec, WavCodec};
pub use error::{ClipError, Result};
