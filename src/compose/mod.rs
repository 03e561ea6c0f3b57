//! Composition
//!
//! Asset descriptors and the speech + music composer built on the core.

pub mod asset;
pub mod composer;

pub use asset::{AssetDescriptor, AssetParameters, AudioAsset};
pub use composer::{merge_speech_with_music, save_audio_clip, TrackComposer};
