//! Audio Engine Module
//!
//! Buffer type plus everything that moves audio between disk and memory:
//! - Audio buffer management
//! - WAV codec and export formats
//! - Container transcoding
//! - Sample rate conversion

pub mod buffer;
pub mod io;
pub mod resample;
pub mod transcode;

pub use buffer::{AudioBuffer, ChannelLayout, OUTPUT_SAMPLE_RATE};
pub use io::{
    export_audio, generate_test_tone, import_audio, AudioCodec, ExportFormat, MemoryCodec, WavCodec,
};
pub use transcode::{transcode_to_wav, TranscodedWav};
