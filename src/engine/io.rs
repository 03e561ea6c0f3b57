//! Audio file I/O for clipforge
//!
//! `AudioCodec` is the seam between the processing core and whatever decodes
//! and encodes files. `WavCodec` reads and writes WAV through hound and hands
//! every other container to the transcoder first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::engine::buffer::{AudioBuffer, ChannelLayout, OUTPUT_SAMPLE_RATE};
use crate::engine::resample::resample;
use crate::engine::transcode::{is_wav, transcode_to_wav};
use crate::error::{ClipError, Result};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    /// Target sample rate (default: 44100)
    pub sample_rate: u32,
    /// Bit depth: 16, 24, or 32 (default: 16)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat {
            sample_rate: OUTPUT_SAMPLE_RATE,
            bit_depth: 16,
        }
    }
}

impl ExportFormat {
    /// Create a new export format with the given sample rate and bit depth
    pub fn new(sample_rate: u32, bit_depth: u16) -> Self {
        ExportFormat {
            sample_rate,
            bit_depth,
        }
    }
}

/// Decodes sources into buffers and encodes buffers into files
pub trait AudioCodec {
    /// Decode the source at `uri` into an in-memory buffer
    fn decode(&self, uri: &str) -> Result<AudioBuffer>;

    /// Encode `buffer` to `path` in the given format
    fn encode(&self, buffer: &AudioBuffer, path: &Path, format: &ExportFormat) -> Result<()>;
}

/// File-backed codec: WAV natively, other containers via a temporary WAV
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl AudioCodec for WavCodec {
    fn decode(&self, uri: &str) -> Result<AudioBuffer> {
        let path = Path::new(uri);
        if !path.exists() {
            return Err(ClipError::FileNotFound {
                path: uri.to_string(),
                source: None,
            });
        }

        if is_wav(path) {
            return import_audio(path);
        }

        // The temporary WAV is removed when `intermediate` drops, on every path out.
        let intermediate = transcode_to_wav(path)?;
        debug!(
            "Decoding {} via intermediate {}",
            uri,
            intermediate.path().display()
        );
        import_audio(intermediate.path())
    }

    fn encode(&self, buffer: &AudioBuffer, path: &Path, format: &ExportFormat) -> Result<()> {
        export_audio(buffer, path, format)
    }
}

/// Codec over buffers already held in memory
///
/// Sources are registered under a URI; encoded buffers are kept per path,
/// resampled to the requested rate, instead of touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryCodec {
    sources: HashMap<String, AudioBuffer>,
    written: Mutex<HashMap<PathBuf, AudioBuffer>>,
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `buffer` as the decoded form of `uri`
    pub fn with_source(mut self, uri: impl Into<String>, buffer: AudioBuffer) -> Self {
        self.sources.insert(uri.into(), buffer);
        self
    }

    /// The buffer last encoded to `path`, if any
    pub fn written(&self, path: &Path) -> Option<AudioBuffer> {
        self.written
            .lock()
            .ok()
            .and_then(|written| written.get(path).cloned())
    }
}

impl AudioCodec for MemoryCodec {
    fn decode(&self, uri: &str) -> Result<AudioBuffer> {
        self.sources
            .get(uri)
            .cloned()
            .ok_or_else(|| ClipError::FileNotFound {
                path: uri.to_string(),
                source: None,
            })
    }

    fn encode(&self, buffer: &AudioBuffer, path: &Path, format: &ExportFormat) -> Result<()> {
        let mut written = self
            .written
            .lock()
            .map_err(|e| ClipError::export(path, e))?;
        written.insert(
            path.to_path_buf(),
            resample(buffer.clone(), format.sample_rate),
        );
        Ok(())
    }
}

/// Import a WAV file into an AudioBuffer at its native sample rate
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the audio has more than 2 channels
/// * `EmptyAudio` - If the file holds no samples
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(ClipError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| ClipError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    if ChannelLayout::from_count(channels).is_none() {
        return Err(ClipError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let samples_f32 = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if samples_f32.is_empty() {
        return Err(ClipError::EmptyAudio);
    }

    AudioBuffer::from_interleaved(&samples_f32, channels, spec.sample_rate)
}

/// Export an AudioBuffer to a WAV file, resampling to the target rate
///
/// Integer formats clamp to full scale; 32-bit exports float samples as-is.
///
/// # Errors
/// * `UnsupportedFormat` - If the bit depth is not 16, 24 or 32
/// * `Export` - If the file cannot be created or written
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: &ExportFormat) -> Result<()> {
    if !matches!(format.bit_depth, 16 | 24 | 32) {
        return Err(ClipError::UnsupportedFormat {
            format: format!("{}-bit audio (only 16, 24, 32 supported)", format.bit_depth),
        });
    }

    let export_buffer = resample(buffer.clone(), format.sample_rate);
    let interleaved = export_buffer.to_interleaved();

    let spec = WavSpec {
        channels: export_buffer.channels().max(1) as u16,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| ClipError::export(path, e))?;

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer
                    .write_sample(scaled)
                    .map_err(|e| ClipError::export(path, e))?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer
                    .write_sample(scaled)
                    .map_err(|e| ClipError::export(path, e))?;
            }
        }
        _ => {
            for sample in interleaved {
                writer
                    .write_sample(sample)
                    .map_err(|e| ClipError::export(path, e))?;
            }
        }
    }

    writer.finalize().map_err(|e| ClipError::export(path, e))?;

    Ok(())
}

/// Generate a mono sine wave with the given peak amplitude
pub fn generate_test_tone(
    frequency: f32,
    amplitude: f32,
    duration_secs: f64,
    sample_rate: u32,
) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f64).round() as usize;
    let mut buffer = AudioBuffer::new(num_samples, ChannelLayout::Mono, sample_rate);

    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    for (i, sample) in buffer.samples[0].iter_mut().enumerate() {
        *sample = amplitude * (angular_freq * i as f32).sin();
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let scale = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => {
            return reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| ClipError::InvalidAudio {
                    reason: format!("Failed to read float samples: {}", e),
                    source: Some(Box::new(e)),
                });
        }
        (SampleFormat::Int, 8) => 128.0,
        (SampleFormat::Int, 16) => 32768.0,
        (SampleFormat::Int, 24) => 8388608.0,
        (SampleFormat::Int, 32) => 2147483648.0,
        (SampleFormat::Int, bits) => {
            return Err(ClipError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits),
            });
        }
    };

    reader
        .samples::<i32>()
        .map(|s| s.map(|v| (v as f64 / scale) as f32))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| ClipError::InvalidAudio {
            reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
            source: Some(Box::new(e)),
        })
}

// ============================================================================
// Tests
// ============================================================================
