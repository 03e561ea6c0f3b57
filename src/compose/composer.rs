//! Speech + music composition
//!
//! Narration is normalized and scaled; the music bed is normalized, looped to
//! the narration's length (finishing loudness-converged) and scaled; then the
//! two are summed. Any failure aborts the whole mix.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::asset::AudioAsset;
use crate::config::MixSettings;
use crate::dsp::{merge_with_observer, Action, EffectPipeline};
use crate::engine::{AudioBuffer, AudioCodec, WavCodec};
use crate::error::{ClipError, Result};
use crate::events::{ProgressEvent, SharedObserver, TracingObserver};

/// Drives decoding, pipelines, mixing and export over one codec
pub struct TrackComposer<C: AudioCodec = WavCodec> {
    codec: C,
    settings: MixSettings,
    observer: SharedObserver,
}

impl<C: AudioCodec> TrackComposer<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            settings: MixSettings::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the settings after validating them
    pub fn with_settings(mut self, settings: MixSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &MixSettings {
        &self.settings
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decode a source, reporting the outcome
    pub fn decode(&self, uri: &str) -> Result<AudioBuffer> {
        match self.codec.decode(uri) {
            Ok(buffer) => {
                self.observer.on_event(&ProgressEvent::AssetLoaded {
                    uri: uri.to_string(),
                    duration_secs: buffer.duration_secs(),
                });
                Ok(buffer)
            }
            Err(err) => {
                self.observer.on_event(&ProgressEvent::AssetLoadFailed {
                    uri: uri.to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Build a pipeline carrying this composer's band, cap and observer
    pub fn pipeline(&self, actions: Vec<Action>) -> Result<EffectPipeline> {
        Ok(EffectPipeline::new(actions)?
            .with_band(self.settings.band)?
            .with_max_iterations(self.settings.max_iterations)
            .with_observer(Arc::clone(&self.observer)))
    }

    /// Decode an asset's source and run its actions
    pub fn render_asset(&self, asset: &AudioAsset) -> Result<AudioBuffer> {
        let pipeline = self.pipeline(asset.actions.clone())?;
        let buffer = self.decode(&asset.source_uri)?;
        pipeline.apply(buffer)
    }

    /// Mix narration over a looped music bed using the configured volumes
    pub fn compose_default(&self, speech_uri: &str, music_uri: &str) -> Result<AudioBuffer> {
        self.compose(
            speech_uri,
            music_uri,
            self.settings.speech_volume,
            self.settings.music_volume,
        )
    }

    /// Mix narration over a music bed looped to the narration's length
    ///
    /// # Errors
    /// Any decode, validation or convergence failure in either track; no
    /// partial mix is produced.
    pub fn compose(
        &self,
        speech_uri: &str,
        music_uri: &str,
        speech_volume: f32,
        music_volume: f32,
    ) -> Result<AudioBuffer> {
        let speech_pipeline =
            self.pipeline(vec![Action::Normalize, Action::scale_volume(speech_volume)?])?;
        let speech = speech_pipeline.apply(self.decode(speech_uri)?)?;
        let speech_duration = speech.duration_secs();
        info!("Speech track ready: {:.2}s", speech_duration);

        let music_pipeline = self.pipeline(vec![
            Action::Normalize,
            Action::loop_to_duration(speech_duration)?,
            Action::scale_volume(music_volume)?,
        ])?;
        let music = music_pipeline.apply(self.decode(music_uri)?)?;

        merge_with_observer(vec![music, speech], self.observer.as_ref())
            .ok_or(ClipError::EmptyAudio)
    }

    /// Encode a finished buffer at the fixed output rate
    pub fn save(&self, buffer: &AudioBuffer, output_path: &Path) -> Result<()> {
        let format = self.settings.export_format();
        self.observer.on_event(&ProgressEvent::Saving {
            path: output_path.display().to_string(),
            sample_rate: format.sample_rate,
        });
        self.codec.encode(buffer, output_path, &format)
    }

    /// Compose and write the mix, returning the output path
    pub fn merge_speech_with_music(
        &self,
        speech_uri: &str,
        music_uri: &str,
        output_path: &Path,
        speech_volume: f32,
        music_volume: f32,
    ) -> Result<PathBuf> {
        let mixed = self
            .compose(speech_uri, music_uri, speech_volume, music_volume)
            .map_err(|err| {
                warn!("Composition of {} + {} failed: {}", speech_uri, music_uri, err);
                err
            })?;
        self.save(&mixed, output_path)?;
        Ok(output_path.to_path_buf())
    }
}

/// Mix two files on disk and write the result at 44.1kHz
pub fn merge_speech_with_music(
    speech_path: &Path,
    music_path: &Path,
    output_path: &Path,
    speech_volume: f32,
    music_volume: f32,
) -> Result<PathBuf> {
    TrackComposer::new(WavCodec).merge_speech_with_music(
        &speech_path.display().to_string(),
        &music_path.display().to_string(),
        output_path,
        speech_volume,
        music_volume,
    )
}

/// Write `buffer` to `output_path` at 44.1kHz, 16-bit
pub fn save_audio_clip(buffer: &AudioBuffer, output_path: &Path) -> Result<()> {
    TrackComposer::new(WavCodec).save(buffer, output_path)
}
