//! Integration Tests
//!
//! End-to-end tests for the clipforge pipeline, composer and file output.

use std::sync::Arc;

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use clipforge::compose::AudioAsset;
use clipforge::dsp::{loop_to_duration, Action, ActionDescriptor, EffectPipeline, LoudnessBand};
use clipforge::engine::{
    export_audio, generate_test_tone, import_audio, AudioBuffer, ExportFormat, MemoryCodec,
};
use clipforge::events::{ProgressEvent, RecordingObserver};
use clipforge::{merge_speech_with_music, ClipError, MixSettings, TrackComposer};

/// Helper: stereo bed whose left and right channels differ
fn stereo_bed(duration_secs: f64, sample_rate: u32) -> AudioBuffer {
    let left = generate_test_tone(110.0, 0.9, duration_secs, sample_rate);
    let right = generate_test_tone(165.0, 0.6, duration_secs, sample_rate);
    AudioBuffer::from_channels(
        vec![left.samples[0].clone(), right.samples[0].clone()],
        sample_rate,
    )
    .unwrap()
}

// === Asset Rendering ===

#[test]
fn test_asset_descriptor_renders_in_order() {
    let codec = MemoryCodec::new().with_source("bed", stereo_bed(20.0, 2000));
    let composer = TrackComposer::new(codec);

    let asset = AudioAsset::from_json(
        r#"{
            "parameters": { "url": "bed" },
            "actions": [
                { "type": "normalize_music" },
                { "type": "crossfade", "param": 1.0 },
                { "type": "loop_background_music", "param": 8.0 },
                { "type": "volume_percentage", "param": 1.5 }
            ]
        }"#,
    )
    .unwrap();

    let rendered = composer.render_asset(&asset).unwrap();

    assert_eq!(rendered.channels(), 2);
    assert_relative_eq!(rendered.duration_secs(), 8.0, epsilon = 1e-9);
    // Converged into [0.1, 0.3] by the loop, then raised by 150%
    let peak = rendered.peak_amplitude();
    assert!((0.15..=0.45).contains(&peak), "peak {}", peak);
}

#[test]
fn test_asset_with_missing_source_fails_to_load() {
    let composer = TrackComposer::new(MemoryCodec::new());
    let asset = AudioAsset::new("missing", vec![Action::Normalize]);

    let err = composer.render_asset(&asset).unwrap_err();
    assert!(err.is_load_error());
}

// === Composition ===

#[test]
fn test_scenario_speech_12s_music_40s() {
    let rate = 1000;
    let music = stereo_bed(40.0, rate);
    let codec = MemoryCodec::new()
        .with_source("speech", generate_test_tone(80.0, 0.3, 12.0, rate))
        .with_source("music", music.clone());
    let observer = Arc::new(RecordingObserver::new());
    let composer = TrackComposer::new(codec).with_observer(observer.clone());

    let mixed = composer.compose("speech", "music", 1.0, 0.5).unwrap();
    assert_relative_eq!(mixed.duration_secs(), 12.0, epsilon = 1e-9);

    let looped: Vec<_> = observer
        .events()
        .into_iter()
        .filter(|e| matches!(e, ProgressEvent::Looped { .. }))
        .collect();
    assert_eq!(
        looped,
        vec![ProgressEvent::Looped {
            source_secs: 40.0,
            trim_start_secs: 40.0 * 0.15,
            target_secs: 12.0,
        }]
    );

    // The looped segment starts 6.0s into the source
    let segment = loop_to_duration(music.clone(), 12.0);
    assert_relative_eq!(segment.duration_secs(), 12.0, epsilon = 1e-9);
    assert_eq!(segment.get_sample(0, 0), music.get_sample(0, 6000));
    assert_eq!(segment.get_sample(1, 100), music.get_sample(1, 6100));
}

#[test]
fn test_compose_reports_convergence_failure() {
    let settings = MixSettings {
        band: LoudnessBand::new(0.2, 0.2, 0.5).unwrap(),
        max_iterations: 4,
        ..MixSettings::default()
    };
    let codec = MemoryCodec::new()
        .with_source("speech", generate_test_tone(80.0, 0.3, 2.0, 1000))
        .with_source("music", generate_test_tone(40.0, 0.8, 5.0, 1000));
    let composer = TrackComposer::new(codec).with_settings(settings).unwrap();

    let err = composer.compose_default("speech", "music").unwrap_err();
    assert!(matches!(err, ClipError::ConvergenceFailure { iterations: 4, .. }));
}

#[test]
fn test_compose_default_uses_settings_volumes() {
    let settings = MixSettings {
        speech_volume: 0.5,
        ..MixSettings::default()
    };
    let codec = MemoryCodec::new()
        .with_source("speech", generate_test_tone(80.0, 0.3, 2.0, 1000))
        .with_source("music", AudioBuffer::new(5000, Default::default(), 1000));
    let composer = TrackComposer::new(codec).with_settings(settings).unwrap();

    // Silent music contributes nothing, so the mix peak is the speech peak
    let mixed = composer.compose_default("speech", "music").unwrap();
    assert_relative_eq!(mixed.peak_amplitude(), 0.5, epsilon = 1e-5);
}

// === File Round Trips ===

#[test]
fn test_merge_speech_with_music_on_disk() {
    let dir = tempdir().unwrap();
    let speech_path = dir.path().join("speech.wav");
    let music_path = dir.path().join("music.wav");
    let output_path = dir.path().join("mix.wav");

    let speech = generate_test_tone(300.0, 0.5, 3.0, 22050);
    export_audio(&speech, &speech_path, &ExportFormat::new(22050, 16)).unwrap();
    export_audio(&stereo_bed(7.0, 48000), &music_path, &ExportFormat::new(48000, 24)).unwrap();

    let written = merge_speech_with_music(&speech_path, &music_path, &output_path, 1.0, 0.5).unwrap();
    assert_eq!(written, output_path);

    let mixed = import_audio(&output_path).unwrap();
    assert_eq!(mixed.sample_rate, 44100);
    assert_eq!(mixed.channels(), 2);
    assert_relative_eq!(mixed.duration_secs(), 3.0, epsilon = 1e-3);
}

#[test]
fn test_merge_flac_speech_over_wav_music() {
    let dir = tempdir().unwrap();
    let speech_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("tone.flac");
    let music_path = dir.path().join("music.wav");
    let output_path = dir.path().join("mix.wav");
    export_audio(&stereo_bed(2.0, 8000), &music_path, &ExportFormat::new(8000, 16)).unwrap();

    merge_speech_with_music(&speech_path, &music_path, &output_path, 1.0, 0.5).unwrap();

    let mixed = import_audio(&output_path).unwrap();
    assert_eq!(mixed.sample_rate, 44100);
    assert_eq!(mixed.channels(), 2);
    assert_relative_eq!(mixed.duration_secs(), 0.2, epsilon = 1e-3);
}

#[test]
fn test_merge_with_missing_speech_writes_nothing() {
    let dir = tempdir().unwrap();
    let music_path = dir.path().join("music.wav");
    let output_path = dir.path().join("mix.wav");
    export_audio(&stereo_bed(2.0, 8000), &music_path, &ExportFormat::new(8000, 16)).unwrap();

    let err = merge_speech_with_music(
        &dir.path().join("absent.wav"),
        &music_path,
        &output_path,
        1.0,
        0.5,
    )
    .unwrap_err();

    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    assert!(!output_path.exists());
}

#[test]
fn test_pipeline_from_descriptors_matches_typed_actions() {
    let descriptors: Vec<ActionDescriptor> = serde_json::from_str(
        r#"[{ "type": "normalize_music" }, { "type": "volume_percentage", "param": 0.25 }]"#,
    )
    .unwrap();
    let from_json = EffectPipeline::from_descriptors(&descriptors).unwrap();
    let typed = EffectPipeline::new(vec![Action::Normalize, Action::ScaleVolume { factor: 0.25 }])
        .unwrap();

    assert_eq!(from_json.actions(), typed.actions());

    let tone = generate_test_tone(100.0, 0.7, 1.0, 4000);
    assert_eq!(
        from_json.apply(tone.clone()).unwrap(),
        typed.apply(tone).unwrap()
    );
}
