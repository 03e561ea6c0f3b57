//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;

use crate::compose::{AudioAsset, TrackComposer};
use crate::config::MixSettings;
use crate::engine::{AudioCodec, WavCodec};
use crate::error::{ClipError, Result};

/// Outcome of a batch render
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Load settings from `config`, or fall back to defaults.
pub fn load_settings(config: Option<&Path>) -> Result<MixSettings> {
    match config {
        Some(path) => MixSettings::load(path),
        None => Ok(MixSettings::default()),
    }
}

/// Mix speech over a looped music bed.
pub fn merge(
    settings: MixSettings,
    speech: &Path,
    music: &Path,
    output: &Path,
    speech_volume: Option<f32>,
    music_volume: Option<f32>,
) -> Result<()> {
    info!(
        "Merging {} with {} into {}",
        speech.display(),
        music.display(),
        output.display()
    );

    let speech_volume = speech_volume.unwrap_or(settings.speech_volume);
    let music_volume = music_volume.unwrap_or(settings.music_volume);
    let composer = TrackComposer::new(WavCodec).with_settings(settings)?;

    let written = composer.merge_speech_with_music(
        &speech.display().to_string(),
        &music.display().to_string(),
        output,
        speech_volume,
        music_volume,
    )?;

    println!("Mix written: {}", written.display());
    Ok(())
}

/// Render one asset descriptor to a WAV file.
pub fn render(settings: MixSettings, asset_path: &Path, output: &Path) -> Result<()> {
    info!("Rendering asset: {}", asset_path.display());

    let composer = TrackComposer::new(WavCodec).with_settings(settings)?;
    render_one(&composer, asset_path, output)?;

    println!("Asset rendered: {}", output.display());
    Ok(())
}

/// Render every `*.json` descriptor under `dir` into `output_dir`.
///
/// Outputs mirror the descriptor's location relative to `dir`, so
/// `dir/a/intro.json` renders to `output_dir/a/intro.wav`. A failing asset or
/// an unreadable directory entry is recorded and the batch carries on.
pub fn batch(settings: MixSettings, dir: &Path, output_dir: &Path) -> Result<BatchReport> {
    info!("Batch rendering descriptors under: {}", dir.display());

    let composer = TrackComposer::new(WavCodec).with_settings(settings)?;
    fs::create_dir_all(output_dir)?;

    let mut report = BatchReport::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                warn!("Cannot read {}: {}", path.display(), err);
                report.failed.push((path, err.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_descriptor(entry.path()) {
            continue;
        }

        let descriptor = entry.into_path();
        let relative = descriptor.strip_prefix(dir).unwrap_or(descriptor.as_path());
        let output = output_dir.join(relative).with_extension("wav");

        let rendered = output
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .map_err(ClipError::from)
            .and_then(|()| render_one(&composer, &descriptor, &output));

        match rendered {
            Ok(()) => report.rendered.push(output),
            Err(err) => {
                warn!("Skipping {}: {}", descriptor.display(), err);
                report.failed.push((descriptor, err.to_string()));
            }
        }
    }

    println!(
        "Rendered {} asset(s), {} failed",
        report.rendered.len(),
        report.failed.len()
    );
    for (path, reason) in &report.failed {
        println!("  {}: {}", path.display(), reason);
    }

    Ok(report)
}

/// Print basic facts about an audio file.
pub fn inspect(path: &Path) -> Result<()> {
    info!("Inspecting: {}", path.display());

    let buffer = WavCodec.decode(&path.display().to_string())?;

    println!("File: {}", path.display());
    println!("Duration: {:.3}s", buffer.duration_secs());
    println!("Sample rate: {} Hz", buffer.sample_rate);
    println!("Channels: {}", buffer.channels());
    println!(
        "Peak: {:.4} ({:.2} dBFS)",
        buffer.peak_amplitude(),
        buffer.peak_db()
    );

    Ok(())
}

fn is_descriptor(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn render_one<C: AudioCodec>(
    composer: &TrackComposer<C>,
    asset_path: &Path,
    output: &Path,
) -> Result<()> {
    let asset = AudioAsset::from_file(asset_path)?;
    let buffer = composer.render_asset(&asset)?;
    composer.save(&buffer, output)
}
