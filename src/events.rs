//! Progress reporting
//!
//! Processing stages never print. They report structured [`ProgressEvent`]s to
//! a [`ProgressObserver`]; the default observer forwards them to `tracing`.

use std::sync::{Arc, Mutex};

/// A single step of pipeline progress
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A source was decoded
    AssetLoaded { uri: String, duration_secs: f64 },
    /// A source failed to decode
    AssetLoadFailed { uri: String, reason: String },
    /// A pipeline action is about to run
    ActionStarted { action: String },
    /// An unrecognized action tag was passed through
    ActionSkipped { tag: String },
    /// The loop action trimmed the lead-in and repeated to the target
    Looped {
        source_secs: f64,
        trim_start_secs: f64,
        target_secs: f64,
    },
    /// Convergence found the peak above the band
    VolumeTooHigh { detected: f32, iteration: usize },
    /// Convergence found the peak below the band
    VolumeTooLow { detected: f32, iteration: usize },
    /// Peak amplitude settled inside the band
    VolumeConverged {
        peak: f32,
        volume_factor: f64,
        iterations: usize,
    },
    /// Buffers are being summed into a composite
    Merging { clips: usize },
    /// Merge was called with nothing to merge
    NothingToMerge,
    /// A buffer is being written to disk
    Saving { path: String, sample_rate: u32 },
}

/// Receives progress events from processing stages
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Shared observer handle passed between stages
pub type SharedObserver = Arc<dyn ProgressObserver>;

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Forwards events to `tracing` with structured fields
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::AssetLoaded { uri, duration_secs } => {
                tracing::info!(uri = %uri, duration_secs, "loaded audio source")
            }
            ProgressEvent::AssetLoadFailed { uri, reason } => {
                tracing::error!(uri = %uri, reason = %reason, "failed to load audio source")
            }
            ProgressEvent::ActionStarted { action } => {
                tracing::debug!(action = %action, "applying action")
            }
            ProgressEvent::ActionSkipped { tag } => {
                tracing::debug!(tag = %tag, "skipping unrecognized action")
            }
            ProgressEvent::Looped {
                source_secs,
                trim_start_secs,
                target_secs,
            } => tracing::info!(
                source_secs,
                trim_start_secs,
                target_secs,
                "looped music to target duration"
            ),
            ProgressEvent::VolumeTooHigh {
                detected,
                iteration,
            } => tracing::debug!(detected, iteration, "volume too high, reducing"),
            ProgressEvent::VolumeTooLow {
                detected,
                iteration,
            } => tracing::debug!(detected, iteration, "volume too low, increasing"),
            ProgressEvent::VolumeConverged {
                peak,
                volume_factor,
                iterations,
            } => tracing::info!(
                peak,
                volume_factor,
                iterations,
                "volume within acceptable range"
            ),
            ProgressEvent::Merging { clips } => tracing::info!(clips, "merging audio clips"),
            ProgressEvent::NothingToMerge => tracing::warn!("no audio clips to merge"),
            ProgressEvent::Saving { path, sample_rate } => {
                tracing::info!(path = %path, sample_rate, "saving audio clip")
            }
        }
    }
}

/// Keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
