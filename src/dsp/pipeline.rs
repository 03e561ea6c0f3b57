//! Effect pipeline
//!
//! Actions run strictly in the order given; nothing is reordered or
//! deduplicated. Parameters are validated when the pipeline is built, so
//! applying it can only fail through loudness convergence.

use std::fmt;
use std::sync::Arc;

use log::debug;

use super::action::{parse_actions, Action, ActionDescriptor};
use super::gain::{normalize, scale_volume};
use super::looping::{loop_to_duration, LoopPlan};
use super::loudness::{converge, LoudnessBand, DEFAULT_MAX_ITERATIONS};
use crate::engine::AudioBuffer;
use crate::error::Result;
use crate::events::{ProgressEvent, ProgressObserver, SharedObserver, TracingObserver};

/// An ordered, validated list of actions plus the settings they run with
#[derive(Clone)]
pub struct EffectPipeline {
    actions: Vec<Action>,
    band: LoudnessBand,
    max_iterations: usize,
    observer: SharedObserver,
}

impl EffectPipeline {
    /// Build a pipeline, rejecting any action with an invalid parameter
    pub fn new(actions: Vec<Action>) -> Result<Self> {
        for action in &actions {
            action.validate()?;
        }
        Ok(Self {
            actions,
            band: LoudnessBand::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Build a pipeline from serialized action descriptors
    pub fn from_descriptors(descriptors: &[ActionDescriptor]) -> Result<Self> {
        Self::new(parse_actions(descriptors)?)
    }

    /// Use a different loudness band for loop actions
    pub fn with_band(mut self, band: LoudnessBand) -> Result<Self> {
        band.validate()?;
        self.band = band;
        Ok(self)
    }

    /// Cap the convergence loop at `max_iterations` attempts
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Report progress to `observer` instead of `tracing`
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn band(&self) -> &LoudnessBand {
        &self.band
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run every action over `buffer` in order
    ///
    /// # Errors
    /// `ConvergenceFailure` if a loop action cannot bring the peak into band.
    pub fn apply(&self, buffer: AudioBuffer) -> Result<AudioBuffer> {
        self.actions.iter().try_fold(buffer, |buffer, action| {
            apply_action(
                buffer,
                action,
                &self.band,
                self.max_iterations,
                self.observer.as_ref(),
            )
        })
    }
}

impl fmt::Debug for EffectPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectPipeline")
            .field("actions", &self.actions)
            .field("band", &self.band)
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

/// Apply a single action
pub fn apply_action(
    buffer: AudioBuffer,
    action: &Action,
    band: &LoudnessBand,
    max_iterations: usize,
    observer: &dyn ProgressObserver,
) -> Result<AudioBuffer> {
    let processed = match action {
        Action::Unknown { tag } => {
            debug!("Skipping unrecognized action '{}'", tag);
            observer.on_event(&ProgressEvent::ActionSkipped { tag: tag.clone() });
            buffer
        }
        Action::Normalize => {
            started(observer, action);
            normalize(buffer)
        }
        Action::ScaleVolume { factor } => {
            started(observer, action);
            scale_volume(buffer, *factor)
        }
        Action::LoopToDuration { target_secs } => {
            started(observer, action);
            let plan = LoopPlan::for_source(&buffer, *target_secs);
            let looped = loop_to_duration(buffer, *target_secs);
            observer.on_event(&ProgressEvent::Looped {
                source_secs: plan.source_secs,
                trim_start_secs: plan.trim_start_secs,
                target_secs: plan.target_secs,
            });
            converge(looped, band, max_iterations, observer)?.buffer
        }
    };

    Ok(processed)
}

fn started(observer: &dyn ProgressObserver, action: &Action) {
    observer.on_event(&ProgressEvent::ActionStarted {
        action: action.to_string(),
    });
}
