//! Processing core
//!
//! Actions, the ordered pipeline that applies them, the loudness convergence
//! loop behind looping, and the mixer that sums finished clips.

pub mod action;
pub mod gain;
pub mod looping;
pub mod loudness;
pub mod mixer;
pub mod pipeline;

pub use action::{parse_actions, Action, ActionDescriptor};
pub use gain::{apply_gain, normalize, scale_volume, NORMALIZED_PEAK};
pub use looping::{loop_to_duration, LoopPlan, LEAD_IN_FRACTION};
pub use loudness::{converge, Converged, LoudnessBand, DEFAULT_MAX_ITERATIONS};
pub use mixer::{merge, merge_with_observer};
pub use pipeline::{apply_action, EffectPipeline};
