//! moodlens-core — Frame-to-annotation pipeline for live expression detection.
//!
//! Turns per-frame classifier output into overlay annotations, a status
//! summary and a running per-emotion histogram, scheduled once per
//! display tick.

pub mod canvas;
pub mod classifier;
pub mod filter;
pub mod frame;
pub mod histogram;
pub mod normalizer;
pub mod overlay;
pub mod scheduler;
pub mod status;
pub mod style;
pub mod surface;
pub mod terminal;
pub mod types;

#[cfg(test)]
pub(crate) mod recording;

pub use classifier::{Classifier, ClassifierError, DetectOptions, ScriptedClassifier};
pub use frame::Frame;
pub use histogram::Histogram;
pub use scheduler::{FrameScheduler, PipelineState, SchedulerConfig};
pub use style::style_for;
pub use types::{BoundingBox, EmotionCategory, NormalizedFace, RawDetection};
