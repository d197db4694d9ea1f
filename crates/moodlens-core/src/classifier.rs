//! Face/expression classifier contract and a scripted replay implementation.

use crate::frame::Frame;
use crate::types::RawDetection;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// Tiny face detector defaults.
const DEFAULT_INPUT_SIZE: u32 = 160;
const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classification failed: {0}")]
    Failed(String),
    #[error("detection script exhausted")]
    Exhausted,
    #[error("detection script line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-call options passed through to the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectOptions {
    /// Side length the detector downsizes the frame to. Smaller is faster.
    pub input_size: u32,
    /// Minimum face detector score to report a face.
    pub score_threshold: f32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// External face + expression classifier.
///
/// Returns every face found in `frame`, in frame pixel coordinates.
#[allow(async_fn_in_trait)]
pub trait Classifier {
    async fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectOptions,
    ) -> Result<Vec<RawDetection>, ClassifierError>;
}

/// One scripted classifier response.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Detections(Vec<RawDetection>),
    Failure { error: String },
}

/// Replays classifier output from a JSON-lines script, one line per call.
///
/// Each line is either an array of detections or `{"error": "..."}`.
/// Blank lines and lines starting with `#` are skipped.
#[derive(Debug, Clone)]
pub struct ScriptedClassifier {
    script: Vec<ScriptStep>,
    pending: VecDeque<usize>,
    looping: bool,
    latency: Duration,
    calls: u64,
}

impl ScriptedClassifier {
    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        let pending = (0..steps.len()).collect();
        Self {
            script: steps,
            pending,
            looping: false,
            latency: Duration::ZERO,
            calls: 0,
        }
    }

    /// Parse a JSON-lines script.
    pub fn parse(src: &str) -> Result<Self, ClassifierError> {
        let mut steps = Vec::new();
        for (i, line) in src.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let step = serde_json::from_str::<ScriptStep>(line)
                .map_err(|source| ClassifierError::Malformed { line: i + 1, source })?;
            steps.push(step);
        }
        Ok(Self::from_steps(steps))
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let src = std::fs::read_to_string(path)?;
        let classifier = Self::parse(&src)?;
        tracing::info!(path = %path.display(), steps = classifier.script.len(), "detection script loaded");
        Ok(classifier)
    }

    /// Restart from the first step once the script runs out.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Simulated inference time per call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Steps left before the script is exhausted (ignores looping).
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Classifier for ScriptedClassifier {
    async fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectOptions,
    ) -> Result<Vec<RawDetection>, ClassifierError> {
        self.calls += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.pending.is_empty() && self.looping && !self.script.is_empty() {
            self.pending.extend(0..self.script.len());
        }
        let idx = self.pending.pop_front().ok_or(ClassifierError::Exhausted)?;

        tracing::trace!(seq = frame.sequence, step = idx, "scripted detect");
        match &self.script[idx] {
            ScriptStep::Failure { error } => Err(ClassifierError::Failed(error.clone())),
            ScriptStep::Detections(dets) => Ok(dets
                .iter()
                .filter(|d| d.bbox.score >= options.score_threshold)
                .cloned()
                .collect()),
        }
    }
}
