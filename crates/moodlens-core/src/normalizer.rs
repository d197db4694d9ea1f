//! Detection normalizer: reduce each raw detection to its dominant category.

use crate::types::{NormalizedFace, RawDetection};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("detection {index} has no finite expression scores")]
    NoScores { index: usize },
}

/// Pick the highest-confidence category of one detection.
///
/// Scores are compared as-is. Equal top scores resolve to the category
/// declared first in [`EmotionCategory`](crate::EmotionCategory); NaN
/// scores never win.
pub fn normalize(detection: &RawDetection) -> Option<NormalizedFace> {
    let mut best = None;
    for (&category, &score) in &detection.expressions {
        if !score.is_finite() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((category, score)),
        }
    }

    best.map(|(category, confidence)| NormalizedFace {
        bbox: detection.bbox,
        category,
        confidence,
    })
}

/// Normalize every detection of a frame, preserving detection order.
///
/// Fails on the first detection with an empty (or all-NaN) score mapping;
/// that is a classifier contract violation and aborts the frame.
pub fn normalize_all(detections: &[RawDetection]) -> Result<Vec<NormalizedFace>, NormalizeError> {
    detections
        .iter()
        .enumerate()
        .map(|(index, det)| normalize(det).ok_or(NormalizeError::NoScores { index }))
        .collect()
}
