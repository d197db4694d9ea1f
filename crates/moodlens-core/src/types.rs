use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of expression categories the classifier reports.
///
/// Declaration order is significant: it is the chart order, the histogram
/// snapshot order, and the tie-break order for equal confidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionCategory {
    Happy,
    Angry,
    Sad,
    Surprised,
    Disgusted,
    Fearful,
    Neutral,
}

impl EmotionCategory {
    pub const COUNT: usize = 7;

    /// Every category, in declaration order.
    pub const ALL: [EmotionCategory; Self::COUNT] = [
        EmotionCategory::Happy,
        EmotionCategory::Angry,
        EmotionCategory::Sad,
        EmotionCategory::Surprised,
        EmotionCategory::Disgusted,
        EmotionCategory::Fearful,
        EmotionCategory::Neutral,
    ];

    /// Position in declaration order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionCategory::Happy => "happy",
            EmotionCategory::Angry => "angry",
            EmotionCategory::Sad => "sad",
            EmotionCategory::Surprised => "surprised",
            EmotionCategory::Disgusted => "disgusted",
            EmotionCategory::Fearful => "fearful",
            EmotionCategory::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown emotion category: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for EmotionCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmotionCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Face bounding box in pixel coordinates, with the detector's own score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Face detector score in [0, 1] (not the expression confidence).
    #[serde(default = "full_score")]
    pub score: f32,
}

fn full_score() -> f32 {
    1.0
}

impl BoundingBox {
    /// Map this box from a `from` (width, height) space into a `to` space.
    pub fn rescale(&self, from: (u32, u32), to: (u32, u32)) -> BoundingBox {
        if from == to || from.0 == 0 || from.1 == 0 {
            return *self;
        }
        let sx = to.0 as f32 / from.0 as f32;
        let sy = to.1 as f32 / from.1 as f32;
        BoundingBox {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
            score: self.score,
        }
    }
}

/// Per-category expression confidences for one detection.
///
/// Keyed by [`EmotionCategory`], so iteration follows declaration order
/// no matter how the classifier produced the mapping.
pub type Expressions = BTreeMap<EmotionCategory, f32>;

/// One face as returned by the external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub expressions: Expressions,
}

/// A detection reduced to its single dominant category. Lives for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedFace {
    pub bbox: BoundingBox,
    pub category: EmotionCategory,
    pub confidence: f32,
}

impl NormalizedFace {
    /// Confidence rounded to a whole percentage.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round().max(0.0) as u32
    }
}
