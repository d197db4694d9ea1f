//! Emotion style registry: display colour, glyph and ambient filter per category.

use crate::filter::{FilterOp, VideoFilter};
use crate::types::EmotionCategory;
use serde::{Serialize, Serializer};
use std::fmt;

/// Opaque RGB display colour, rendered as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::hex(0x000000);
    pub const RED: Color = Color::hex(0xFF0000);
    /// Default detection box colour.
    pub const BOX_BLUE: Color = Color::hex(0x0000FF);

    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> Rgba {
        Rgba { color: self, alpha }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Colour with alpha, rendered as `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub color: Color,
    pub alpha: u8,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02X}", self.color, self.alpha)
    }
}

/// Display attributes for one category. Immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleEntry {
    pub color: Color,
    pub glyph: &'static str,
    pub filter: VideoFilter,
}

// Panel tint and glow alphas derived from a face colour.
pub const PANEL_TINT_ALPHA: u8 = 0x22;
pub const GLOW_ALPHA: u8 = 0x55;

const HAPPY_OPS: &[FilterOp] = &[FilterOp::Brightness(1.2), FilterOp::Saturate(1.4)];
const ANGRY_OPS: &[FilterOp] = &[FilterOp::Contrast(1.3), FilterOp::HueRotate(-15.0)];
const SAD_OPS: &[FilterOp] = &[FilterOp::Grayscale(0.6)];
const SURPRISED_OPS: &[FilterOp] = &[FilterOp::Brightness(1.1), FilterOp::Contrast(1.2)];
const DISGUSTED_OPS: &[FilterOp] = &[FilterOp::HueRotate(80.0)];
const FEARFUL_OPS: &[FilterOp] = &[FilterOp::Sepia(0.3)];

static HAPPY: StyleEntry = StyleEntry {
    color: Color::hex(0xFFD700),
    glyph: "😄",
    filter: VideoFilter::new(HAPPY_OPS),
};
static ANGRY: StyleEntry = StyleEntry {
    color: Color::hex(0xFF3B3B),
    glyph: "😡",
    filter: VideoFilter::new(ANGRY_OPS),
};
static SAD: StyleEntry = StyleEntry {
    color: Color::hex(0x3B82F6),
    glyph: "😢",
    filter: VideoFilter::new(SAD_OPS),
};
static SURPRISED: StyleEntry = StyleEntry {
    color: Color::hex(0xA855F7),
    glyph: "😲",
    filter: VideoFilter::new(SURPRISED_OPS),
};
static DISGUSTED: StyleEntry = StyleEntry {
    color: Color::hex(0x22C55E),
    glyph: "🤢",
    filter: VideoFilter::new(DISGUSTED_OPS),
};
static FEARFUL: StyleEntry = StyleEntry {
    color: Color::hex(0x8B5CF6),
    glyph: "😨",
    filter: VideoFilter::new(FEARFUL_OPS),
};
static NEUTRAL: StyleEntry = StyleEntry {
    color: Color::hex(0xAAAAAA),
    glyph: "😐",
    filter: VideoFilter::NEUTRAL,
};

/// Style for a category. Total over the closed category set.
pub fn style_for(category: EmotionCategory) -> &'static StyleEntry {
    match category {
        EmotionCategory::Happy => &HAPPY,
        EmotionCategory::Angry => &ANGRY,
        EmotionCategory::Sad => &SAD,
        EmotionCategory::Surprised => &SURPRISED,
        EmotionCategory::Disgusted => &DISGUSTED,
        EmotionCategory::Fearful => &FEARFUL,
        EmotionCategory::Neutral => &NEUTRAL,
    }
}

/// All registry entries in declaration order.
pub fn registry() -> impl Iterator<Item = (EmotionCategory, &'static StyleEntry)> {
    EmotionCategory::ALL.into_iter().map(|c| (c, style_for(c)))
}
