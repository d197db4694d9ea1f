//! Contracts for the display collaborators the pipeline draws onto.
//!
//! The pipeline never owns a window or a chart library; it issues
//! commands against these traits once per cycle.

use crate::filter::VideoFilter;
use crate::frame::Frame;
use crate::style::{Color, Rgba};
use crate::types::{BoundingBox, EmotionCategory};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("draw failed: {0}")]
    Draw(String),
    #[error("status update failed: {0}")]
    Status(String),
    #[error("chart redraw failed: {0}")]
    Chart(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
}

/// Which pass of a two-pass text draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPass {
    /// Outline stroke, drawn first for legibility on any background.
    Stroke,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_px: u32,
    pub fill: Color,
    pub outline: Color,
    pub line_width: f32,
}

/// 2D overlay surface sized to the video's native resolution.
pub trait DrawSurface {
    /// Surface size in pixels (width, height).
    fn size(&self) -> (u32, u32);

    /// Remove every annotation drawn so far.
    fn clear(&mut self) -> Result<(), SurfaceError>;

    /// Outline a detection box, captioned with the detector score.
    fn draw_box(&mut self, bbox: &BoundingBox, caption: &str) -> Result<(), SurfaceError>;

    /// Draw `text` with its baseline origin at `origin`.
    fn draw_text(
        &mut self,
        text: &str,
        origin: (f32, f32),
        pass: TextPass,
        style: &TextStyle,
    ) -> Result<(), SurfaceError>;

    /// Replace the global filter applied to the raw video display.
    fn set_ambient_filter(&mut self, filter: VideoFilter) -> Result<(), SurfaceError>;

    /// Hand the frame that the current annotations belong to to the host.
    fn present(&mut self, _frame: &Frame) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// A run of status text with optional inline colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSpan {
    pub text: String,
    pub color: Option<Color>,
    pub bold: bool,
}

impl StatusSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), color: None, bold: false }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self { text: text.into(), color: None, bold: true }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self { text: text.into(), color: Some(color), bold: false }
    }
}

pub type StatusLine = Vec<StatusSpan>;

/// Text panel showing the per-frame summary.
pub trait StatusSurface {
    /// Replace the whole panel content.
    fn replace(&mut self, lines: &[StatusLine]) -> Result<(), SurfaceError>;
    fn set_panel_tint(&mut self, tint: Rgba) -> Result<(), SurfaceError>;
    fn set_glow(&mut self, glow: Rgba) -> Result<(), SurfaceError>;
}

/// Aggregate bar chart. Owns its own rendering.
pub trait ChartWidget {
    /// Declare the bars once, in display order, before any counts arrive.
    fn set_series(&mut self, series: &[(EmotionCategory, Color)]) -> Result<(), SurfaceError>;
    fn set_counts(&mut self, counts: &[(EmotionCategory, u64)]);
    fn redraw(&mut self) -> Result<(), SurfaceError>;
}
