//! In-memory surfaces that record every command, for tests.

use crate::filter::VideoFilter;
use crate::frame::Frame;
use crate::style::{Color, Rgba};
use crate::surface::{
    ChartWidget, DrawSurface, StatusLine, StatusSurface, SurfaceError, TextPass, TextStyle,
};
use crate::types::{BoundingBox, EmotionCategory};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Box { bbox: BoundingBox, caption: String },
    Text { text: String, origin: (f32, f32), pass: TextPass, color: Color },
    Filter(VideoFilter),
}

/// Canvas that logs commands since the last clear.
#[derive(Debug)]
pub struct RecordingCanvas {
    size: (u32, u32),
    commands: Vec<DrawCommand>,
    ambient: VideoFilter,
    presented: Vec<u64>,
    /// Fail the next `draw_box` call once.
    pub fail_next_draw: bool,
    /// Fail every `present` while set.
    pub fail_present: bool,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            commands: Vec::new(),
            ambient: VideoFilter::NEUTRAL,
            presented: Vec::new(),
            fail_next_draw: false,
            fail_present: false,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Box { bbox, .. } => Some(*bbox),
                _ => None,
            })
            .collect()
    }

    pub fn ambient(&self) -> VideoFilter {
        self.ambient
    }

    /// Sequence numbers of presented frames.
    pub fn presented(&self) -> &[u64] {
        &self.presented
    }
}

impl DrawSurface for RecordingCanvas {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
        Ok(())
    }

    fn draw_box(&mut self, bbox: &BoundingBox, caption: &str) -> Result<(), SurfaceError> {
        if std::mem::take(&mut self.fail_next_draw) {
            return Err(SurfaceError::Draw("injected failure".into()));
        }
        self.commands.push(DrawCommand::Box { bbox: *bbox, caption: caption.to_string() });
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        origin: (f32, f32),
        pass: TextPass,
        style: &TextStyle,
    ) -> Result<(), SurfaceError> {
        let color = match pass {
            TextPass::Stroke => style.outline,
            TextPass::Fill => style.fill,
        };
        self.commands.push(DrawCommand::Text { text: text.to_string(), origin, pass, color });
        Ok(())
    }

    fn set_ambient_filter(&mut self, filter: VideoFilter) -> Result<(), SurfaceError> {
        self.ambient = filter;
        self.commands.push(DrawCommand::Filter(filter));
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        if self.fail_present {
            return Err(SurfaceError::Draw("injected present failure".into()));
        }
        self.presented.push(frame.sequence);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingStatus {
    lines: Vec<StatusLine>,
    tint: Option<Rgba>,
    glow: Option<Rgba>,
    shown_tint: Option<Rgba>,
    pub replacements: usize,
    /// Fail every `replace` while set.
    pub fail_replace: bool,
}

impl RecordingStatus {
    pub fn lines(&self) -> &[StatusLine] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tint(&self) -> Option<Rgba> {
        self.tint
    }

    pub fn glow(&self) -> Option<Rgba> {
        self.glow
    }

    /// Tint in effect when the current lines were shown.
    pub fn shown_tint(&self) -> Option<Rgba> {
        self.shown_tint
    }
}

impl StatusSurface for RecordingStatus {
    fn replace(&mut self, lines: &[StatusLine]) -> Result<(), SurfaceError> {
        if self.fail_replace {
            return Err(SurfaceError::Status("injected failure".into()));
        }
        self.lines = lines.to_vec();
        self.shown_tint = self.tint;
        self.replacements += 1;
        Ok(())
    }

    fn set_panel_tint(&mut self, tint: Rgba) -> Result<(), SurfaceError> {
        self.tint = Some(tint);
        Ok(())
    }

    fn set_glow(&mut self, glow: Rgba) -> Result<(), SurfaceError> {
        self.glow = Some(glow);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingChart {
    series: Vec<(EmotionCategory, Color)>,
    counts: Vec<(EmotionCategory, u64)>,
    pub redraws: usize,
    /// Fail every redraw while set.
    pub fail_redraw: bool,
}

impl RecordingChart {
    pub fn series(&self) -> &[(EmotionCategory, Color)] {
        &self.series
    }

    pub fn counts(&self) -> &[(EmotionCategory, u64)] {
        &self.counts
    }
}

impl ChartWidget for RecordingChart {
    fn set_series(&mut self, series: &[(EmotionCategory, Color)]) -> Result<(), SurfaceError> {
        self.series = series.to_vec();
        Ok(())
    }

    fn set_counts(&mut self, counts: &[(EmotionCategory, u64)]) {
        self.counts = counts.to_vec();
    }

    fn redraw(&mut self) -> Result<(), SurfaceError> {
        if self.fail_redraw {
            return Err(SurfaceError::Chart("injected failure".into()));
        }
        self.redraws += 1;
        Ok(())
    }
}
