//! Text-mode status panel and bar chart.

use crate::style::{style_for, Color, Rgba};
use crate::surface::{ChartWidget, StatusLine, StatusSurface, SurfaceError};
use crate::types::EmotionCategory;
use std::fmt::Write as _;
use std::io::Write;

const BAR_WIDTH: u64 = 40;
const RESET: &str = "\x1b[0m";

fn fg(color: Color) -> String {
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

/// Status panel written to a terminal stream.
///
/// Identical consecutive reports are written once, so a steady scene does
/// not flood the output at display rate.
pub struct TerminalStatus<W: Write> {
    out: W,
    ansi: bool,
    last: String,
    tint: Option<Rgba>,
    glow: Option<Rgba>,
}

impl<W: Write> TerminalStatus<W> {
    pub fn new(out: W, ansi: bool) -> Self {
        Self { out, ansi, last: String::new(), tint: None, glow: None }
    }

    pub fn tint(&self) -> Option<Rgba> {
        self.tint
    }

    pub fn glow(&self) -> Option<Rgba> {
        self.glow
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&self, lines: &[StatusLine]) -> String {
        let mut buf = String::new();
        for (i, line) in lines.iter().enumerate() {
            if self.ansi {
                if let Some(tint) = self.tint {
                    // Margin bar stands in for the panel background.
                    let _ = write!(buf, "{}▌{RESET} ", fg(tint.color));
                }
            }
            for span in line {
                match (self.ansi, span.color, span.bold) {
                    (false, _, _) => buf.push_str(&span.text),
                    (true, color, bold) => {
                        if bold {
                            buf.push_str("\x1b[1m");
                        }
                        if let Some(c) = color {
                            buf.push_str(&fg(c));
                        }
                        buf.push_str(&span.text);
                        if bold || color.is_some() {
                            buf.push_str(RESET);
                        }
                    }
                }
            }
            if let (true, 0, Some(glow)) = (self.ansi, i, self.glow) {
                // Glow marker trails the header line.
                let _ = write!(buf, " {}●{RESET}", fg(glow.color));
            }
            buf.push('\n');
        }
        buf
    }
}

impl<W: Write> StatusSurface for TerminalStatus<W> {
    fn replace(&mut self, lines: &[StatusLine]) -> Result<(), SurfaceError> {
        let text = self.render(lines);
        if text == self.last {
            return Ok(());
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        self.last = text;
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

/// Horizontal bar chart rendered to text.
#[derive(Debug, Default)]
pub struct TextChart {
    series: Vec<(EmotionCategory, Color)>,
    counts: [u64; EmotionCategory::COUNT],
    ansi: bool,
    rendered: String,
}

impl TextChart {
    pub fn new(ansi: bool) -> Self {
        Self { ansi, ..Default::default() }
    }

    /// Output of the last successful redraw.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

impl ChartWidget for TextChart {
    fn set_series(&mut self, series: &[(EmotionCategory, Color)]) -> Result<(), SurfaceError> {
        self.series = series.to_vec();
        Ok(())
    }

    fn set_counts(&mut self, counts: &[(EmotionCategory, u64)]) {
        for &(category, n) in counts {
            self.counts[category.index()] = n;
        }
    }

    fn redraw(&mut self) -> Result<(), SurfaceError> {
        if self.series.is_empty() {
            return Err(SurfaceError::Chart("no series declared".into()));
        }
        let max = self.counts.iter().copied().max().unwrap_or(0).max(1);

        let mut out = String::new();
        for &(category, color) in &self.series {
            let n = self.counts[category.index()];
            let len = if n == 0 { 0 } else { (n * BAR_WIDTH / max).max(1) };
            let bar = "█".repeat(len as usize);
            let glyph = style_for(category).glyph;
            if self.ansi {
                let _ = writeln!(out, "{glyph} {:<9} {}{bar}{RESET} {n}", category.as_str(), fg(color));
            } else {
                let _ = writeln!(out, "{glyph} {:<9} {bar} {n}", category.as_str());
            }
        }
        self.rendered = out;
        tracing::trace!(total = self.counts.iter().sum::<u64>(), "chart redrawn");
        Ok(())
    }
}
