//! RGBA overlay canvas backed by the `image` crate.
//!
//! Boxes, captions and labels are rasterised with `imageproc` into a
//! transparent layer the size of the video. `present` composites filtered
//! video + overlay and can write periodic PNG snapshots.

use crate::filter::VideoFilter;
use crate::frame::Frame;
use crate::style::Color;
use crate::surface::{DrawSurface, SurfaceError, TextPass, TextStyle};
use crate::types::BoundingBox;
use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{imageops, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::PathBuf;

/// Label face, embedded so snapshots look the same on every host.
static LABEL_FONT: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

const BOX_LINE_WIDTH: i32 = 2;
const CAPTION_FONT_PX: f32 = 14.0;
/// Gap between the bottom edge of a box and its caption.
const CAPTION_GAP: f32 = 2.0;

/// A string rasterised onto the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: Color,
}

#[derive(Debug, Clone)]
struct SnapshotTarget {
    path: PathBuf,
    every: u64,
}

pub struct ImageCanvas {
    layer: RgbaImage,
    font: FontRef<'static>,
    labels: Vec<PlacedLabel>,
    filter: VideoFilter,
    snapshot: Option<SnapshotTarget>,
}

impl ImageCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let font = FontRef::try_from_slice(LABEL_FONT)
            .map_err(|e| SurfaceError::Draw(format!("label font: {e}")))?;
        Ok(Self {
            layer: RgbaImage::new(width, height),
            font,
            labels: Vec::new(),
            filter: VideoFilter::NEUTRAL,
            snapshot: None,
        })
    }

    /// Write a composited PNG to `path` on every `every`-th presented frame.
    pub fn with_snapshots(mut self, path: PathBuf, every: u64) -> Self {
        self.snapshot = Some(SnapshotTarget { path, every: every.max(1) });
        self
    }

    pub fn labels(&self) -> &[PlacedLabel] {
        &self.labels
    }

    pub fn layer(&self) -> &RgbaImage {
        &self.layer
    }

    pub fn filter(&self) -> VideoFilter {
        self.filter
    }

    /// Filtered video frame with the overlay layer on top.
    pub fn compose(&self, frame: &Frame) -> Result<RgbaImage, SurfaceError> {
        let mut data = frame.data.clone();
        self.filter.apply_rgb(&mut data);
        let video: RgbImage = RgbImage::from_raw(frame.width, frame.height, data).ok_or_else(|| {
            SurfaceError::Draw(format!(
                "frame buffer does not match {}x{} RGB",
                frame.width, frame.height
            ))
        })?;

        let (w, h) = self.layer.dimensions();
        let video = if video.dimensions() == (w, h) {
            video
        } else {
            imageops::resize(&video, w, h, imageops::FilterType::Triangle)
        };

        let mut out = RgbaImage::from_fn(w, h, |x, y| {
            let Rgb([r, g, b]) = *video.get_pixel(x, y);
            Rgba([r, g, b, 0xFF])
        });
        imageops::overlay(&mut out, &self.layer, 0, 0);
        Ok(out)
    }

    /// Draw `text` with its top-left corner at (x, y).
    fn text_at(&mut self, text: &str, x: i32, y: i32, font_px: f32, color: Rgba<u8>) {
        draw_text_mut(&mut self.layer, color, x, y, PxScale::from(font_px), &self.font, text);
    }

    /// Top edge of a line of text whose baseline sits at `baseline`.
    fn line_top(&self, baseline: f32, font_px: f32) -> f32 {
        baseline - self.font.as_scaled(PxScale::from(font_px)).ascent()
    }
}

fn rgba(color: Color, alpha: u8) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, alpha])
}

fn rect(x: i32, y: i32, width: i32, height: i32) -> Option<Rect> {
    (width > 0 && height > 0).then(|| Rect::at(x, y).of_size(width as u32, height as u32))
}

impl DrawSurface for ImageCanvas {
    fn size(&self) -> (u32, u32) {
        self.layer.dimensions()
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.layer.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
        self.labels.clear();
        Ok(())
    }

    fn draw_box(&mut self, bbox: &BoundingBox, caption: &str) -> Result<(), SurfaceError> {
        let color = rgba(Color::BOX_BLUE, 0xFF);
        let x = bbox.x.round() as i32;
        let y = bbox.y.round() as i32;
        let w = bbox.width.round() as i32;
        let h = bbox.height.round() as i32;
        for inset in 0..BOX_LINE_WIDTH {
            if let Some(r) = rect(x + inset, y + inset, w - 2 * inset, h - 2 * inset) {
                draw_hollow_rect_mut(&mut self.layer, r, color);
            }
        }

        let caption_y = bbox.y + bbox.height + CAPTION_GAP;
        self.text_at(caption, x, caption_y.round() as i32, CAPTION_FONT_PX, color);
        self.labels.push(PlacedLabel {
            text: caption.to_string(),
            x: bbox.x,
            y: caption_y,
            color: Color::BOX_BLUE,
        });
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        origin: (f32, f32),
        pass: TextPass,
        style: &TextStyle,
    ) -> Result<(), SurfaceError> {
        let font_px = style.font_px as f32;
        let x = origin.0.round() as i32;
        let y = self.line_top(origin.1, font_px).round() as i32;
        match pass {
            TextPass::Stroke => {
                // Outline: the text stamped at every offset within the line width.
                let r = style.line_width.round().max(1.0) as i32;
                let color = rgba(style.outline, 0xFF);
                for dy in -r..=r {
                    for dx in -r..=r {
                        if (dx, dy) != (0, 0) && dx * dx + dy * dy <= r * r {
                            self.text_at(text, x + dx, y + dy, font_px, color);
                        }
                    }
                }
            }
            TextPass::Fill => {
                self.text_at(text, x, y, font_px, rgba(style.fill, 0xFF));
                self.labels.push(PlacedLabel {
                    text: text.to_string(),
                    x: origin.0,
                    y: origin.1,
                    color: style.fill,
                });
            }
        }
        Ok(())
    }

    fn set_ambient_filter(&mut self, filter: VideoFilter) -> Result<(), SurfaceError> {
        self.filter = filter;
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        let Some(target) = &self.snapshot else {
            return Ok(());
        };
        if frame.sequence % target.every != 0 {
            return Ok(());
        }
        let path = target.path.clone();
        self.compose(frame)?.save(&path)?;
        tracing::debug!(path = %path.display(), seq = frame.sequence, "overlay snapshot written");
        Ok(())
    }
}
