//! Overlay renderer: per-face boxes and labels plus the ambient video filter.

use crate::filter::VideoFilter;
use crate::style::{style_for, Color};
use crate::surface::{DrawSurface, SurfaceError, TextPass, TextStyle};
use crate::types::NormalizedFace;

const LABEL_FONT_PX: u32 = 18;
const LABEL_OUTLINE_WIDTH: f32 = 3.0;
/// Labels sit this many pixels above the top edge of the box.
const LABEL_OFFSET_Y: f32 = 10.0;

/// Label text for one face, e.g. `😄 happy (80%)`.
pub fn label_for(face: &NormalizedFace) -> String {
    let style = style_for(face.category);
    format!("{} {} ({}%)", style.glyph, face.category, face.confidence_percent())
}

/// The ambient filter for a frame: the last face's filter, or neutral.
pub fn ambient_filter(faces: &[NormalizedFace]) -> VideoFilter {
    faces
        .last()
        .map(|f| style_for(f.category).filter)
        .unwrap_or(VideoFilter::NEUTRAL)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRenderer;

impl OverlayRenderer {
    /// Redraw the overlay from scratch for one frame.
    ///
    /// Faces are drawn in detection order; the returned filter is the one
    /// now applied to the video surface.
    pub fn render<S: DrawSurface + ?Sized>(
        &self,
        surface: &mut S,
        faces: &[NormalizedFace],
    ) -> Result<VideoFilter, SurfaceError> {
        surface.clear()?;

        for face in faces {
            surface.draw_box(&face.bbox, &format!("{:.2}", face.bbox.score))?;

            let style = TextStyle {
                font_px: LABEL_FONT_PX,
                fill: style_for(face.category).color,
                outline: Color::BLACK,
                line_width: LABEL_OUTLINE_WIDTH,
            };
            let text = label_for(face);
            let origin = (face.bbox.x, face.bbox.y - LABEL_OFFSET_Y);
            surface.draw_text(&text, origin, TextPass::Stroke, &style)?;
            surface.draw_text(&text, origin, TextPass::Fill, &style)?;
        }

        let filter = ambient_filter(faces);
        surface.set_ambient_filter(filter)?;
        tracing::trace!(faces = faces.len(), %filter, "overlay rendered");
        Ok(filter)
    }
}
