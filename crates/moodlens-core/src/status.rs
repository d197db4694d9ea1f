//! Status reporter: the human-readable per-frame summary panel.

use crate::style::{style_for, Color, Rgba, GLOW_ALPHA, PANEL_TINT_ALPHA};
use crate::surface::{StatusLine, StatusSpan, StatusSurface, SurfaceError};
use crate::types::NormalizedFace;

/// Panel tint and glow derived from a face colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelCosmetics {
    pub tint: Rgba,
    pub glow: Rgba,
}

impl PanelCosmetics {
    pub fn from_color(color: Color) -> Self {
        Self {
            tint: color.with_alpha(PANEL_TINT_ALPHA),
            glow: color.with_alpha(GLOW_ALPHA),
        }
    }
}

/// Everything the status panel shows for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub face_count: usize,
    pub lines: Vec<StatusLine>,
    /// `None` leaves the panel's current tint and glow untouched.
    pub cosmetics: Option<PanelCosmetics>,
}

impl StatusReport {
    /// Summarise a frame's faces, in detection order.
    pub fn for_faces(faces: &[NormalizedFace]) -> Self {
        if faces.is_empty() {
            return Self::message("👀 Waiting for faces...");
        }

        let mut lines = Vec::with_capacity(faces.len() + 1);
        lines.push(vec![StatusSpan::bold(format!("👥 Faces detected: {}", faces.len()))]);

        for (i, face) in faces.iter().enumerate() {
            let style = style_for(face.category);
            lines.push(vec![
                StatusSpan::plain(format!("🧠 Person {}: ", i + 1)),
                StatusSpan::colored(format!("{} {}", style.glyph, face.category), style.color),
                StatusSpan::plain(format!(" ({}%)", face.confidence_percent())),
            ]);
        }

        // Last face wins, same as the ambient filter.
        let cosmetics = faces
            .last()
            .map(|f| PanelCosmetics::from_color(style_for(f.category).color));

        Self { face_count: faces.len(), lines, cosmetics }
    }

    /// Single plain-text line, cosmetics untouched.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            face_count: 0,
            lines: vec![vec![StatusSpan::plain(text)]],
            cosmetics: None,
        }
    }

    /// Fatal startup failure, shown on a red panel.
    pub fn failure(headline: &str, reason: &str) -> Self {
        Self {
            face_count: 0,
            lines: vec![vec![StatusSpan::bold(format!("{headline}:")), StatusSpan::plain(format!(" {reason}"))]],
            cosmetics: Some(PanelCosmetics {
                tint: Color::RED.with_alpha(0xFF),
                glow: Color::RED.with_alpha(GLOW_ALPHA),
            }),
        }
    }

    /// Plain text of the whole report, one line per row.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the panel content with this report.
    ///
    /// Cosmetics are applied before the text so the new lines are shown
    /// with this report's tint, not the previous one.
    pub fn publish<S: StatusSurface + ?Sized>(&self, surface: &mut S) -> Result<(), SurfaceError> {
        if let Some(cosmetics) = self.cosmetics {
            surface.set_panel_tint(cosmetics.tint)?;
            surface.set_glow(cosmetics.glow)?;
        }
        surface.replace(&self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingStatus;
    use crate::types::{BoundingBox, EmotionCategory};

    fn face(category: EmotionCategory, confidence: f32) -> NormalizedFace {
        NormalizedFace {
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0, score: 1.0 },
            category,
            confidence,
        }
    }

    #[test]
    fn test_two_faces_report() {
        let report = StatusReport::for_faces(&[
            face(EmotionCategory::Happy, 0.8),
            face(EmotionCategory::Angry, 0.95),
        ]);
        assert_eq!(report.face_count, 2);
        assert_eq!(
            report.text(),
            "👥 Faces detected: 2\n🧠 Person 1: 😄 happy (80%)\n🧠 Person 2: 😡 angry (95%)"
        );
        assert_eq!(report.lines[1][1].color, Some(style_for(EmotionCategory::Happy).color));
        assert_eq!(report.lines[2][1].color, Some(style_for(EmotionCategory::Angry).color));
    }

    #[test]
    fn test_cosmetics_follow_last_face() {
        let report = StatusReport::for_faces(&[
            face(EmotionCategory::Sad, 0.7),
            face(EmotionCategory::Happy, 0.6),
        ]);
        let c = report.cosmetics.unwrap();
        assert_eq!(c.tint.to_string(), "#FFD70022");
        assert_eq!(c.glow.to_string(), "#FFD70055");
    }

    #[test]
    fn test_empty_frame_waiting_message() {
        let report = StatusReport::for_faces(&[]);
        assert_eq!(report.face_count, 0);
        assert_eq!(report.text(), "👀 Waiting for faces...");
        assert!(report.cosmetics.is_none());
    }

    #[test]
    fn test_publish_replaces_previous() {
        let mut panel = RecordingStatus::default();
        StatusReport::for_faces(&[face(EmotionCategory::Fearful, 0.5)])
            .publish(&mut panel)
            .unwrap();
        assert_eq!(panel.lines().len(), 2);
        let tint = panel.tint();

        StatusReport::for_faces(&[]).publish(&mut panel).unwrap();
        assert_eq!(panel.lines().len(), 1);
        // Empty frames keep the last tint.
        assert_eq!(panel.tint(), tint);
    }

    #[test]
    fn test_text_shown_with_its_own_tint() {
        let mut panel = RecordingStatus::default();
        StatusReport::failure("No camera access", "busy").publish(&mut panel).unwrap();
        assert_eq!(panel.shown_tint().unwrap().color, Color::RED);

        StatusReport::for_faces(&[face(EmotionCategory::Surprised, 0.7)])
            .publish(&mut panel)
            .unwrap();
        assert_eq!(
            panel.shown_tint(),
            Some(style_for(EmotionCategory::Surprised).color.with_alpha(PANEL_TINT_ALPHA))
        );
    }

    #[test]
    fn test_failure_is_red() {
        let report = StatusReport::failure("No camera access", "device busy");
        assert_eq!(report.text(), "No camera access: device busy");
        assert_eq!(report.cosmetics.unwrap().tint.color, Color::RED);
    }
}
