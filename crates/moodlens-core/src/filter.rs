//! Ambient video filters: CSS filter-effect primitives applied to RGB frames.
//!
//! Each primitive is an affine colour transform in linear [0, 1] space,
//! clamped after every step, following the Filter Effects matrices.

use std::fmt;

/// One filter primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    /// Rotation in degrees.
    HueRotate(f32),
    Grayscale(f32),
    Sepia(f32),
}

type Matrix = [[f32; 3]; 3];

impl FilterOp {
    /// Colour matrix and per-channel offset for this primitive.
    fn transform(&self) -> (Matrix, f32) {
        match *self {
            FilterOp::Brightness(a) => (diag(a), 0.0),
            FilterOp::Contrast(a) => (diag(a), 0.5 - 0.5 * a),
            FilterOp::Saturate(s) => (
                [
                    [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
                ],
                0.0,
            ),
            FilterOp::HueRotate(deg) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                (
                    [
                        [
                            0.213 + cos * 0.787 - sin * 0.213,
                            0.715 - cos * 0.715 - sin * 0.715,
                            0.072 - cos * 0.072 + sin * 0.928,
                        ],
                        [
                            0.213 - cos * 0.213 + sin * 0.143,
                            0.715 + cos * 0.285 + sin * 0.140,
                            0.072 - cos * 0.072 - sin * 0.283,
                        ],
                        [
                            0.213 - cos * 0.213 - sin * 0.787,
                            0.715 - cos * 0.715 + sin * 0.715,
                            0.072 + cos * 0.928 + sin * 0.072,
                        ],
                    ],
                    0.0,
                )
            }
            FilterOp::Grayscale(a) => {
                let s = 1.0 - a.clamp(0.0, 1.0);
                (
                    [
                        [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
                        [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
                        [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
                    ],
                    0.0,
                )
            }
            FilterOp::Sepia(a) => {
                let s = 1.0 - a.clamp(0.0, 1.0);
                (
                    [
                        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
                        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
                        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
                    ],
                    0.0,
                )
            }
        }
    }
}

fn diag(a: f32) -> Matrix {
    [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Brightness(a) => write!(f, "brightness({a})"),
            FilterOp::Contrast(a) => write!(f, "contrast({a})"),
            FilterOp::Saturate(a) => write!(f, "saturate({a})"),
            FilterOp::HueRotate(a) => write!(f, "hue-rotate({a}deg)"),
            FilterOp::Grayscale(a) => write!(f, "grayscale({a})"),
            FilterOp::Sepia(a) => write!(f, "sepia({a})"),
        }
    }
}

/// An ordered chain of filter primitives. The empty chain is the neutral filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFilter {
    ops: &'static [FilterOp],
}

impl VideoFilter {
    pub const NEUTRAL: VideoFilter = VideoFilter { ops: &[] };

    pub const fn new(ops: &'static [FilterOp]) -> Self {
        Self { ops }
    }

    pub fn is_neutral(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the chain in place to packed RGB8 pixels.
    pub fn apply_rgb(&self, rgb: &mut [u8]) {
        if self.is_neutral() {
            return;
        }
        let transforms: Vec<(Matrix, f32)> = self.ops.iter().map(FilterOp::transform).collect();

        for px in rgb.chunks_exact_mut(3) {
            let mut c = [px[0] as f32 / 255.0, px[1] as f32 / 255.0, px[2] as f32 / 255.0];
            for (m, offset) in &transforms {
                c = [
                    (m[0][0] * c[0] + m[0][1] * c[1] + m[0][2] * c[2] + offset).clamp(0.0, 1.0),
                    (m[1][0] * c[0] + m[1][1] * c[1] + m[1][2] * c[2] + offset).clamp(0.0, 1.0),
                    (m[2][0] * c[0] + m[2][1] * c[1] + m[2][2] * c[2] + offset).clamp(0.0, 1.0),
                ];
            }
            for (dst, v) in px.iter_mut().zip(c) {
                *dst = (v * 255.0).round() as u8;
            }
        }
    }
}

impl Default for VideoFilter {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for VideoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("none");
        }
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}
