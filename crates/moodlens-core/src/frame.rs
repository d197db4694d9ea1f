//! Video frame handed from the capture device to the classifier.

use std::time::Instant;

/// A captured frame in packed RGB8 (width * height * 3 bytes).
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub sequence: u64,
    pub captured_at: Instant,
}

impl Frame {
    /// Uniform mid-gray frame, used when replaying scripted detections.
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data: vec![128u8; width as usize * height as usize * 3],
            width,
            height,
            sequence,
            captured_at: Instant::now(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
