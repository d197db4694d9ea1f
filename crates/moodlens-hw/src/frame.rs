//! Pixel-format conversion from camera buffers to packed RGB8.

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid {format} length: expected {expected}, got {actual}")]
    InvalidLength {
        format: &'static str,
        expected: usize,
        actual: usize,
    },
}

fn check_len(format: &'static str, buf: &[u8], expected: usize) -> Result<(), FrameError> {
    if buf.len() < expected {
        return Err(FrameError::InvalidLength { format, expected, actual: buf.len() });
    }
    Ok(())
}

/// BT.601 limited-range YUV → RGB for one pixel.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = (y as i32 - 16).max(0) * 298;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
    [
        clamp(c + 409 * e),
        clamp(c - 100 * d - 208 * e),
        clamp(c + 516 * d),
    ]
}

/// Convert packed YUYV (4:2:2) to RGB8.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; both pixels share U/V.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let pixels = width as usize * height as usize;
    check_len("YUYV", yuyv, pixels * 2)?;

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in yuyv[..pixels * 2].chunks_exact(4) {
        let [y0, u, y1, v] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }
    Ok(rgb)
}

/// Replicate 8-bit grayscale into three channels.
pub fn grey_to_rgb(grey: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let pixels = width as usize * height as usize;
    check_len("GREY", grey, pixels)?;
    Ok(grey[..pixels].iter().flat_map(|&g| [g, g, g]).collect())
}

/// Trim a packed RGB24 buffer to the frame size.
pub fn rgb24(buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let bytes = width as usize * height as usize * 3;
    check_len("RGB3", buf, bytes)?;
    Ok(buf[..bytes].to_vec())
}
