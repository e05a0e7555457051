// Frame decoder - converts 4:2:0 camera frames into RGB pixel grids

use crate::models::frame::{DecodeError, DecodeResult, PixelFormat, PixelGrid, RawFrame};

/// Number of bytes a `width` x `height` 4:2:0 frame occupies.
///
/// Returns `None` for empty dimensions or when the size overflows `usize`.
pub fn required_len(width: u32, height: u32) -> Option<usize> {
    if width == 0 || height == 0 {
        return None;
    }

    let luma = (width as usize).checked_mul(height as usize)?;
    let chroma_w = (width as usize).div_ceil(2);
    let chroma_h = (height as usize).div_ceil(2);
    let chroma = chroma_w.checked_mul(chroma_h)?.checked_mul(2)?;

    luma.checked_add(chroma)
}

/// Verify the buffer holds a complete frame for its declared dimensions
pub fn check_dimensions(frame: &RawFrame) -> DecodeResult<()> {
    let invalid = |required| DecodeError::InvalidDimensions {
        width: frame.width,
        height: frame.height,
        required,
        actual: frame.data.len(),
    };

    let required = required_len(frame.width, frame.height).ok_or_else(|| invalid(0))?;
    if frame.data.len() < required {
        return Err(invalid(required));
    }

    Ok(())
}

/// Convert a raw frame into the dense RGB grid the engine expects.
///
/// Uses full-range BT.601 (JFIF) coefficients, the same color model a
/// quality-100 JPEG round trip of the frame would apply:
/// - R = Y + 1.402 * (V - 128)
/// - G = Y - 0.344136 * (U - 128) - 0.714136 * (V - 128)
/// - B = Y + 1.772 * (U - 128)
///
/// `rotation_degrees` is not applied; the grid keeps the sensor orientation.
pub fn decode(frame: &RawFrame) -> DecodeResult<PixelGrid> {
    check_dimensions(frame)?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let chroma_stride = width.div_ceil(2) * 2;
    let (luma, chroma) = frame.data.split_at(width * height);

    // Offsets of U and V within each interleaved chroma pair
    let (u_offset, v_offset) = match frame.format {
        PixelFormat::Nv21 => (1, 0),
        PixelFormat::Nv12 => (0, 1),
    };

    let mut rgb = Vec::with_capacity(width * height * 3);

    for row in 0..height {
        let luma_row = &luma[row * width..(row + 1) * width];
        let chroma_row = &chroma[(row / 2) * chroma_stride..];

        for (col, &y) in luma_row.iter().enumerate() {
            let pair = (col / 2) * 2;
            let u = chroma_row[pair + u_offset] as f32 - 128.0;
            let v = chroma_row[pair + v_offset] as f32 - 128.0;
            let y = y as f32;

            rgb.push(to_channel(y + 1.402 * v));
            rgb.push(to_channel(y - 0.344136 * u - 0.714136 * v));
            rgb.push(to_channel(y + 1.772 * u));
        }
    }

    PixelGrid::from_raw(frame.width, frame.height, rgb).ok_or_else(|| {
        DecodeError::ConversionFailure(format!(
            "could not build {}x{} RGB grid",
            frame.width, frame.height
        ))
    })
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
