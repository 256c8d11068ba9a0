//! Frame data handling
//!
//! Decoded frames are immutable RGBA images shared by reference between the
//! decoder, the poster cache and the presentation surface. Handing a frame
//! around never copies pixels.

use image::{ImageBuffer, Rgba, RgbaImage};
use std::sync::Arc;

/// Shared handle to a decoded frame
pub type FrameRef = Arc<Frame>;

/// Edge length of the blank placeholder returned when no poster is available
const PLACEHOLDER_SIZE: u32 = 16;

/// A single decoded still image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbaImage,
    placeholder: bool,
}

impl Frame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            placeholder: false,
        }
    }

    /// Opaque black image standing in for a poster that could not be produced
    pub fn placeholder() -> Self {
        Self {
            image: ImageBuffer::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Rgba([0, 0, 0, 255])),
            placeholder: true,
        }
    }

    /// Build a frame from tightly or loosely packed RGBA rows
    ///
    /// `stride` is the byte length of one source row and may exceed
    /// `width * 4` when the decoder pads rows.
    pub fn from_rgba_rows(width: u32, height: u32, stride: usize, data: &[u8]) -> Option<Self> {
        let row_len = width as usize * 4;
        if stride < row_len || data.len() < stride * (height as usize).saturating_sub(1) + row_len
        {
            return None;
        }

        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in data.chunks(stride).take(height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        ImageBuffer::from_raw(width, height, pixels).map(Self::new)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// True for the blank stand-in produced by [`Frame::placeholder`]
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn into_shared(self) -> FrameRef {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_opaque_black() {
        let frame = Frame::placeholder();
        assert!(frame.is_placeholder());
        assert_eq!(frame.dimensions(), (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
        assert!(frame.image().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_from_rgba_rows_strips_padding() {
        // 2x2 image with 4 bytes of padding per row
        let data = [
            255, 0, 0, 255, 0, 255, 0, 255, 9, 9, 9, 9, //
            0, 0, 255, 255, 255, 255, 255, 255, 9, 9, 9, 9,
        ];
        let frame = Frame::from_rgba_rows(2, 2, 12, &data).unwrap();
        assert!(!frame.is_placeholder());
        assert_eq!(frame.image().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(frame.image().get_pixel(1, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(frame.image().get_pixel(0, 1), &Rgba([0, 0, 255, 255]));
        assert_eq!(frame.image().get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_from_rgba_rows_rejects_short_buffer() {
        assert!(Frame::from_rgba_rows(2, 2, 8, &[0u8; 12]).is_none());
        assert!(Frame::from_rgba_rows(2, 1, 4, &[0u8; 8]).is_none());
    }
}
