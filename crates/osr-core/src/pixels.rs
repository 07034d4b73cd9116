#![forbid(unsafe_code)]

//! Pixel payloads produced by the engine's paint callback.

use std::sync::Arc;

use crate::geometry::Rect;

/// One painted frame: BGRA pixels, row-major, `width * height * 4` bytes.
///
/// The buffer is shared so a surface can finish its copy on another thread
/// after the engine callback has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub data: Arc<[u8]>,
    pub width: i32,
    pub height: i32,
    /// Regions that changed since the previous frame.
    pub dirty_rects: Vec<Rect>,
}

impl PixelBuffer {
    /// Bytes per BGRA pixel.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Create a frame covering the whole buffer as dirty.
    #[must_use]
    pub fn full(data: impl Into<Arc<[u8]>>, width: i32, height: i32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            dirty_rects: vec![Rect::from_size(width, height)],
        }
    }

    /// Expected byte length for the declared dimensions.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        let w = usize::try_from(self.width).unwrap_or(0);
        let h = usize::try_from(self.height).unwrap_or(0);
        w * h * Self::BYTES_PER_PIXEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_frame_is_entirely_dirty() {
        let frame = PixelBuffer::full(vec![0u8; 16], 2, 2);
        assert_eq!(frame.dirty_rects, vec![Rect::from_size(2, 2)]);
        assert_eq!(frame.expected_len(), 16);
    }

    #[test]
    fn negative_dimensions_expect_nothing() {
        let frame = PixelBuffer::full(Vec::<u8>::new(), -1, 5);
        assert_eq!(frame.expected_len(), 0);
    }
}
