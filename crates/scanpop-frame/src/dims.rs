//! Frame geometry.

use std::fmt;

use crate::error::{FrameError, Result};

/// Width and height of every frame in a stream or archive.
///
/// Both are positive and fit the `u16` fields of the on-disk headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: u16,
    height: u16,
}

impl Dimensions {
    /// Validate and build a geometry.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Bytes per scanline.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Scanlines per frame.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Bytes per scanline as `usize`.
    pub fn row_len(&self) -> usize {
        self.width as usize
    }

    /// Bytes per frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check that `frame` holds exactly one frame of this geometry.
    pub fn check_frame(&self, frame: &[u8]) -> Result<()> {
        if frame.len() != self.frame_len() {
            return Err(FrameError::FrameSize {
                expected: self.frame_len(),
                actual: frame.len(),
            });
        }
        Ok(())
    }

    /// Split a frame into its scanlines, top to bottom.
    pub fn rows<'a>(&self, frame: &'a [u8]) -> std::slice::ChunksExact<'a, u8> {
        frame.chunks_exact(self.row_len())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
