use crate::dims::Dimensions;

/// Errors that can occur while reading or writing raw frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Width or height is zero.
    #[error("invalid frame dimensions {width}x{height} (both must be positive)")]
    InvalidDimensions { width: u16, height: u16 },

    /// A frame buffer does not hold exactly `width * height` bytes.
    #[error("frame size mismatch ({actual} bytes, expected {expected})")]
    FrameSize { expected: usize, actual: usize },

    /// The stream ended in the middle of a frame.
    #[error("raw stream ended mid-frame ({actual} of {expected} bytes)")]
    TruncatedFrame { expected: usize, actual: usize },

    /// The stream ended before the 4-byte dimension header was complete.
    #[error("raw stream is missing its dimension header")]
    MissingHeader,

    /// A source and a sink disagree on frame geometry.
    #[error("dimension mismatch (source {source_dims}, sink {sink_dims})")]
    DimensionMismatch {
        source_dims: Dimensions,
        sink_dims: Dimensions,
    },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying stream stopped accepting bytes.
    #[error("stream closed (incomplete frame)")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
