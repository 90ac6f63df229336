use bytes::Bytes;

use crate::dims::Dimensions;
use crate::error::FrameError;

/// Something that yields whole frames in arrival order.
///
/// Capture tools, raw files and archive readers all look like this to the
/// rest of scanpop.
pub trait FrameSource {
    type Error;

    /// Geometry shared by every frame this source yields.
    fn dimensions(&self) -> Dimensions;

    /// Next frame, or `Ok(None)` once the source is exhausted.
    ///
    /// Every returned frame is exactly `dimensions().frame_len()` bytes.
    fn next_frame(&mut self) -> Result<Option<Bytes>, Self::Error>;
}

/// Something that accepts whole frames in order.
pub trait FrameSink {
    type Error;

    /// Geometry this sink expects.
    fn dimensions(&self) -> Dimensions;

    /// Accept one frame of exactly `dimensions().frame_len()` bytes.
    fn accept_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
}

/// Move every frame from `source` into `sink`, returning the frame count.
///
/// Fails up front if the two sides disagree on geometry.
pub fn pump<S, K, E>(source: &mut S, sink: &mut K) -> Result<u64, E>
where
    S: FrameSource,
    K: FrameSink,
    E: From<S::Error> + From<K::Error> + From<FrameError>,
{
    let (source_dims, sink_dims) = (source.dimensions(), sink.dimensions());
    if source_dims != sink_dims {
        return Err(FrameError::DimensionMismatch {
            source_dims,
            sink_dims,
        }
        .into());
    }

    let mut frames = 0u64;
    while let Some(frame) = source.next_frame()? {
        sink.accept_frame(&frame)?;
        frames += 1;
    }
    tracing::debug!(frames, dims = %source_dims, "frame pump drained source");
    Ok(frames)
}
