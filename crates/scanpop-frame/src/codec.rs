use bytes::{BufMut, BytesMut};

use crate::dims::Dimensions;
use crate::error::Result;

/// Raw stream header: width (2) + height (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Encode the dimension header that prefixes captured raw streams.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────────────────┐
/// │ Width (2B LE)│ Height (2B LE)│ Frames (width*height bytes)… │
/// └──────────────┴──────────────┴──────────────────────────────┘
/// ```
///
/// The same 4-byte layout opens every archive index file.
pub fn encode_header(dims: Dimensions, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_u16_le(dims.width());
    dst.put_u16_le(dims.height());
}

/// Decode a dimension header from the front of a buffer.
///
/// Returns `Ok(None)` if the buffer holds fewer than [`HEADER_SIZE`] bytes.
/// Does not consume anything from `src`.
pub fn decode_header(src: &[u8]) -> Result<Option<Dimensions>> {
    let Some(header) = src.get(..HEADER_SIZE) else {
        return Ok(None);
    };
    let width = u16::from_le_bytes([header[0], header[1]]);
    let height = u16::from_le_bytes([header[2], header[3]]);
    Dimensions::new(width, height).map(Some)
}
