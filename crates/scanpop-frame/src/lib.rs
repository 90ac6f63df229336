//! Fixed-size, single-channel 8-bit raster frames.
//!
//! This is the lowest layer of scanpop. It knows nothing about archives; it
//! only moves `width x height` byte frames around:
//! - [`Dimensions`] describes the frame geometry shared by a whole stream
//! - [`FrameSource`] / [`FrameSink`] are the seams external producers and
//!   consumers plug into
//! - [`RawFrameReader`] / [`RawFrameWriter`] speak the raw frame stream, with
//!   or without the 4-byte capture header
//!
//! No partial frames reach user code.

pub mod codec;
pub mod dims;
pub mod error;
pub mod reader;
pub mod traits;
pub mod writer;

pub use codec::{decode_header, encode_header, HEADER_SIZE};
pub use dims::Dimensions;
pub use error::{FrameError, Result};
pub use reader::RawFrameReader;
pub use traits::{pump, FrameSink, FrameSource};
pub use writer::RawFrameWriter;
