//! Lossless archives for long sequences of 8-bit raster frames.
//!
//! scanpop stores each frame scanline by scanline: rows are run-length
//! encoded, and a row byte-identical to one written earlier is stored as a
//! 9-byte back-reference instead.
//!
//! # Crate Structure
//!
//! - [`frame`]: Frame geometry, source/sink traits, raw frame streams
//! - [`archive`]: Scanline codec, dedup cache, archive writer and reader

/// Re-export frame types.
pub mod frame {
    pub use scanpop_frame::*;
}

/// Re-export archive types.
pub mod archive {
    pub use scanpop_archive::*;
}
