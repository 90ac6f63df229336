//! Lossless archive codec for long sequences of 8-bit raster frames.
//!
//! This is the core of scanpop. Every frame is split into scanlines and each
//! scanline becomes one record in the data file:
//! - a `New` record (tag `122`) holding the row run-length encoded as
//!   `(count, value)` pairs, or
//! - a `Reuse` record (tag `51`) holding the 8-byte offset of an earlier
//!   `New` record with byte-identical content.
//!
//! A bounded, content-addressed LRU cache decides which rows can be reused.
//! A side index file stores the dimensions and the offset of every frame's
//! first record, so any frame can be decoded without touching the others.

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod reader;
pub mod rle;
pub mod writer;

pub use cache::{rolling_hash, CacheStats, Lookup, RowHashFn, ScanlineCache, DEFAULT_CACHE_CAPACITY};
pub use config::{ArchiveConfig, DEFAULT_MAX_REFERENCE_DEPTH};
pub use error::{ArchiveError, Result};
pub use format::{RecordTag, INDEX_ENTRY_SIZE, REUSE_RECORD_LEN};
pub use reader::{ArchiveFrames, ArchiveReader, ArchiveStats};
pub use writer::{ArchiveWriter, WriteSummary};

pub use scanpop_frame::{Dimensions, FrameSink, FrameSource};
