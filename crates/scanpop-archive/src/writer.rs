use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytes::BytesMut;
use scanpop_frame::{encode_header, Dimensions, FrameSink, HEADER_SIZE};

use crate::cache::{CacheStats, Lookup, ScanlineCache};
use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::format::{encode_new_record, encode_reuse_record, INDEX_ENTRY_SIZE};

/// Totals reported when a writer session finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub dimensions: Dimensions,
    pub frames: u64,
    pub data_bytes: u64,
    pub index_bytes: u64,
    pub new_records: u64,
    pub reuse_records: u64,
    pub cache: CacheStats,
}

impl WriteSummary {
    /// Size of the frames as raw bytes.
    pub fn raw_bytes(&self) -> u64 {
        self.frames * self.dimensions.frame_len() as u64
    }

    /// Raw size divided by archive size (data + index); 0 for an empty archive.
    pub fn ratio(&self) -> f64 {
        let stored = self.data_bytes + self.index_bytes;
        if self.frames == 0 || stored == 0 {
            return 0.0;
        }
        self.raw_bytes() as f64 / stored as f64
    }
}

/// Archive writer session.
///
/// Owns the scanline cache, its clock and both output streams. Frames go in
/// through [`write_frame`](Self::write_frame); every scanline becomes either a
/// `New` record or a `Reuse` record pointing at an earlier `New` record.
///
/// Usage:
/// ```ignore
/// let dims = Dimensions::new(1920, 1080)?;
/// let mut writer = ArchiveWriter::create("video.pop", "video.idx", dims)?;
/// for frame in frames {
///     writer.write_frame(&frame)?;
/// }
/// let summary = writer.finish()?;
/// ```
pub struct ArchiveWriter<D: Write, I: Write> {
    data: D,
    index: I,
    dims: Dimensions,
    cache: ScanlineCache,
    cursor: u64,
    frame_buf: BytesMut,
    frames_written: u64,
    index_bytes: u64,
    new_records: u64,
    reuse_records: u64,
}

impl ArchiveWriter<BufWriter<File>, BufWriter<File>> {
    /// Create (truncating) the data and index files with default configuration.
    pub fn create(
        data_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
        dims: Dimensions,
    ) -> Result<Self> {
        Self::create_with_config(data_path, index_path, dims, ArchiveConfig::default())
    }

    /// Create (truncating) the data and index files.
    pub fn create_with_config(
        data_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
        dims: Dimensions,
        config: ArchiveConfig,
    ) -> Result<Self> {
        let data = create_file(data_path.as_ref())?;
        let index = create_file(index_path.as_ref())?;
        tracing::debug!(
            data = %data_path.as_ref().display(),
            index = %index_path.as_ref().display(),
            dims = %dims,
            "archive files created"
        );
        Self::with_config(BufWriter::new(data), BufWriter::new(index), dims, config)
    }
}

impl<D: Write, I: Write> ArchiveWriter<D, I> {
    /// Start a session over arbitrary streams with default configuration.
    pub fn new(data: D, index: I, dims: Dimensions) -> Result<Self> {
        Self::with_config(data, index, dims, ArchiveConfig::default())
    }

    /// Start a session over arbitrary streams; writes the index header.
    pub fn with_config(
        data: D,
        mut index: I,
        dims: Dimensions,
        config: ArchiveConfig,
    ) -> Result<Self> {
        config.validate()?;
        let cache = ScanlineCache::new(config.cache_capacity)?;

        let mut header = BytesMut::with_capacity(HEADER_SIZE);
        encode_header(dims, &mut header);
        index.write_all(&header)?;

        Ok(Self {
            data,
            index,
            dims,
            cache,
            cursor: 0,
            frame_buf: BytesMut::with_capacity(dims.frame_len() * 2 + dims.height() as usize),
            frames_written: 0,
            index_bytes: HEADER_SIZE as u64,
            new_records: 0,
            reuse_records: 0,
        })
    }

    /// Encode one raw frame of exactly `width * height` bytes.
    ///
    /// The frame's first-record offset is appended to the index before any of
    /// its scanlines are written.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.dims.check_frame(frame)?;

        let frame_start = self.cursor;
        self.index.write_all(&frame_start.to_le_bytes())?;
        self.index_bytes += INDEX_ENTRY_SIZE as u64;

        self.frame_buf.clear();
        for row in self.dims.rows(frame) {
            let record_start = frame_start + self.frame_buf.len() as u64;
            match self.cache.lookup_or_insert(row, record_start) {
                Lookup::Hit(offset) => {
                    encode_reuse_record(offset, &mut self.frame_buf);
                    self.reuse_records += 1;
                }
                Lookup::Miss => {
                    encode_new_record(row, &mut self.frame_buf);
                    self.new_records += 1;
                }
            }
        }

        self.data.write_all(&self.frame_buf)?;
        self.cursor += self.frame_buf.len() as u64;
        self.frames_written += 1;

        tracing::trace!(
            frame = self.frames_written - 1,
            offset = frame_start,
            bytes = self.frame_buf.len(),
            "frame encoded"
        );
        Ok(())
    }

    /// Flush both streams and report totals.
    ///
    /// A session dropped without `finish` still releases its streams, but
    /// buffered bytes may be lost and the last frame may be incomplete.
    pub fn finish(mut self) -> Result<WriteSummary> {
        self.data.flush()?;
        self.index.flush()?;

        let summary = self.summary();
        tracing::debug!(
            frames = summary.frames,
            data_bytes = summary.data_bytes,
            new_records = summary.new_records,
            reuse_records = summary.reuse_records,
            evictions = summary.cache.evictions,
            "archive session finished"
        );
        Ok(summary)
    }

    /// Totals so far.
    pub fn summary(&self) -> WriteSummary {
        WriteSummary {
            dimensions: self.dims,
            frames: self.frames_written,
            data_bytes: self.cursor,
            index_bytes: self.index_bytes,
            new_records: self.new_records,
            reuse_records: self.reuse_records,
            cache: self.cache.stats(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Current data-file write cursor.
    pub fn bytes_written(&self) -> u64 {
        self.cursor
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<D: Write, I: Write> FrameSink for ArchiveWriter<D, I> {
    type Error = ArchiveError;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn accept_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.write_frame(frame)
    }
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| ArchiveError::Open {
        path: path.to_path_buf(),
        source,
    })
}
