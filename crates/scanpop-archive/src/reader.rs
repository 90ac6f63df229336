use std::fs::File;
use std::path::Path;

use bytes::Bytes;
use memmap2::Mmap;
use scanpop_frame::{Dimensions, FrameSink, FrameSource};

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::format::{parse_index, read_u64_le, RecordTag, REUSE_RECORD_LEN};
use crate::rle::{decode_row, measure_payload, PayloadLen};

enum DataBuffer {
    Mapped(Mmap),
    Owned(Bytes),
}

impl DataBuffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            DataBuffer::Mapped(map) => &map[..],
            DataBuffer::Owned(bytes) => &bytes[..],
        }
    }
}

/// Record counts gathered by walking the whole data file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub frames: u64,
    pub new_records: u64,
    pub reuse_records: u64,
    /// Bytes taken by `New` records, tags included.
    pub new_bytes: u64,
    /// Bytes taken by `Reuse` records.
    pub reuse_bytes: u64,
    pub data_bytes: u64,
    pub raw_bytes: u64,
    /// Bytes of a final record cut short by an interrupted write.
    pub trailing_bytes: u64,
}

impl ArchiveStats {
    /// Scanline records found in the data file.
    pub fn records(&self) -> u64 {
        self.new_records + self.reuse_records
    }

    /// True when every indexed frame has all of its scanlines and no record
    /// is cut short.
    pub fn is_complete(&self, height: u16) -> bool {
        self.trailing_bytes == 0 && self.records() == self.frames * u64::from(height)
    }
}

/// Archive reader session.
///
/// Holds the full frame offset table in memory and the data file either
/// memory-mapped or as an owned buffer. Frames can be decoded in any order.
pub struct ArchiveReader {
    data: DataBuffer,
    dims: Dimensions,
    offsets: Vec<u64>,
    config: ArchiveConfig,
}

impl ArchiveReader {
    /// Open an archive from its data and index files with default configuration.
    pub fn open(data_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(data_path, index_path, ArchiveConfig::default())
    }

    /// Open an archive from its data and index files.
    pub fn open_with_config(
        data_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
        config: ArchiveConfig,
    ) -> Result<Self> {
        let data_path = data_path.as_ref();
        let index_path = index_path.as_ref();

        let index = std::fs::read(index_path).map_err(|source| ArchiveError::Open {
            path: index_path.to_path_buf(),
            source,
        })?;
        let file = File::open(data_path).map_err(|source| ArchiveError::Open {
            path: data_path.to_path_buf(),
            source,
        })?;

        let data = if file.metadata()?.len() == 0 {
            DataBuffer::Owned(Bytes::new())
        } else {
            // SAFETY: the mapping is read-only and owned by this reader. A data
            // file truncated by another process while mapped is outside the
            // single-session model this reader is built for.
            DataBuffer::Mapped(unsafe { Mmap::map(&file)? })
        };

        let reader = Self::build(data, &index, config)?;
        tracing::debug!(
            data = %data_path.display(),
            dims = %reader.dims,
            frames = reader.offsets.len(),
            data_bytes = reader.data_len(),
            "archive opened"
        );
        Ok(reader)
    }

    /// Build a reader over in-memory data and index bytes.
    pub fn from_parts(
        data: impl Into<Bytes>,
        index: &[u8],
        config: ArchiveConfig,
    ) -> Result<Self> {
        Self::build(DataBuffer::Owned(data.into()), index, config)
    }

    fn build(data: DataBuffer, index: &[u8], config: ArchiveConfig) -> Result<Self> {
        config.validate()?;
        let (dims, offsets) = parse_index(index)?;
        Ok(Self {
            data,
            dims,
            offsets,
            config,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn frame_count(&self) -> usize {
        self.offsets.len()
    }

    /// Data-file offset of every frame's first record.
    pub fn frame_offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn data_len(&self) -> usize {
        self.data.as_slice().len()
    }

    /// Decode the scanline record at `offset` into `row`.
    ///
    /// Returns the bytes the record occupies at `offset`: `1 + payload` for a
    /// `New` record, always 9 for a `Reuse` record however large its target.
    pub fn read_scanline(&self, offset: u64, row: &mut [u8]) -> Result<usize> {
        let data = self.data.as_slice();
        let mut at = offset;
        let mut hops = 0usize;

        loop {
            let pos = position(at, data.len(), "record tag")?;
            let tag = data[pos];
            match RecordTag::from_u8(tag) {
                Some(RecordTag::New) => {
                    let used = decode_row(&data[pos + 1..], row)
                        .ok_or(ArchiveError::MalformedRun { offset: at })?;
                    return Ok(if hops == 0 { 1 + used } else { REUSE_RECORD_LEN });
                }
                Some(RecordTag::Reuse) => {
                    if hops >= self.config.max_reference_depth {
                        return Err(ArchiveError::ReferenceChain {
                            offset,
                            max_depth: self.config.max_reference_depth,
                        });
                    }
                    let target = read_u64_le(data, pos + 1).ok_or(ArchiveError::Truncated {
                        what: "reuse record",
                        offset: at,
                    })?;
                    tracing::trace!(offset = at, target, "following back-reference");
                    at = target;
                    hops += 1;
                }
                None => return Err(ArchiveError::UnknownTag { tag, offset: at }),
            }
        }
    }

    /// Decode frame `index` into `out`, replacing its contents.
    pub fn read_frame(&self, index: usize, out: &mut Vec<u8>) -> Result<()> {
        let start = *self
            .offsets
            .get(index)
            .ok_or(ArchiveError::FrameOutOfRange {
                index,
                count: self.offsets.len(),
            })?;

        out.clear();
        out.resize(self.dims.frame_len(), 0);

        let mut cursor = start;
        for row in out.chunks_exact_mut(self.dims.row_len()) {
            cursor += self.read_scanline(cursor, row)? as u64;
        }
        Ok(())
    }

    /// Decode frame `index` and hand it to `sink`.
    pub fn read_frame_into<K>(&self, index: usize, sink: &mut K) -> Result<()>
    where
        K: FrameSink,
        ArchiveError: From<K::Error>,
    {
        let mut frame = Vec::with_capacity(self.dims.frame_len());
        self.read_frame(index, &mut frame)?;
        sink.accept_frame(&frame)?;
        Ok(())
    }

    /// Iterate over every frame in order.
    pub fn frames(&self) -> ArchiveFrames<'_> {
        self.frames_from(0)
    }

    /// Iterate over frames starting at `first`.
    pub fn frames_from(&self, first: usize) -> ArchiveFrames<'_> {
        ArchiveFrames {
            reader: self,
            next: first,
        }
    }

    /// Walk every record in the data file and count them by kind.
    ///
    /// A record cut off by the end of the data file stops the walk and is
    /// reported in `trailing_bytes`. Corruption before the end is an error.
    pub fn stats(&self) -> Result<ArchiveStats> {
        let data = self.data.as_slice();
        let width = self.dims.row_len();
        let mut stats = ArchiveStats {
            frames: self.offsets.len() as u64,
            data_bytes: data.len() as u64,
            raw_bytes: self.offsets.len() as u64 * self.dims.frame_len() as u64,
            ..ArchiveStats::default()
        };

        let mut pos = 0usize;
        while pos < data.len() {
            let tag = data[pos];
            match RecordTag::from_u8(tag) {
                Some(RecordTag::New) => match measure_payload(&data[pos + 1..], width) {
                    PayloadLen::Complete(payload) => {
                        let len = 1 + payload;
                        stats.new_records += 1;
                        stats.new_bytes += len as u64;
                        pos += len;
                    }
                    PayloadLen::Cut => break,
                    PayloadLen::Overshoot => {
                        return Err(ArchiveError::MalformedRun {
                            offset: pos as u64,
                        })
                    }
                },
                Some(RecordTag::Reuse) => {
                    if pos + REUSE_RECORD_LEN > data.len() {
                        break;
                    }
                    stats.reuse_records += 1;
                    stats.reuse_bytes += REUSE_RECORD_LEN as u64;
                    pos += REUSE_RECORD_LEN;
                }
                None => {
                    return Err(ArchiveError::UnknownTag {
                        tag,
                        offset: pos as u64,
                    })
                }
            }
        }

        stats.trailing_bytes = (data.len() - pos) as u64;
        if stats.trailing_bytes > 0 {
            tracing::debug!(
                offset = pos,
                bytes = stats.trailing_bytes,
                "data file ends inside a record"
            );
        }
        Ok(stats)
    }
}

fn position(offset: u64, len: usize, what: &'static str) -> Result<usize> {
    usize::try_from(offset)
        .ok()
        .filter(|&pos| pos < len)
        .ok_or(ArchiveError::Truncated { what, offset })
}

/// Frames of an archive decoded in order.
///
/// Usable both as an [`Iterator`] and as a [`FrameSource`].
pub struct ArchiveFrames<'a> {
    reader: &'a ArchiveReader,
    next: usize,
}

impl ArchiveFrames<'_> {
    /// Index of the frame the next call will decode.
    pub fn position(&self) -> usize {
        self.next
    }
}

impl Iterator for ArchiveFrames<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.reader.frame_count().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl FrameSource for ArchiveFrames<'_> {
    type Error = ArchiveError;

    fn dimensions(&self) -> Dimensions {
        self.reader.dims
    }

    fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.next >= self.reader.frame_count() {
            return Ok(None);
        }
        let mut frame = Vec::with_capacity(self.reader.dims.frame_len());
        if let Err(err) = self.reader.read_frame(self.next, &mut frame) {
            // A failed frame ends iteration.
            self.next = self.reader.frame_count();
            return Err(err);
        }
        self.next += 1;
        Ok(Some(Bytes::from(frame)))
    }
}
