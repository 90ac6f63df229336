//! On-disk layout of the data and index files.
//!
//! ```text
//! index file:
//!   Width:  u16 LE
//!   Height: u16 LE
//!   Offset: u64 LE, one per frame, in frame order
//!
//! data file (concatenated records):
//!   New:   0x7A (122) + (count u8, value u8) pairs summing to width
//!   Reuse: 0x33 (51)  + u64 LE offset of a New record
//! ```

use bytes::{BufMut, BytesMut};
use scanpop_frame::{decode_header, Dimensions, HEADER_SIZE};

use crate::error::{ArchiveError, Result};
use crate::rle::encode_row;

/// Size of one frame offset in the index file.
pub const INDEX_ENTRY_SIZE: usize = 8;

/// Size of a `Reuse` record: tag (1) + offset (8).
pub const REUSE_RECORD_LEN: usize = 1 + 8;

/// Leading byte of every data-file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordTag {
    /// Back-reference to an earlier `New` record.
    Reuse = 51,
    /// Run-length encoded scanline.
    New = 122,
}

impl RecordTag {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            51 => Some(RecordTag::Reuse),
            122 => Some(RecordTag::New),
            _ => None,
        }
    }
}

/// Append a `New` record for `row`; returns the record length.
pub fn encode_new_record(row: &[u8], dst: &mut BytesMut) -> usize {
    dst.put_u8(RecordTag::New as u8);
    1 + encode_row(row, dst)
}

/// Append a `Reuse` record pointing at `offset`.
pub fn encode_reuse_record(offset: u64, dst: &mut BytesMut) {
    dst.reserve(REUSE_RECORD_LEN);
    dst.put_u8(RecordTag::Reuse as u8);
    dst.put_u64_le(offset);
}

/// Read a little-endian `u64` at `pos`, if the buffer is long enough.
pub(crate) fn read_u64_le(src: &[u8], pos: usize) -> Option<u64> {
    let bytes = src.get(pos..pos.checked_add(8)?)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Some(u64::from_le_bytes(buf))
}

/// Parse a complete index file into its dimensions and frame offsets.
pub fn parse_index(src: &[u8]) -> Result<(Dimensions, Vec<u64>)> {
    let dims = decode_header(src)?.ok_or(ArchiveError::Truncated {
        what: "index header",
        offset: 0,
    })?;

    let table = &src[HEADER_SIZE..];
    if table.len() % INDEX_ENTRY_SIZE != 0 {
        return Err(ArchiveError::Truncated {
            what: "index entry",
            offset: (HEADER_SIZE + table.len() - table.len() % INDEX_ENTRY_SIZE) as u64,
        });
    }

    let offsets = table
        .chunks_exact(INDEX_ENTRY_SIZE)
        .map(|entry| {
            let mut buf = [0u8; INDEX_ENTRY_SIZE];
            buf.copy_from_slice(entry);
            u64::from_le_bytes(buf)
        })
        .collect();

    Ok((dims, offsets))
}
