use std::path::PathBuf;

use scanpop_frame::FrameError;

/// Errors that can occur while writing or reading an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// An archive file could not be opened or created.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on an open archive file.
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame-level error (geometry, raw stream).
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A record starts with a byte that is neither `New` nor `Reuse`.
    #[error("unknown record tag {tag} at data offset {offset}")]
    UnknownTag { tag: u8, offset: u64 },

    /// A `New` record's run pairs do not add up to the row width.
    #[error("malformed run-length payload at data offset {offset}")]
    MalformedRun { offset: u64 },

    /// Back-references chained deeper than the configured limit.
    #[error("back-reference chain at data offset {offset} exceeds depth {max_depth}")]
    ReferenceChain { offset: u64, max_depth: usize },

    /// A file ended before a complete structure could be read.
    #[error("truncated {what} at offset {offset}")]
    Truncated { what: &'static str, offset: u64 },

    /// A frame index beyond the end of the archive was requested.
    #[error("frame {index} out of range (archive holds {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    /// Configuration values that cannot drive a session.
    #[error("invalid archive configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
