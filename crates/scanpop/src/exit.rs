use std::fmt;
use std::io;

use scanpop_archive::ArchiveError;
use scanpop_frame::FrameError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::InvalidDimensions { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::FrameSize { .. }
        | FrameError::TruncatedFrame { .. }
        | FrameError::MissingHeader
        | FrameError::DimensionMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::StreamClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn archive_error(context: &str, err: ArchiveError) -> CliError {
    match err {
        ArchiveError::Open { path, source } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
        ArchiveError::Io(source) => io_error(context, source),
        ArchiveError::Frame(err) => frame_error(context, err),
        ArchiveError::UnknownTag { .. }
        | ArchiveError::MalformedRun { .. }
        | ArchiveError::ReferenceChain { .. }
        | ArchiveError::Truncated { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ArchiveError::FrameOutOfRange { .. } | ArchiveError::InvalidConfig(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_violation_is_data_invalid() {
        let err = archive_error(
            "decode failed",
            ArchiveError::UnknownTag {
                tag: 9,
                offset: 40,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
        assert_eq!(
            err.message,
            "decode failed: unknown record tag 9 at data offset 40"
        );
    }

    #[test]
    fn open_failure_names_path() {
        let err = archive_error(
            "failed opening archive",
            ArchiveError::Open {
                path: "/nope/video.idx".into(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
        assert!(err.message.contains("/nope/video.idx"));
    }

    #[test]
    fn nested_frame_error_keeps_its_code() {
        let err = archive_error(
            "encode failed",
            ArchiveError::Frame(FrameError::TruncatedFrame {
                expected: 16,
                actual: 3,
            }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn bad_config_is_usage() {
        let err = archive_error("x", ArchiveError::InvalidConfig("zero".to_string()));
        assert_eq!(err.code, USAGE);
    }
}
