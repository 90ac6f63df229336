use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use scanpop_archive::{ArchiveConfig, ArchiveReader};
use scanpop_frame::RawFrameWriter;

use crate::cmd::{is_std_stream, DecodeArgs};
use crate::exit::{archive_error, frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: DecodeArgs) -> CliResult<i32> {
    let config = ArchiveConfig {
        max_reference_depth: args.max_reference_depth,
        ..ArchiveConfig::default()
    };
    let reader =
        ArchiveReader::open_with_config(&args.archive.data, &args.archive.index, config)
            .map_err(|err| archive_error("failed opening archive", err))?;

    let (first, end) = frame_range(args.first, args.count, reader.frame_count())?;
    let dims = reader.dimensions();

    let out = open_output(args.output.as_ref())?;
    let mut sink = if args.with_header {
        RawFrameWriter::with_header(out, dims)
            .map_err(|err| frame_error("failed writing raw stream header", err))?
    } else {
        RawFrameWriter::new(out, dims)
    };

    tracing::info!(dims = %dims, first, end, "decoding");
    for index in first..end {
        reader
            .read_frame_into(index, &mut sink)
            .map_err(|err| archive_error(&format!("failed decoding frame {index}"), err))?;
    }
    sink.flush()
        .map_err(|err| frame_error("failed flushing output", err))?;

    tracing::info!(frames = sink.frames_written(), "decode complete");
    Ok(SUCCESS)
}

/// Resolve `--first`/`--count` against the archive's frame count.
fn frame_range(first: usize, count: Option<usize>, total: usize) -> CliResult<(usize, usize)> {
    if first > total {
        return Err(CliError::new(
            USAGE,
            format!("--first {first} is past the last frame (archive holds {total} frames)"),
        ));
    }
    let end = match count {
        Some(count) => first.saturating_add(count).min(total),
        None => total,
    };
    Ok((first, end))
}

fn open_output(path: Option<&PathBuf>) -> CliResult<Box<dyn Write>> {
    match path {
        Some(path) if !is_std_stream(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(std::io::stdout().lock()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_defaults_to_whole_archive() {
        assert_eq!(frame_range(0, None, 12).unwrap(), (0, 12));
    }

    #[test]
    fn range_clamps_count() {
        assert_eq!(frame_range(10, Some(5), 12).unwrap(), (10, 12));
        assert_eq!(frame_range(3, Some(usize::MAX), 12).unwrap(), (3, 12));
    }

    #[test]
    fn range_at_end_is_empty() {
        assert_eq!(frame_range(12, None, 12).unwrap(), (12, 12));
    }

    #[test]
    fn range_past_end_is_usage_error() {
        let err = frame_range(13, None, 12).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
