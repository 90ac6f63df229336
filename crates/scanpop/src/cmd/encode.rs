use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use scanpop_archive::{ArchiveConfig, ArchiveError, ArchiveWriter};
use scanpop_frame::{pump, Dimensions, RawFrameReader};

use crate::cmd::{is_std_stream, EncodeArgs};
use crate::exit::{archive_error, frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_write_summary, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(&args.input)?;
    let mut source = match (args.width, args.height) {
        (Some(width), Some(height)) => {
            let dims = Dimensions::new(width, height)
                .map_err(|err| frame_error("invalid dimensions", err))?;
            RawFrameReader::new(input, dims)
        }
        _ => RawFrameReader::with_header(input)
            .map_err(|err| frame_error("failed reading raw stream header", err))?,
    };

    let config = ArchiveConfig {
        cache_capacity: args.cache_capacity,
        ..ArchiveConfig::default()
    };
    let mut writer = ArchiveWriter::create_with_config(
        &args.archive.data,
        &args.archive.index,
        source.dimensions(),
        config,
    )
    .map_err(|err| archive_error("failed creating archive", err))?;

    tracing::info!(
        input = %args.input.display(),
        dims = %source.dimensions(),
        cache_capacity = config.cache_capacity,
        "encoding"
    );

    pump::<_, _, ArchiveError>(&mut source, &mut writer)
        .map_err(|err| archive_error("encode failed", err))?;
    let summary = writer
        .finish()
        .map_err(|err| archive_error("failed finishing archive", err))?;

    tracing::info!(
        frames = summary.frames,
        data_bytes = summary.data_bytes,
        "encode complete"
    );
    print_write_summary(&summary, format);
    Ok(SUCCESS)
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if is_std_stream(path) {
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
    Ok(Box::new(BufReader::new(file)))
}
