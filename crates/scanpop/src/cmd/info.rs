use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use scanpop_archive::{ArchiveReader, ArchiveStats, INDEX_ENTRY_SIZE};
use scanpop_frame::HEADER_SIZE;
use serde::Serialize;

use crate::cmd::InfoArgs;
use crate::exit::{archive_error, CliResult, SUCCESS};
use crate::output::{print_json, round2, OutputFormat};

#[derive(Serialize)]
struct RecordInfo {
    new: u64,
    reuse: u64,
    new_bytes: u64,
    reuse_bytes: u64,
}

#[derive(Serialize)]
struct InfoOutput {
    width: u16,
    height: u16,
    frames: u64,
    raw_bytes: u64,
    data_bytes: u64,
    index_bytes: u64,
    trailing_bytes: u64,
    records: RecordInfo,
    reuse_fraction: f64,
    ratio: f64,
    complete: bool,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let reader = ArchiveReader::open(&args.archive.data, &args.archive.index)
        .map_err(|err| archive_error("failed opening archive", err))?;
    let stats = reader
        .stats()
        .map_err(|err| archive_error("failed scanning archive", err))?;

    let out = build_info(&stats, reader.dimensions().width(), reader.dimensions().height());
    if !out.complete {
        tracing::warn!(
            records = stats.records(),
            expected = stats.frames * u64::from(out.height),
            trailing_bytes = stats.trailing_bytes,
            "archive is incomplete; last frame may be cut short"
        );
    }

    print_info(&out, format);
    Ok(SUCCESS)
}

fn build_info(stats: &ArchiveStats, width: u16, height: u16) -> InfoOutput {
    let index_bytes = (HEADER_SIZE + INDEX_ENTRY_SIZE * stats.frames as usize) as u64;
    let stored = stats.data_bytes + index_bytes;
    let reuse_fraction = if stats.records() == 0 {
        0.0
    } else {
        stats.reuse_records as f64 / stats.records() as f64
    };
    let ratio = if stats.frames == 0 {
        0.0
    } else {
        stats.raw_bytes as f64 / stored as f64
    };

    InfoOutput {
        width,
        height,
        frames: stats.frames,
        raw_bytes: stats.raw_bytes,
        data_bytes: stats.data_bytes,
        index_bytes,
        trailing_bytes: stats.trailing_bytes,
        records: RecordInfo {
            new: stats.new_records,
            reuse: stats.reuse_records,
            new_bytes: stats.new_bytes,
            reuse_bytes: stats.reuse_bytes,
        },
        reuse_fraction: round2(reuse_fraction),
        ratio: round2(ratio),
        complete: stats.is_complete(height),
    }
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["dimensions".to_string(), format!("{}x{}", out.width, out.height)]);
            table.add_row(vec!["frames".to_string(), out.frames.to_string()]);
            table.add_row(vec!["raw bytes".to_string(), out.raw_bytes.to_string()]);
            table.add_row(vec!["data bytes".to_string(), out.data_bytes.to_string()]);
            table.add_row(vec!["index bytes".to_string(), out.index_bytes.to_string()]);
            table.add_row(vec!["new records".to_string(), out.records.new.to_string()]);
            table.add_row(vec!["reuse records".to_string(), out.records.reuse.to_string()]);
            table.add_row(vec!["ratio".to_string(), format!("{:.2}", out.ratio)]);
            table.add_row(vec!["trailing bytes".to_string(), out.trailing_bytes.to_string()]);
            table.add_row(vec!["complete".to_string(), out.complete.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Archive Info:");
            println!("  Dimensions:   {}x{}", out.width, out.height);
            println!("  Frames:       {}", out.frames);
            println!("  Raw size:     {} bytes", out.raw_bytes);
            println!(
                "  Stored size:  {} bytes (data {}, index {})",
                out.data_bytes + out.index_bytes,
                out.data_bytes,
                out.index_bytes
            );
            println!(
                "  Records:      {} new ({} bytes), {} reuse ({} bytes)",
                out.records.new, out.records.new_bytes, out.records.reuse, out.records.reuse_bytes
            );
            println!("  Reused rows:  {:.0}%", out.reuse_fraction * 100.0);
            println!("  Ratio:        {:.2}", out.ratio);
            if !out.complete {
                println!(
                    "  Warning:      last frame incomplete ({} trailing bytes)",
                    out.trailing_bytes
                );
            }
        }
        OutputFormat::Raw => {
            println!("{}x{} {}", out.width, out.height, out.frames);
        }
    }
}
