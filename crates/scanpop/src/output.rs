use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use scanpop_archive::WriteSummary;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EncodeOutput {
    width: u16,
    height: u16,
    frames: u64,
    raw_bytes: u64,
    data_bytes: u64,
    index_bytes: u64,
    new_records: u64,
    reuse_records: u64,
    cache_hits: u64,
    cache_misses: u64,
    cache_evictions: u64,
    ratio: f64,
}

impl From<&WriteSummary> for EncodeOutput {
    fn from(summary: &WriteSummary) -> Self {
        Self {
            width: summary.dimensions.width(),
            height: summary.dimensions.height(),
            frames: summary.frames,
            raw_bytes: summary.raw_bytes(),
            data_bytes: summary.data_bytes,
            index_bytes: summary.index_bytes,
            new_records: summary.new_records,
            reuse_records: summary.reuse_records,
            cache_hits: summary.cache.hits,
            cache_misses: summary.cache.misses,
            cache_evictions: summary.cache.evictions,
            ratio: round2(summary.ratio()),
        }
    }
}

pub fn print_write_summary(summary: &WriteSummary, format: OutputFormat) {
    let out = EncodeOutput::from(summary);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DIMENSIONS", "FRAMES", "RAW", "STORED", "NEW", "REUSE", "RATIO"])
                .add_row(vec![
                    format!("{}x{}", out.width, out.height),
                    out.frames.to_string(),
                    out.raw_bytes.to_string(),
                    (out.data_bytes + out.index_bytes).to_string(),
                    out.new_records.to_string(),
                    out.reuse_records.to_string(),
                    format!("{:.2}", out.ratio),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frames={} dims={}x{} raw={} data={} index={} new={} reuse={} evictions={} ratio={:.2}",
                out.frames,
                out.width,
                out.height,
                out.raw_bytes,
                out.data_bytes,
                out.index_bytes,
                out.new_records,
                out.reuse_records,
                out.cache_evictions,
                out.ratio
            );
        }
        OutputFormat::Raw => {
            println!("{}", out.frames);
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Round to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use scanpop_archive::{CacheStats, Dimensions};

    use super::*;

    #[test]
    fn encode_output_carries_cache_counters() {
        let summary = WriteSummary {
            dimensions: Dimensions::new(4, 1).unwrap(),
            frames: 2,
            data_bytes: 14,
            index_bytes: 20,
            new_records: 1,
            reuse_records: 1,
            cache: CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0,
            },
        };
        let out = EncodeOutput::from(&summary);
        assert_eq!(out.raw_bytes, 8);
        assert_eq!(out.cache_hits, 1);
        assert_eq!(out.ratio, round2(8.0 / 34.0));
    }

    #[test]
    fn round2_truncates_noise() {
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
