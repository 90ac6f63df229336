use clap::{Args, Subcommand};
use scanpop_archive::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_REFERENCE_DEPTH};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod info;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Archive a raw frame stream.
    Encode(EncodeArgs),
    /// Reproduce the raw frame stream from an archive.
    Decode(DecodeArgs),
    /// Show archive dimensions, record counts and compression.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct ArchivePaths {
    /// Data file of scanline records.
    #[arg(long, value_name = "PATH")]
    pub data: PathBuf,
    /// Index file of dimensions and frame offsets.
    #[arg(long, value_name = "PATH")]
    pub index: PathBuf,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Raw frame stream to read ("-" for stdin).
    pub input: PathBuf,
    #[command(flatten)]
    pub archive: ArchivePaths,
    /// Frame width. Without --width/--height the input must open with a
    /// 4-byte dimension header.
    #[arg(long, requires = "height")]
    pub width: Option<u16>,
    /// Frame height.
    #[arg(long, requires = "width")]
    pub height: Option<u16>,
    /// Distinct scanlines remembered for reuse.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "SCANPOP_CACHE_CAPACITY")]
    pub cache_capacity: usize,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub archive: ArchivePaths,
    /// Output file ("-" or omitted for stdout).
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Prefix the output with the 4-byte dimension header.
    #[arg(long)]
    pub with_header: bool,
    /// First frame to decode.
    #[arg(long, default_value_t = 0)]
    pub first: usize,
    /// Number of frames to decode. Default: through the last frame.
    #[arg(long)]
    pub count: Option<usize>,
    /// Back-reference hops followed per scanline.
    #[arg(long, default_value_t = DEFAULT_MAX_REFERENCE_DEPTH)]
    pub max_reference_depth: usize,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub archive: ArchivePaths,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// `-` names the standard stream.
pub fn is_std_stream(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}
