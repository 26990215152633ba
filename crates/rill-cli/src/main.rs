/// rill command-line tool: checksum files, unpack compressed streams and
/// dump CBOR token streams, all through the resumable decoders.
///
/// # Command overview
///
/// ```text
/// rill <COMMAND> [OPTIONS] [FILE]
///
/// Commands:
///   checksum   Print the Adler-32, CRC-32 or CRC-64 of a file
///   inflate    Decode a zlib, gzip, raw DEFLATE or zstd stream to stdout
///   tokens     Print one line per CBOR token
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Raise the log level (-v debug, -vv trace)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// FILE defaults to stdin; `-` also means stdin.
///
/// # Exit codes
///
/// | Code | Meaning                                    |
/// |------|--------------------------------------------|
/// | 0    | Success                                    |
/// | 1    | Error (I/O failure, corrupt stream, etc.)  |
///
/// Logs and error details go to stderr so stdout can be piped cleanly.
/// `RUST_LOG` takes precedence over `-v`.
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod cmd_checksum;
mod cmd_inflate;
mod cmd_tokens;
mod input;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rill", version, about = "Resumable checksums and stream decoders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Raise the log level. Repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print the checksum of a file in hex.
    Checksum(ChecksumArgs),
    /// Decode a compressed stream to stdout.
    Inflate(InflateArgs),
    /// Print one line per CBOR token.
    Tokens(TokensArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Algo {
    Adler32,
    Crc32,
    Crc64,
}

/// Arguments for `rill checksum`.
#[derive(clap::Args)]
pub struct ChecksumArgs {
    /// Checksum algorithm.
    #[arg(long, value_enum, default_value = "crc32")]
    pub algo: Algo,

    /// File to hash (stdin when absent).
    pub file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Pick from the first bytes: gzip magic, zstd magic, a valid zlib
    /// header, else raw DEFLATE.
    Auto,
    Zlib,
    Gzip,
    Deflate,
    Zstd,
}

/// Arguments for `rill inflate`.
///
/// ```text
/// ┌───────────────────┬──────────────────────────────────────────────────┐
/// │ Flag              │ Effect                                           │
/// ├───────────────────┼──────────────────────────────────────────────────┤
/// │ --format          │ auto (default) | zlib | gzip | deflate | zstd    │
/// │ --ignore-checksum │ Accept streams whose trailer does not match      │
/// │ --dict FILE       │ Preset dictionary, installed when asked for      │
/// │ --read-limit N    │ Offer at most N input bytes per decoder call     │
/// │ --write-limit N   │ Offer at most N output bytes per decoder call    │
/// │ -o / --output     │ Write to a file instead of stdout                │
/// └───────────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InflateArgs {
    /// Stream format.
    #[arg(long, value_enum, default_value = "auto")]
    pub format: Format,

    /// Do not fail on checksum mismatches.
    #[arg(long)]
    pub ignore_checksum: bool,

    /// Preset dictionary file.
    #[arg(long, value_name = "FILE")]
    pub dict: Option<PathBuf>,

    /// Per-call input limit in bytes.
    #[arg(long, value_name = "N")]
    pub read_limit: Option<usize>,

    /// Per-call output limit in bytes.
    #[arg(long, value_name = "N")]
    pub write_limit: Option<usize>,

    /// Write decoded bytes to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compressed input (stdin when absent).
    pub file: Option<PathBuf>,
}

/// Arguments for `rill tokens`.
#[derive(clap::Args)]
pub struct TokensArgs {
    /// Token sink capacity. Smaller values mean more decoder calls, never
    /// different tokens.
    #[arg(long, default_value_t = 256)]
    pub capacity: usize,

    /// Per-call input limit in bytes.
    #[arg(long, value_name = "N")]
    pub read_limit: Option<usize>,

    /// Emit one JSON object per line instead of text.
    #[arg(long)]
    pub json: bool,

    /// CBOR input (stdin when absent).
    pub file: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Checksum(args) => cmd_checksum::run(&args),
        Commands::Inflate(args) => cmd_inflate::run(&args),
        Commands::Tokens(args) => cmd_tokens::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_inflate_flags() {
        let cli = Cli::try_parse_from([
            "rill",
            "-vv",
            "inflate",
            "--format",
            "gzip",
            "--ignore-checksum",
            "--read-limit",
            "3",
            "in.gz",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Inflate(args) = cli.command else {
            panic!("expected inflate");
        };
        assert_eq!(args.format, Format::Gzip);
        assert!(args.ignore_checksum);
        assert_eq!(args.read_limit, Some(3));
        assert_eq!(args.file, Some(PathBuf::from("in.gz")));
    }
}
