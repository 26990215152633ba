/// Implementation of `rill inflate`.
///
/// Streams the input through the chosen decoder with
/// [`pump_transform`](rill_driver::pump_transform). Output is written as
/// it is produced, so a corrupt stream still leaves everything decoded
/// before the fault on stdout.
///
/// With `--format auto` the first four bytes pick the decoder:
///
/// ```text
///   1F 8B ..       gzip
///   28 B5 2F FD    zstd
///   valid CMF/FLG  zlib
///   anything else  raw DEFLATE
/// ```
use std::fs;
use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use rill_decoder::{GzipDecoder, Inflater, ZlibDecoder, ZstdDecoder};
use rill_driver::{PumpConfig, pump_transform};
use rill_types::TransformDecoder;
use tracing::debug;

use crate::{Format, InflateArgs, input};

/// # Errors
///
/// Returns an error if the input cannot be read, the output cannot be
/// written, or the stream fails to decode.
pub fn run(args: &InflateArgs) -> Result<()> {
    let name = input::display(args.file.as_ref());
    let mut reader = input::open(args.file.as_ref())?;

    let mut prefix = Vec::with_capacity(4);
    (&mut reader)
        .take(4)
        .read_to_end(&mut prefix)
        .with_context(|| format!("cannot read {name}"))?;
    let format = match args.format {
        Format::Auto => detect(&prefix),
        other => other,
    };
    debug!(?format, "decoding {name}");

    let mut config = PumpConfig::default()
        .with_limits(args.read_limit, args.write_limit)
        .with_ignore_checksum(args.ignore_checksum);
    if let Some(path) = &args.dict {
        let dict =
            fs::read(path).with_context(|| format!("cannot read dictionary {}", path.display()))?;
        config = config.with_dictionary(dict);
    }

    let mut decoder = new_decoder(format);
    let output = input::create(args.output.as_deref())?;
    let report = pump_transform(
        &mut decoder,
        Cursor::new(prefix).chain(reader),
        output,
        &config,
    )
    .with_context(|| format!("cannot decode {name} as {format:?}"))?;
    debug!(
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        calls = report.calls,
        suspensions = report.suspensions(),
        "done"
    );
    Ok(())
}

fn new_decoder(format: Format) -> Box<dyn TransformDecoder> {
    match format {
        Format::Gzip => Box::new(GzipDecoder::new()),
        Format::Zstd => Box::new(ZstdDecoder::new()),
        Format::Deflate => Box::new(Inflater::new()),
        Format::Zlib | Format::Auto => Box::new(ZlibDecoder::new()),
    }
}

fn detect(prefix: &[u8]) -> Format {
    match prefix {
        [0x1F, 0x8B, ..] => Format::Gzip,
        [0x28, 0xB5, 0x2F, 0xFD, ..] => Format::Zstd,
        [cmf, flg, ..]
            if cmf & 0x0F == 8 && cmf >> 4 <= 7 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0 =>
        {
            Format::Zlib
        }
        _ => Format::Deflate,
    }
}
