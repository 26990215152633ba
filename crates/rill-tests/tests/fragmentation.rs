//! Fragmentation properties: the result of a decode never depends on how
//! the input arrives or how much room each call gets.
//!
//! Inputs are fed through a reader that hands out at most `chunk` bytes per
//! read, and every decoder call is capped by random read and write limits.
//! Transform output must match a one-shot decode byte for byte; token
//! streams must match after [`coalesce`], since content tokens are sized by
//! whatever input a call happened to see.

use std::io::{self, Read};
use std::path::Path;

use proptest::prelude::*;
use rill_decoder::{CborDecoder, GzipDecoder, Inflater, ZlibDecoder, ZstdDecoder};
use rill_driver::{PumpConfig, collect_tokens, pump_transform};
use rill_types::TransformDecoder;
use rill_types::token::coalesce;

fn golden(subpath: &str) -> Vec<u8> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    std::fs::read(manifest_dir.join("tests/golden").join(subpath)).unwrap()
}

/// Hands out at most `chunk` bytes per read.
struct Chunked<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for Chunked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn config(input_len: usize, read_limit: usize, write_limit: usize) -> PumpConfig {
    PumpConfig {
        input_buffer_len: input_len,
        output_buffer_len: 4 * write_limit,
        ..PumpConfig::default()
    }
    .with_limits(Some(read_limit), Some(write_limit))
}

fn decoder(format: usize) -> (Box<dyn TransformDecoder>, &'static str) {
    match format {
        0 => (Box::new(ZlibDecoder::new()), "text/plain.zlib"),
        1 => (Box::new(GzipDecoder::new()), "text/plain.gz"),
        2 => (Box::new(Inflater::new()), "text/plain.deflate"),
        3 => (Box::new(Inflater::new()), "text/plain.stored.deflate"),
        _ => (Box::new(ZstdDecoder::new()), "text/plain.zst"),
    }
}

/// Append a CBOR head of major type `major` with argument `n`.
fn head(out: &mut Vec<u8>, major: u8, n: u64) {
    let m = major << 5;
    match n {
        0..=23 => out.push(m | n as u8),
        24..=0xFF => out.extend([m | 24, n as u8]),
        0x100..=0xFFFF => {
            out.push(m | 25);
            out.extend((n as u16).to_be_bytes());
        }
        _ => {
            out.push(m | 26);
            out.extend((n as u32).to_be_bytes());
        }
    }
}

/// An item mixing long definite strings, chunked strings and nesting.
fn cbor_sample() -> Vec<u8> {
    let mut out = Vec::new();
    head(&mut out, 4, 4);

    let text = "resumable ".repeat(30);
    head(&mut out, 3, text.len() as u64);
    out.extend(text.as_bytes());

    head(&mut out, 5, 1);
    head(&mut out, 0, 1_000_000);
    out.push(0x5F);
    for len in [200u64, 5, 0] {
        head(&mut out, 2, len);
        out.extend((0..len).map(|i| i as u8));
    }
    out.push(0xFF);

    out.push(0x9F);
    out.extend([0xC1, 0x1A, 0x5F, 0x00, 0x00, 0x00]);
    out.extend([0xFB, 0x40, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18]);
    out.push(0xFF);

    head(&mut out, 1, 499);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn transform_output_ignores_chunking(
        format in 0usize..5,
        chunk in 1usize..300,
        input_len in 1usize..512,
        read_limit in 1usize..64,
        write_limit in 1usize..200,
    ) {
        let (mut dec, fixture) = decoder(format);
        let input = golden(fixture);
        let mut out = Vec::new();
        let report = pump_transform(
            &mut dec,
            Chunked { data: &input, chunk },
            &mut out,
            &config(input_len, read_limit, write_limit),
        )
        .unwrap();
        prop_assert_eq!(out, golden("text/plain.txt"));
        prop_assert_eq!(report.bytes_in, input.len() as u64);
    }

    #[test]
    fn tokens_ignore_chunking(
        chunk in 1usize..100,
        input_len in 1usize..256,
        read_limit in 1usize..32,
        write_limit in 1usize..8,
        capacity in 1usize..8,
    ) {
        let input = cbor_sample();
        let whole = collect_tokens(
            &mut CborDecoder::new(),
            &input[..],
            &PumpConfig::default(),
            256,
        )
        .unwrap();
        let pieces = collect_tokens(
            &mut CborDecoder::new(),
            Chunked { data: &input, chunk },
            &config(input_len, read_limit, write_limit),
            capacity,
        )
        .unwrap();
        prop_assert_eq!(coalesce(&pieces), coalesce(&whole));

        let covered: u64 = pieces.iter().map(|t| t.length).sum();
        prop_assert_eq!(covered, input.len() as u64);
    }
}
