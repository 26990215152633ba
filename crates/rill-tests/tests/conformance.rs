//! Conformance tests: golden fixtures decoded end to end.
//!
//! Every compressed fixture under `tests/golden/text/` decodes to the same
//! `plain.txt`, whichever container wraps it. The CBOR fixture is a
//! sequence of RFC 8949 appendix items; its token dump is pinned with an
//! inline insta snapshot, so any change in token shape, position or length
//! shows up as a snapshot diff.
//!
//! Fixtures are written by `src/bin/generate_golden.rs`:
//!
//! ```bash
//! cargo run --bin generate_golden -p rill-tests
//! ```

use std::fmt::Write as _;
use std::path::Path;

use insta::assert_snapshot;
use rill_decoder::{CborDecoder, GzipDecoder, Inflater, ZlibDecoder, ZstdDecoder};
use rill_driver::{PumpConfig, hash_reader, pump_transform};
use rill_hash::{Adler32, Crc32, Crc64};
use rill_io::{IoBuffer, TokenBuffer};
use rill_types::{Status, Suspension, Token, TokenDecoder, TransformDecoder};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn golden(subpath: &str) -> Vec<u8> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let path = manifest_dir.join("tests/golden").join(subpath);
    std::fs::read(&path)
        .unwrap_or_else(|e| panic!("failed to read golden fixture {}: {e}", path.display()))
}

fn decode(decoder: &mut dyn TransformDecoder, fixture: &str) -> Vec<u8> {
    let input = golden(fixture);
    let mut out = Vec::new();
    pump_transform(decoder, &input[..], &mut out, &PumpConfig::default())
        .unwrap_or_else(|e| panic!("decode of {fixture} failed: {e}"));
    out
}

/// Tokenize every item of a CBOR sequence, one decoder per item.
fn tokenize_sequence(input: &[u8]) -> Vec<Token> {
    let mut src = IoBuffer::reader_from(input, true);
    let mut sink = TokenBuffer::with_capacity(64);
    let mut tokens = Vec::new();
    while src.available_to_read() > 0 {
        let mut dec = CborDecoder::new();
        loop {
            let status = dec.decode_tokens(&mut sink.writer(), &mut src.reader(), &mut []);
            tokens.extend(sink.drain());
            match status {
                Status::Ok => break,
                Status::Suspended(Suspension::ShortWrite) => {}
                other => panic!("unexpected status {other:?}"),
            }
        }
    }
    tokens
}

fn dump(tokens: &[Token]) -> String {
    let mut out = String::new();
    for t in tokens {
        let more = if t.continued { " +" } else { "" };
        writeln!(out, "{:03} {:02} {:?}{more}", t.position, t.length, t.value).unwrap();
    }
    out
}

// ── Transforms ────────────────────────────────────────────────────────────────

#[test]
fn zlib_fixture() {
    let out = decode(&mut ZlibDecoder::new(), "text/plain.zlib");
    assert_eq!(out, golden("text/plain.txt"));
}

#[test]
fn gzip_fixture_with_file_name() {
    let out = decode(&mut GzipDecoder::new(), "text/plain.gz");
    assert_eq!(out, golden("text/plain.txt"));
}

#[test]
fn raw_deflate_fixture() {
    let out = decode(&mut Inflater::new(), "text/plain.deflate");
    assert_eq!(out, golden("text/plain.txt"));
}

#[test]
fn stored_blocks_fixture() {
    let out = decode(&mut Inflater::new(), "text/plain.stored.deflate");
    assert_eq!(out, golden("text/plain.txt"));
}

#[test]
fn zstd_fixture() {
    let out = decode(&mut ZstdDecoder::new(), "text/plain.zst");
    assert_eq!(out, golden("text/plain.txt"));
}

#[test]
fn dictionary_fixture() {
    let config = PumpConfig::default().with_dictionary(golden("dictionary/dict.txt"));
    let input = golden("dictionary/payload.zlib");
    let mut out = Vec::new();
    pump_transform(&mut ZlibDecoder::new(), &input[..], &mut out, &config).unwrap();
    assert_eq!(out, golden("text/plain.txt"));
}

// ── Checksums ─────────────────────────────────────────────────────────────────

#[test]
fn plain_text_checksums() {
    let plain = golden("text/plain.txt");
    let adler = hash_reader(&mut Adler32::new(), &plain[..], 1000).unwrap();
    let crc32 = hash_reader(&mut Crc32::new(), &plain[..], 7).unwrap();
    let crc64 = hash_reader(&mut Crc64::new(), &plain[..], 4096).unwrap();
    assert_eq!(adler, 0xF98A_DE1E);
    assert_eq!(crc32, 0x1A17_F769);
    assert_eq!(crc64, 0x65F9_A915_61AB_7A69);
}

#[test]
fn dictionary_id_is_its_adler32() {
    let dict = golden("dictionary/dict.txt");
    let id = hash_reader(&mut Adler32::new(), &dict[..], 16).unwrap();
    let input = golden("dictionary/payload.zlib");
    assert_eq!(&input[2..6], &(id as u32).to_be_bytes());
}

// ── CBOR ──────────────────────────────────────────────────────────────────────

#[test]
fn rfc8949_sequence_tokens() {
    let input = golden("cbor/rfc8949.cbor");
    let tokens = tokenize_sequence(&input);

    let covered: u64 = tokens.iter().map(|t| t.length).sum();
    assert_eq!(covered, input.len() as u64);

    assert_snapshot!(dump(&tokens), @r"
    000 01 Push { container: Map, len: Some(2) }
    001 01 Text(Header { len: Some(1) }) +
    002 01 Text(Content)
    003 01 Unsigned(1)
    004 01 Text(Header { len: Some(1) }) +
    005 01 Text(Content)
    006 01 Push { container: Array, len: Some(2) }
    007 01 Unsigned(2)
    008 01 Unsigned(3)
    009 00 Pop(Array)
    009 00 Pop(Map)
    009 01 Push { container: Array, len: None }
    010 01 Unsigned(1)
    011 01 Push { container: Array, len: Some(2) }
    012 01 Unsigned(2)
    013 01 Unsigned(3)
    014 00 Pop(Array)
    014 01 Push { container: Array, len: None }
    015 01 Unsigned(4)
    016 01 Unsigned(5)
    017 01 Pop(Array)
    018 01 Pop(Array)
    019 01 Bytes(Header { len: None }) +
    020 01 Bytes(Header { len: Some(2) }) +
    021 02 Bytes(Content) +
    023 01 Bytes(Header { len: Some(3) }) +
    024 03 Bytes(Content) +
    027 01 Bytes(End)
    028 01 Tag(0)
    029 01 Text(Header { len: Some(20) }) +
    030 20 Text(Content)
    050 09 Float { bits: 4607632778762754458, width: F64 }
    059 03 Float { bits: 31744, width: F16 }
    062 01 Push { container: Map, len: None }
    063 01 Text(Header { len: Some(3) }) +
    064 03 Text(Content)
    067 01 Literal(True)
    068 01 Text(Header { len: Some(3) }) +
    069 03 Text(Content)
    072 01 Negative(1)
    073 01 Pop(Map)
    074 03 Negative(999)
    077 01 Literal(Null)
    ");
}

#[test]
fn text_content_points_at_the_payload() {
    let input = golden("cbor/rfc8949.cbor");
    let tokens = tokenize_sequence(&input);
    let texts: Vec<Vec<u8>> = tokens
        .iter()
        .filter(|t| t.is_content())
        .filter_map(|t| t.bytes(&input))
        .map(<[u8]>::to_vec)
        .collect();
    let expected: Vec<Vec<u8>> = vec![
        b"a".to_vec(),
        b"b".to_vec(),
        vec![1, 2],
        vec![3, 4, 5],
        b"2013-03-21T20:04:00Z".to_vec(),
        b"Fun".to_vec(),
        b"Amt".to_vec(),
    ];
    assert_eq!(texts, expected);
}
