//! Golden fixture generator for the rill conformance test suite.
//!
//! This binary creates all fixture files under `tests/golden/`. The
//! committed fixtures were produced by the reference zlib, gzip and zstd
//! tools; rerunning this generator writes equivalent streams (same decoded
//! bytes, possibly different compressed bytes) through flate2 and zstd.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_golden -p rill-tests
//! ```
//!
//! # Generated fixtures
//!
//! | File                        | Contents                                   |
//! |-----------------------------|--------------------------------------------|
//! | text/plain.txt              | 400 lines of deterministic text            |
//! | text/plain.zlib             | zlib stream, best compression              |
//! | text/plain.deflate          | raw DEFLATE, default level                 |
//! | text/plain.stored.deflate   | raw DEFLATE, stored blocks only            |
//! | text/plain.gz               | gzip member with FNAME = "plain.txt"       |
//! | text/plain.zst              | zstd frame with content checksum           |
//! | dictionary/dict.txt         | preset dictionary                          |
//! | dictionary/payload.zlib     | zlib stream flagged FDICT                  |
//! | cbor/rfc8949.cbor           | CBOR sequence of RFC 8949 appendix items   |
//!
//! flate2's default backend cannot prime a compressor with history, so a
//! regenerated `dictionary/payload.zlib` carries the FDICT header and
//! dictionary id but a body that stands alone.

#![allow(clippy::pedantic)]

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::GzBuilder;
use flate2::write::{DeflateEncoder, ZlibEncoder};
use rill_hash::Adler32;

const WORDS: [&str; 16] = [
    "reader",
    "writer",
    "suspend",
    "resume",
    "token",
    "inflate",
    "window",
    "huffman",
    "checksum",
    "dictionary",
    "frame",
    "trailer",
    "header",
    "stream",
    "buffer",
    "status",
];

/// Items from RFC 8949 appendix A, concatenated as a CBOR sequence.
const CBOR_ITEMS: [&str; 9] = [
    "a26161016162820203",
    "9f018202039f0405ffff",
    "5f42010243030405ff",
    "c074323031332d30332d32315432303a30343a30305a",
    "fb3ff199999999999a",
    "f97c00",
    "bf6346756ef563416d7421ff",
    "3903e7",
    "f6",
];

fn main() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let golden_dir = manifest_dir.join("tests/golden");

    let plain = plain_text();
    generate_text(&golden_dir.join("text"), &plain);
    generate_dictionary(&golden_dir.join("dictionary"), &plain);
    generate_cbor(&golden_dir.join("cbor"));

    println!("All golden fixtures written to {}", golden_dir.display());
}

fn plain_text() -> Vec<u8> {
    let mut out = String::new();
    for i in 0..400usize {
        let first = WORDS[i % 16];
        let second = WORDS[(i * i + 3) % 16];
        out.push_str(&format!("{i:04} {first} {second}\n"));
    }
    out.into_bytes()
}

fn dictionary() -> Vec<u8> {
    WORDS.iter().flat_map(|w| w.bytes().chain([b' '])).collect()
}

fn write(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::create_dir_all(dir).expect("create fixture dir");
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    println!("  wrote {} ({} bytes)", path.display(), bytes.len());
}

fn deflate(plain: &[u8], level: Compression) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), level);
    enc.write_all(plain).expect("deflate");
    enc.finish().expect("deflate finish")
}

fn generate_text(dir: &Path, plain: &[u8]) {
    write(dir, "plain.txt", plain);

    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::best());
    zlib.write_all(plain).expect("zlib");
    write(dir, "plain.zlib", &zlib.finish().expect("zlib finish"));

    write(dir, "plain.deflate", &deflate(plain, Compression::default()));
    write(dir, "plain.stored.deflate", &deflate(plain, Compression::none()));

    let mut gz = GzBuilder::new()
        .filename("plain.txt")
        .mtime(0)
        .write(Vec::new(), Compression::best());
    gz.write_all(plain).expect("gzip");
    write(dir, "plain.gz", &gz.finish().expect("gzip finish"));

    let mut zst = zstd::stream::Encoder::new(Vec::new(), 19).expect("zstd encoder");
    zst.include_checksum(true).expect("zstd checksum flag");
    zst.write_all(plain).expect("zstd");
    write(dir, "plain.zst", &zst.finish().expect("zstd finish"));
}

fn generate_dictionary(dir: &Path, plain: &[u8]) {
    let dict = dictionary();
    write(dir, "dict.txt", &dict);

    let dict_id = Adler32::new().write(&dict);
    let plain_sum = Adler32::new().write(plain);

    // CMF 0x78 with FDICT set and FCHECK making the pair a multiple of 31.
    let cmf = 0x78u16;
    let flg = 0x20 | 0xC0;
    let flg = flg + (31 - ((cmf << 8) | flg) % 31) % 31;
    let mut out = vec![cmf as u8, flg as u8];
    out.extend_from_slice(&dict_id.to_be_bytes());
    out.extend_from_slice(&deflate(plain, Compression::best()));
    out.extend_from_slice(&plain_sum.to_be_bytes());
    write(dir, "payload.zlib", &out);
}

fn generate_cbor(dir: &Path) {
    let bytes: Vec<u8> = CBOR_ITEMS
        .iter()
        .flat_map(|item| hex::decode(item).expect("valid hex"))
        .collect();
    write(dir, "rfc8949.cbor", &bytes);
}
