#![no_main]

use libfuzzer_sys::fuzz_target;
use rill_decoder::GzipDecoder;
use rill_io::IoBuffer;
use rill_types::TransformDecoder;

// Fuzz target: gzip member.
//
// Catches bugs in:
// - Optional header sections (FEXTRA, FNAME, FCOMMENT, FHCRC)
// - Trailer CRC-32 and ISIZE handling
fuzz_target!(|data: &[u8]| {
    let mut src = IoBuffer::reader_from(data, true);
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let _ = GzipDecoder::new().transform(&mut dst.writer(), &mut src.reader(), &mut []);
});
