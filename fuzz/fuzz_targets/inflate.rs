#![no_main]

use libfuzzer_sys::fuzz_target;
use rill_decoder::Inflater;
use rill_io::IoBuffer;
use rill_types::TransformDecoder;

// Fuzz target: raw DEFLATE.
//
// Catches bugs in:
// - Block header parsing (BTYPE, stored LEN/NLEN)
// - Dynamic Huffman table construction
// - Back-references reaching before the window start
// - Output views filling up mid-copy
fuzz_target!(|data: &[u8]| {
    let mut src = IoBuffer::reader_from(data, true);
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let _ = Inflater::new().transform(&mut dst.writer(), &mut src.reader(), &mut []);
});
