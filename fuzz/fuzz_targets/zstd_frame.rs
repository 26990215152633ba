#![no_main]

use libfuzzer_sys::fuzz_target;
use rill_decoder::ZstdDecoder;
use rill_io::IoBuffer;
use rill_types::TransformDecoder;

// Fuzz target: zstd frame wrapper.
//
// Catches bugs in:
// - Frame header staging and dictionary id extraction
// - Mapping codec failures onto decode errors
fuzz_target!(|data: &[u8]| {
    let mut src = IoBuffer::reader_from(data, true);
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let _ = ZstdDecoder::new().transform(&mut dst.writer(), &mut src.reader(), &mut []);
});
