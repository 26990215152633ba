#![no_main]

use libfuzzer_sys::fuzz_target;
use rill_decoder::ZlibDecoder;
use rill_io::IoBuffer;
use rill_types::{Note, Status, TransformDecoder};

// Fuzz target: zlib framing.
//
// Byte 0 selects whether a dictionary is installed when the stream asks
// for one; the rest is the stream.
fuzz_target!(|data: &[u8]| {
    let Some((&mode, stream)) = data.split_first() else {
        return;
    };
    let mut src = IoBuffer::reader_from(stream, true);
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let mut dec = ZlibDecoder::new();
    dec.set_ignore_checksum(mode & 2 != 0);
    let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
    if status == Status::Note(Note::DictionaryRequired) && mode & 1 != 0 {
        dec.set_dictionary(b"rill");
        let _ = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
    }
});
