#![no_main]

use libfuzzer_sys::fuzz_target;
use rill_decoder::CborDecoder;
use rill_io::{IoBuffer, TokenBuffer};
use rill_types::{Status, TokenDecoder};

// Fuzz target: CBOR tokenizer over a closed input.
//
// Whatever the bytes, the decoder must stop with Ok or an error (a closed
// input can never be a short read), and the tokens emitted must account
// for exactly the bytes consumed.
fuzz_target!(|data: &[u8]| {
    let mut src = IoBuffer::reader_from(data, true);
    let mut sink = TokenBuffer::with_capacity(32);
    let mut dec = CborDecoder::new();
    let mut covered = 0u64;
    loop {
        let status = dec.decode_tokens(&mut sink.writer(), &mut src.reader(), &mut []);
        covered += sink.drain().map(|t| t.length).sum::<u64>();
        match status {
            Status::SHORT_WRITE => {}
            Status::Ok => {
                assert_eq!(covered, src.reader_position());
                break;
            }
            Status::Error(_) => {
                assert!(covered <= src.reader_position());
                break;
            }
            other => panic!("closed input suspended with {other:?}"),
        }
    }
});
