#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rill_decoder::CborDecoder;
use rill_driver::{PumpConfig, collect_tokens};
use rill_types::token::coalesce;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    read_limit: u8,
    write_limit: u8,
    capacity: u8,
    item: Vec<u8>,
}

// Fuzz target: CBOR tokens under starvation.
//
// Tokenizes the same bytes with a roomy sink and with tight per-call
// limits. Successful runs must agree after coalescing split content.
fuzz_target!(|input: FuzzInput| {
    let roomy = collect_tokens(&mut CborDecoder::new(), &input.item[..], &PumpConfig::default(), 256);
    let config = PumpConfig::default().with_limits(
        Some(usize::from(input.read_limit).max(1)),
        Some(usize::from(input.write_limit).max(1)),
    );
    let tight = collect_tokens(
        &mut CborDecoder::new(),
        &input.item[..],
        &config,
        usize::from(input.capacity).max(1),
    );
    match (roomy, tight) {
        (Ok(x), Ok(y)) => assert_eq!(coalesce(&x), coalesce(&y)),
        (Err(x), Err(y)) => assert_eq!(
            x.decode_error().map(|e| e.class()),
            y.decode_error().map(|e| e.class())
        ),
        (x, y) => panic!("outcomes differ: {x:?} vs {y:?}"),
    }
});
