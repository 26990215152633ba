#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rill_decoder::{GzipDecoder, Inflater, ZlibDecoder};
use rill_driver::{PumpConfig, pump_transform};
use rill_types::TransformDecoder;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    format: u8,
    read_limit: u8,
    write_limit: u8,
    stream: Vec<u8>,
}

fn decoder(format: u8) -> Box<dyn TransformDecoder> {
    match format % 3 {
        0 => Box::new(Inflater::new()),
        1 => Box::new(ZlibDecoder::new()),
        _ => Box::new(GzipDecoder::new()),
    }
}

// Fuzz target: starved vs unconstrained decoding.
//
// Runs the same stream once with default buffers and once with per-call
// limits as small as one byte. Both runs must produce the same bytes and
// fail (or not) with the same error.
fuzz_target!(|input: FuzzInput| {
    let whole_config = PumpConfig::default();
    let starved_config = PumpConfig {
        input_buffer_len: 64,
        output_buffer_len: 64,
        ..PumpConfig::default()
    }
    .with_limits(
        Some(usize::from(input.read_limit).max(1)),
        Some(usize::from(input.write_limit).max(1)),
    );

    let mut whole = Vec::new();
    let a = pump_transform(&mut decoder(input.format), &input.stream[..], &mut whole, &whole_config);
    let mut starved = Vec::new();
    let b = pump_transform(&mut decoder(input.format), &input.stream[..], &mut starved, &starved_config);

    assert_eq!(whole, starved);
    match (a, b) {
        (Ok(x), Ok(y)) => assert_eq!(x.bytes_out, y.bytes_out),
        (Err(x), Err(y)) => assert_eq!(
            x.decode_error().map(|e| e.class()),
            y.decode_error().map(|e| e.class())
        ),
        (x, y) => panic!("outcomes differ: {x:?} vs {y:?}"),
    }
});
