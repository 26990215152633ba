#![no_main]

use libfuzzer_sys::fuzz_target;
use rill_hash::{Adler32, Crc32, Crc64};
use rill_types::Hasher;

fn split_equals_whole(hasher: &mut dyn Hasher, data: &[u8], at: usize) {
    hasher.initialize();
    let whole = hasher.update(data);
    hasher.initialize();
    hasher.update(&data[..at]);
    let split = hasher.update(&data[at..]);
    assert_eq!(whole, split);
    assert_eq!(split, hasher.checksum_u64());
}

// Fuzz target: streaming checksums.
//
// Byte 0 picks a split point; hashing the two halves in sequence must give
// the same value as hashing the rest in one call.
fuzz_target!(|data: &[u8]| {
    let Some((&pick, rest)) = data.split_first() else {
        return;
    };
    let at = usize::from(pick).min(rest.len());
    split_equals_whole(&mut Adler32::new(), rest, at);
    split_equals_whole(&mut Crc32::new(), rest, at);
    split_equals_whole(&mut Crc64::new(), rest, at);
});
