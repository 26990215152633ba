/// Implementation of `rill checksum`.
///
/// Prints `<hex>  <name>`, zero-padded to the algorithm's width:
///
/// ```text
/// $ rill checksum --algo adler32 notes.txt
/// 11e60398  notes.txt
/// ```
use anyhow::{Context, Result};
use rill_driver::hash_reader;
use rill_hash::{Adler32, Crc32, Crc64};
use rill_types::Hasher;
use tracing::debug;

use crate::{Algo, ChecksumArgs, input};

const CHUNK: usize = 64 * 1024;

/// # Errors
///
/// Returns an error if the input cannot be opened or read.
pub fn run(args: &ChecksumArgs) -> Result<()> {
    let name = input::display(args.file.as_ref());
    let reader = input::open(args.file.as_ref())?;
    let mut hasher = new_hasher(args.algo);
    let sum = hash_reader(hasher.as_mut(), reader, CHUNK)
        .with_context(|| format!("cannot read {name}"))?;
    debug!(algo = ?args.algo, sum, "hashed {name}");
    println!("{}  {name}", format_sum(args.algo, sum));
    Ok(())
}

fn new_hasher(algo: Algo) -> Box<dyn Hasher> {
    match algo {
        Algo::Adler32 => Box::new(Adler32::new()),
        Algo::Crc32 => Box::new(Crc32::new()),
        Algo::Crc64 => Box::new(Crc64::new()),
    }
}

fn format_sum(algo: Algo, sum: u64) -> String {
    match algo {
        Algo::Adler32 | Algo::Crc32 => format!("{sum:08x}"),
        Algo::Crc64 => format!("{sum:016x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_are_padded_to_width() {
        assert_eq!(format_sum(Algo::Crc32, 0x1234), "00001234");
        assert_eq!(format_sum(Algo::Crc64, 0x1234), "0000000000001234");
    }

    #[test]
    fn boxed_hashers() {
        for (algo, want) in [
            (Algo::Adler32, 0x091E_01DE),
            (Algo::Crc32, 0xCBF4_3926),
            (Algo::Crc64, 0x995D_C9BB_DF19_39FA),
        ] {
            let mut hasher = new_hasher(algo);
            let sum = hash_reader(hasher.as_mut(), &b"123456789"[..], 3).unwrap();
            assert_eq!(sum, want, "{algo:?}");
        }
    }
}
