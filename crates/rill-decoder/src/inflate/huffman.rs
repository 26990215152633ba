use rill_io::Reader;
use rill_types::DecodeError;

use super::bits::Bits;

pub(crate) const MAX_BITS: usize = 15;

/// A canonical Huffman code, stored as per-length counts plus symbols in
/// code order.
///
/// Decoding walks one bit at a time, comparing against the first code of
/// each length. Nothing is consumed until a full code has been matched,
/// so a symbol split across calls decodes the same as an unsplit one.
#[derive(Clone, Debug)]
pub(crate) struct Huffman {
  counts: [u16; MAX_BITS + 1],
  symbols: Vec<u16>,
  max_len: u32,
}

/// How far a set of lengths is from a complete prefix code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fit {
  Complete,
  /// Some bit patterns decode to nothing.
  Incomplete,
  OverSubscribed,
}

impl Huffman {
  /// Build the code for `lengths` (zero means "symbol unused").
  pub(crate) fn new(lengths: &[u8]) -> (Self, Fit) {
    let mut counts = [0u16; MAX_BITS + 1];
    for &len in lengths {
      counts[usize::from(len)] += 1;
    }

    let mut left: i32 = 1;
    let mut fit = Fit::Complete;
    for &count in &counts[1..] {
      left <<= 1;
      left -= i32::from(count);
      if left < 0 {
        fit = Fit::OverSubscribed;
        break;
      }
    }
    if fit == Fit::Complete && left > 0 {
      fit = Fit::Incomplete;
    }

    let mut offsets = [0u16; MAX_BITS + 2];
    for len in 1..=MAX_BITS {
      offsets[len + 1] = offsets[len] + counts[len];
    }
    let used = usize::from(offsets[MAX_BITS + 1]);
    let mut symbols = vec![0u16; used];
    for (symbol, &len) in lengths.iter().enumerate() {
      if len != 0 {
        let slot = &mut offsets[usize::from(len)];
        symbols[usize::from(*slot)] = symbol as u16;
        *slot += 1;
      }
    }
    let max_len = (1..=MAX_BITS).rev().find(|&len| counts[len] != 0).unwrap_or(0) as u32;
    (
      Self {
        counts,
        symbols,
        max_len,
      },
      fit,
    )
  }

  /// Decode one symbol, pulling input bytes as needed.
  ///
  /// `Ok(None)` means the source ran out before a full code was seen; the
  /// bits already pulled stay in `bits` for the next attempt.
  pub(crate) fn decode(
    &self,
    bits: &mut Bits,
    src: &mut Reader<'_>,
  ) -> Result<Option<u16>, DecodeError> {
    loop {
      match self.lookup(bits.peek_all(), bits.held()) {
        Lookup::Symbol(symbol, len) => {
          bits.consume(len);
          return Ok(Some(symbol));
        }
        Lookup::NeedMore => {
          if !bits.pull(src) {
            return Ok(None);
          }
        }
        Lookup::Invalid => return Err(DecodeError::BadHuffmanCode),
      }
    }
  }

  fn lookup(&self, acc: u64, held: u32) -> Lookup {
    let mut code: i32 = 0;
    let mut first: i32 = 0;
    let mut index: i32 = 0;
    for len in 1..=self.max_len {
      if len > held {
        return Lookup::NeedMore;
      }
      code |= ((acc >> (len - 1)) & 1) as i32;
      let count = i32::from(self.counts[len as usize]);
      if code - first < count {
        return Lookup::Symbol(self.symbols[(index + code - first) as usize], len);
      }
      index += count;
      first += count;
      first <<= 1;
      code <<= 1;
    }
    Lookup::Invalid
  }
}

enum Lookup {
  Symbol(u16, u32),
  NeedMore,
  Invalid,
}
