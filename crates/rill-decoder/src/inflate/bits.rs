use rill_io::Reader;

/// LSB-first bit accumulator that survives across calls.
///
/// Bytes are pulled from the source only when a step needs more bits than
/// are held, so between steps fewer than 8 bits are ever buffered. That
/// keeps the byte-aligned trailer after a DEFLATE stream in the reader.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Bits {
  acc: u64,
  n: u32,
}

impl Bits {
  /// Pull bytes until at least `want` bits (at most 32) are held.
  /// Returns `false` if the source ran out first.
  pub(crate) fn fill(&mut self, src: &mut Reader<'_>, want: u32) -> bool {
    while self.n < want {
      match src.read_u8() {
        Some(b) => {
          self.acc |= u64::from(b) << self.n;
          self.n += 8;
        }
        None => return false,
      }
    }
    true
  }

  /// Pull exactly one more byte.
  pub(crate) fn pull(&mut self, src: &mut Reader<'_>) -> bool {
    let want = self.n + 8;
    self.fill(src, want)
  }

  pub(crate) fn held(&self) -> u32 {
    self.n
  }

  pub(crate) fn peek_all(&self) -> u64 {
    self.acc
  }

  pub(crate) fn consume(&mut self, count: u32) {
    self.acc >>= count;
    self.n -= count;
  }

  /// Remove and return the low `count` bits. Callers `fill` first.
  pub(crate) fn take(&mut self, count: u32) -> u32 {
    let v = (self.acc & ((1u64 << count) - 1)) as u32;
    self.consume(count);
    v
  }

  /// Drop bits up to the next byte boundary.
  pub(crate) fn align(&mut self) {
    self.consume(self.n % 8);
  }
}
