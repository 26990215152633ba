//! Resumable raw DEFLATE (RFC 1951).

mod bits;
mod huffman;
mod window;

use rill_io::{Reader, Writer};
use rill_types::{DecodeError, Status, TransformDecoder};
use tracing::debug;

use self::bits::Bits;
use self::huffman::{Fit, Huffman};
use self::window::Window;
use crate::resume::{blocked, starved};

pub use self::window::WINDOW_LEN;

const LEN_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
  131, 163, 195, 227, 258,
];
const LEN_EXTRA: [u8; 29] = [
  0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const DIST_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
  2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DIST_EXTRA: [u8; 30] = [
  0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
  13,
];

/// Order in which code length code lengths are transmitted.
const CL_ORDER: [usize; 19] = [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

const MAX_LIT_CODES: usize = 286;
const MAX_DIST_CODES: usize = 30;

/// Where the decoder is within the DEFLATE grammar.
///
/// ```text
///   BlockHeader ─┬─ stored ──→ StoredLengths → Stored ─────────────┐
///                ├─ fixed ───────────────────────→ Codes ◄──┐      │
///                └─ dynamic → DynamicCounts                 │      │
///                             → CodeLengthCodes             │      │
///                             → CodeLengths ⇄ Repeat ──→ Codes     │
///   Codes → LengthExtra → Distance → DistanceExtra → Copy ──┘      │
///   Codes → Literal (output full) ──→ Codes                        │
///   end of block ──→ BlockHeader, or Done after the last block ◄───┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  BlockHeader,
  StoredLengths,
  Stored { remaining: usize },
  DynamicCounts,
  CodeLengthCodes { index: usize },
  CodeLengths { index: usize },
  Repeat { symbol: u16, index: usize },
  Codes,
  /// A decoded literal waiting for output room.
  Literal { byte: u8 },
  LengthExtra { symbol: u16 },
  Distance { length: usize },
  DistanceExtra { length: usize, symbol: u16 },
  Copy { length: usize, distance: usize },
  Done,
}

/// Resumable raw DEFLATE decoder.
///
/// All progress (bit accumulator, Huffman tables, 32 KiB history, a
/// partially copied match) is kept in the struct, so input and output can
/// be fed and drained in pieces of any size.
///
/// Raw DEFLATE carries no checksum, so
/// [`set_ignore_checksum`](TransformDecoder::set_ignore_checksum) has no
/// effect. [`set_dictionary`](TransformDecoder::set_dictionary) primes the
/// history without any note being raised.
#[derive(Clone, Debug)]
pub struct Inflater {
  state: State,
  bits: Bits,
  last: bool,
  window: Window,
  lit: Huffman,
  dist: Huffman,
  cl: Huffman,
  hlit: usize,
  hdist: usize,
  hclen: usize,
  cl_lengths: [u8; 19],
  lengths: [u8; MAX_LIT_CODES + MAX_DIST_CODES],
  total_out: u64,
}

impl Default for Inflater {
  fn default() -> Self {
    Self::new()
  }
}

impl Inflater {
  #[must_use]
  pub fn new() -> Self {
    Self {
      state: State::BlockHeader,
      bits: Bits::default(),
      last: false,
      window: Window::new(),
      lit: Huffman::new(&[]).0,
      dist: Huffman::new(&[]).0,
      cl: Huffman::new(&[]).0,
      hlit: 0,
      hdist: 0,
      hclen: 0,
      cl_lengths: [0; 19],
      lengths: [0; MAX_LIT_CODES + MAX_DIST_CODES],
      total_out: 0,
    }
  }

  /// True once the final block has been fully decoded.
  pub fn is_done(&self) -> bool {
    self.state == State::Done
  }

  /// Bytes produced so far.
  pub fn total_out(&self) -> u64 {
    self.total_out
  }

  /// Prime the history with the last 32 KiB of `dictionary`.
  pub fn prime(&mut self, dictionary: &[u8]) {
    self.window.extend(dictionary);
  }

  /// Decode until the last block ends or a view blocks.
  ///
  /// Once done, any bits left over in the final byte are padding, so the
  /// next byte in `src` is the first byte after the DEFLATE stream.
  pub fn inflate(&mut self, dst: &mut Writer<'_>, src: &mut Reader<'_>) -> Status {
    loop {
      match self.step(dst, src) {
        Ok(None) => {}
        Ok(Some(status)) => return status,
        Err(e) => return Status::Error(e),
      }
    }
  }

  #[allow(clippy::too_many_lines)]
  fn step(
    &mut self,
    dst: &mut Writer<'_>,
    src: &mut Reader<'_>,
  ) -> Result<Option<Status>, DecodeError> {
    let state = self.state;
    match state {
      State::Done => return Ok(Some(Status::Ok)),

      State::BlockHeader => {
        if !self.bits.fill(src, 3) {
          return Ok(Some(starved(src)));
        }
        self.last = self.bits.take(1) == 1;
        let kind = self.bits.take(2);
        debug!(kind, last = self.last, total_out = self.total_out, "deflate block");
        self.state = match kind {
          0 => {
            self.bits.align();
            State::StoredLengths
          }
          1 => {
            self.use_fixed_codes();
            State::Codes
          }
          2 => State::DynamicCounts,
          _ => return Err(DecodeError::BadBlockType(3)),
        };
      }

      State::StoredLengths => {
        if !self.bits.fill(src, 32) {
          return Ok(Some(starved(src)));
        }
        let len = self.bits.take(16) as u16;
        let nlen = self.bits.take(16) as u16;
        if len != !nlen {
          return Err(DecodeError::BadStoredLength { len, nlen });
        }
        self.state = if len == 0 {
          self.end_of_block()
        } else {
          State::Stored {
            remaining: usize::from(len),
          }
        };
      }

      State::Stored { remaining } => {
        if let Some(status) = blocked(src, dst.available_to_write()) {
          return Ok(Some(status));
        }
        let chunk = src.take(remaining.min(dst.available_to_write()));
        dst.write_slice(chunk);
        self.window.extend(chunk);
        self.total_out += chunk.len() as u64;
        let remaining = remaining - chunk.len();
        self.state = if remaining == 0 {
          self.end_of_block()
        } else {
          State::Stored { remaining }
        };
      }

      State::DynamicCounts => {
        if !self.bits.fill(src, 14) {
          return Ok(Some(starved(src)));
        }
        self.hlit = self.bits.take(5) as usize + 257;
        self.hdist = self.bits.take(5) as usize + 1;
        self.hclen = self.bits.take(4) as usize + 4;
        if self.hlit > MAX_LIT_CODES || self.hdist > MAX_DIST_CODES {
          return Err(DecodeError::BadCodeLengths(
            "too many length or distance codes",
          ));
        }
        self.cl_lengths = [0; 19];
        self.state = State::CodeLengthCodes { index: 0 };
      }

      State::CodeLengthCodes { index } if index == self.hclen => {
        let (cl, fit) = Huffman::new(&self.cl_lengths);
        if fit != Fit::Complete {
          return Err(DecodeError::BadCodeLengths(
            "code length code is not complete",
          ));
        }
        self.cl = cl;
        self.lengths = [0; MAX_LIT_CODES + MAX_DIST_CODES];
        self.state = State::CodeLengths { index: 0 };
      }

      State::CodeLengthCodes { index } => {
        if !self.bits.fill(src, 3) {
          return Ok(Some(starved(src)));
        }
        self.cl_lengths[CL_ORDER[index]] = self.bits.take(3) as u8;
        self.state = State::CodeLengthCodes { index: index + 1 };
      }

      State::CodeLengths { index } if index == self.hlit + self.hdist => {
        self.build_dynamic_codes()?;
        self.state = State::Codes;
      }

      State::CodeLengths { index } => {
        let Some(symbol) = self.cl.decode(&mut self.bits, src)? else {
          return Ok(Some(starved(src)));
        };
        self.state = match symbol {
          0..=15 => {
            self.lengths[index] = symbol as u8;
            State::CodeLengths { index: index + 1 }
          }
          16 if index == 0 => {
            return Err(DecodeError::BadCodeLengths(
              "repeat with no previous length",
            ));
          }
          _ => State::Repeat { symbol, index },
        };
      }

      State::Repeat { symbol, index } => {
        let (extra, base) = match symbol {
          16 => (2, 3),
          17 => (3, 3),
          _ => (7, 11),
        };
        if !self.bits.fill(src, extra) {
          return Ok(Some(starved(src)));
        }
        let count = base + self.bits.take(extra) as usize;
        let end = index + count;
        if end > self.hlit + self.hdist {
          return Err(DecodeError::BadCodeLengths(
            "repeat runs past the last code length",
          ));
        }
        let value = if symbol == 16 {
          self.lengths[index - 1]
        } else {
          0
        };
        self.lengths[index..end].fill(value);
        self.state = State::CodeLengths { index: end };
      }

      State::Codes => {
        let Some(symbol) = self.lit.decode(&mut self.bits, src)? else {
          return Ok(Some(starved(src)));
        };
        match symbol {
          0..=255 => {
            let byte = symbol as u8;
            if dst.available_to_write() == 0 {
              self.state = State::Literal { byte };
              return Ok(Some(Status::SHORT_WRITE));
            }
            self.emit(dst, byte);
          }
          256 => self.state = self.end_of_block(),
          257..=285 => self.state = State::LengthExtra { symbol },
          _ => return Err(DecodeError::BadHuffmanCode),
        }
      }

      State::Literal { byte } => {
        if dst.available_to_write() == 0 {
          return Ok(Some(Status::SHORT_WRITE));
        }
        self.emit(dst, byte);
        self.state = State::Codes;
      }

      State::LengthExtra { symbol } => {
        let i = usize::from(symbol - 257);
        let extra = u32::from(LEN_EXTRA[i]);
        if !self.bits.fill(src, extra) {
          return Ok(Some(starved(src)));
        }
        let length = usize::from(LEN_BASE[i]) + self.bits.take(extra) as usize;
        self.state = State::Distance { length };
      }

      State::Distance { length } => {
        let Some(symbol) = self.dist.decode(&mut self.bits, src)? else {
          return Ok(Some(starved(src)));
        };
        if usize::from(symbol) >= MAX_DIST_CODES {
          return Err(DecodeError::BadHuffmanCode);
        }
        self.state = State::DistanceExtra { length, symbol };
      }

      State::DistanceExtra { length, symbol } => {
        let i = usize::from(symbol);
        let extra = u32::from(DIST_EXTRA[i]);
        if !self.bits.fill(src, extra) {
          return Ok(Some(starved(src)));
        }
        let distance = usize::from(DIST_BASE[i]) + self.bits.take(extra) as usize;
        if distance > self.window.filled() {
          return Err(DecodeError::BadDistance {
            distance,
            available: self.window.filled(),
          });
        }
        self.state = State::Copy { length, distance };
      }

      State::Copy { length, distance } => {
        let room = dst.available_to_write();
        if room == 0 {
          return Ok(Some(Status::SHORT_WRITE));
        }
        let n = length.min(room);
        for _ in 0..n {
          let b = self.window.back(distance);
          self.window.push(b);
          dst.write_u8(b);
        }
        self.total_out += n as u64;
        self.state = if n == length {
          State::Codes
        } else {
          State::Copy {
            length: length - n,
            distance,
          }
        };
      }
    }
    Ok(None)
  }

  fn emit(&mut self, dst: &mut Writer<'_>, byte: u8) {
    dst.write_u8(byte);
    self.window.push(byte);
    self.total_out += 1;
  }

  fn end_of_block(&self) -> State {
    if self.last {
      debug!(total_out = self.total_out, "deflate stream complete");
      State::Done
    } else {
      State::BlockHeader
    }
  }

  fn use_fixed_codes(&mut self) {
    let mut lengths = [0u8; 288];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);
    self.lit = Huffman::new(&lengths).0;
    self.dist = Huffman::new(&[5; 30]).0;
  }

  fn build_dynamic_codes(&mut self) -> Result<(), DecodeError> {
    let (lit_lengths, dist_lengths) = self.lengths[..self.hlit + self.hdist].split_at(self.hlit);
    if lit_lengths[256] == 0 {
      return Err(DecodeError::BadCodeLengths("missing end-of-block code"));
    }
    let (lit, fit) = Huffman::new(lit_lengths);
    if !usable(fit, lit_lengths) {
      return Err(DecodeError::BadCodeLengths(
        "literal/length code is over-subscribed or incomplete",
      ));
    }
    let (dist, fit) = Huffman::new(dist_lengths);
    if !usable(fit, dist_lengths) {
      return Err(DecodeError::BadCodeLengths(
        "distance code is over-subscribed or incomplete",
      ));
    }
    self.lit = lit;
    self.dist = dist;
    Ok(())
  }
}

/// An incomplete code is only acceptable when it holds at most a single
/// one-bit code.
fn usable(fit: Fit, lengths: &[u8]) -> bool {
  match fit {
    Fit::Complete => true,
    Fit::Incomplete => lengths.iter().all(|&len| len <= 1),
    Fit::OverSubscribed => false,
  }
}

impl TransformDecoder for Inflater {
  fn set_ignore_checksum(&mut self, _ignore: bool) {}

  fn set_dictionary(&mut self, dictionary: &[u8]) {
    self.prime(dictionary);
  }

  fn transform(
    &mut self,
    dst: &mut Writer<'_>,
    src: &mut Reader<'_>,
    _scratch: &mut [u8],
  ) -> Status {
    self.inflate(dst, src)
  }
}
