use rill_hash::Crc32;
use rill_io::{Reader, Writer};
use rill_types::{DecodeError, Status, TransformDecoder};
use tracing::debug;

use crate::inflate::Inflater;
use crate::resume::{Field, starved};

const MAGIC: [u8; 2] = [0x1F, 0x8B];

const FTEXT: u8 = 0x01;
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;
const FRESERVED: u8 = 0xE0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  Header,
  ExtraLen,
  Extra { remaining: usize },
  Name,
  Comment,
  HeaderCrc,
  Payload,
  Trailer,
  Done,
}

/// Resumable gzip (RFC 1952) member decoder.
///
/// The optional header fields (extra, file name, comment, header CRC) are
/// skipped. The trailer's CRC-32 and ISIZE are both checked against the
/// decoded bytes once all eight trailer bytes have arrived.
#[derive(Clone, Debug)]
pub struct GzipDecoder {
  state: State,
  flags: u8,
  header: Field<10>,
  extra_len: Field<2>,
  header_crc: Field<2>,
  trailer: Field<8>,
  inflater: Inflater,
  crc: Crc32,
  ignore_checksum: bool,
}

impl Default for GzipDecoder {
  fn default() -> Self {
    Self::new()
  }
}

impl GzipDecoder {
  #[must_use]
  pub fn new() -> Self {
    Self {
      state: State::Header,
      flags: 0,
      header: Field::default(),
      extra_len: Field::default(),
      header_crc: Field::default(),
      trailer: Field::default(),
      inflater: Inflater::new(),
      crc: Crc32::new(),
      ignore_checksum: false,
    }
  }

  /// Bytes of payload produced so far.
  pub fn total_out(&self) -> u64 {
    self.inflater.total_out()
  }

  /// Mark `done` as skipped and move to the next optional header section
  /// in on-disk order.
  fn after(&mut self, done: u8) -> State {
    self.flags &= !done;
    if self.flags & FEXTRA != 0 {
      State::ExtraLen
    } else if self.flags & FNAME != 0 {
      State::Name
    } else if self.flags & FCOMMENT != 0 {
      State::Comment
    } else if self.flags & FHCRC != 0 {
      State::HeaderCrc
    } else {
      State::Payload
    }
  }

  #[allow(clippy::too_many_lines)]
  fn step(
    &mut self,
    dst: &mut Writer<'_>,
    src: &mut Reader<'_>,
  ) -> Result<Option<Status>, DecodeError> {
    match self.state {
      State::Header => {
        if !self.header.fill(src) {
          return Ok(Some(starved(src)));
        }
        let h = *self.header.bytes();
        if h[..2] != MAGIC {
          return Err(DecodeError::BadHeader("missing gzip magic"));
        }
        if h[2] != 8 {
          return Err(DecodeError::BadHeader("compression method is not deflate"));
        }
        if h[3] & FRESERVED != 0 {
          return Err(DecodeError::BadHeader("reserved flag bits are set"));
        }
        self.flags = h[3];
        self.state = self.after(FTEXT);
      }

      State::ExtraLen => {
        if !self.extra_len.fill(src) {
          return Ok(Some(starved(src)));
        }
        let remaining = usize::from(u16::from_le_bytes(*self.extra_len.bytes()));
        self.state = State::Extra { remaining };
      }

      State::Extra { remaining: 0 } => self.state = self.after(FEXTRA),

      State::Extra { remaining } => {
        let skipped = src.take(remaining).len();
        if skipped == 0 {
          return Ok(Some(starved(src)));
        }
        self.state = State::Extra {
          remaining: remaining - skipped,
        };
      }

      State::Name | State::Comment => {
        let Some(b) = src.read_u8() else {
          return Ok(Some(starved(src)));
        };
        if b == 0 {
          self.state = if self.state == State::Name {
            self.after(FNAME)
          } else {
            self.after(FCOMMENT)
          };
        }
      }

      State::HeaderCrc => {
        if !self.header_crc.fill(src) {
          return Ok(Some(starved(src)));
        }
        self.state = self.after(FHCRC);
      }

      State::Payload => {
        let mark = dst.mark();
        let status = self.inflater.inflate(dst, src);
        self.crc.write(dst.written_since(mark));
        if status != Status::Ok {
          return Ok(Some(status));
        }
        self.state = State::Trailer;
      }

      State::Trailer => {
        if !self.trailer.fill(src) {
          return Ok(Some(starved(src)));
        }
        let t = self.trailer.bytes();
        let want_crc = u32::from_le_bytes([t[0], t[1], t[2], t[3]]);
        let want_size = u32::from_le_bytes([t[4], t[5], t[6], t[7]]);
        let got_crc = self.crc.checksum();
        // ISIZE is the length modulo 2^32.
        #[allow(clippy::cast_possible_truncation)]
        let got_size = self.inflater.total_out() as u32;
        if want_crc != got_crc || want_size != got_size {
          if !self.ignore_checksum {
            let (expected, computed) = if want_crc == got_crc {
              (want_size, got_size)
            } else {
              (want_crc, got_crc)
            };
            return Err(DecodeError::BadChecksum {
              expected: u64::from(expected),
              computed: u64::from(computed),
            });
          }
          debug!(want_crc, got_crc, want_size, got_size, "ignoring gzip trailer mismatch");
        }
        self.state = State::Done;
      }

      State::Done => return Ok(Some(Status::Ok)),
    }
    Ok(None)
  }
}

impl TransformDecoder for GzipDecoder {
  fn set_ignore_checksum(&mut self, ignore: bool) {
    self.ignore_checksum = ignore;
  }

  /// gzip has no dictionary signalling; the bytes just prime the history.
  fn set_dictionary(&mut self, dictionary: &[u8]) {
    self.inflater.prime(dictionary);
  }

  fn transform(
    &mut self,
    dst: &mut Writer<'_>,
    src: &mut Reader<'_>,
    _scratch: &mut [u8],
  ) -> Status {
    loop {
      match self.step(dst, src) {
        Ok(None) => {}
        Ok(Some(status)) => return status,
        Err(e) => return Status::Error(e),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use flate2::Compression;
  use flate2::GzBuilder;
  use flate2::write::GzEncoder;
  use rill_io::IoBuffer;

  use super::*;

  fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
  }

  fn text() -> Vec<u8> {
    b"I know a bank where the wild thyme blows,\n\
      Where oxlips and the nodding violet grows,\n"
      .repeat(30)
  }

  fn run(dec: &mut GzipDecoder, input: &[u8]) -> (Vec<u8>, Status) {
    let mut src = IoBuffer::reader_from(input, true);
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
    (dst.reader_slice().to_vec(), status)
  }

  #[test]
  fn decodes_flate2_member() {
    let (out, status) = run(&mut GzipDecoder::new(), &gzip(&text()));
    assert_eq!(status, Status::Ok);
    assert_eq!(out, text());
  }

  #[test]
  fn skips_optional_header_fields() {
    let mut enc = GzBuilder::new()
      .extra(vec![1, 2, 3, 4, 5])
      .filename("midsummer.txt")
      .comment("act two")
      .write(Vec::new(), Compression::fast());
    enc.write_all(&text()).unwrap();
    let input = enc.finish().unwrap();

    let (out, status) = run(&mut GzipDecoder::new(), &input);
    assert_eq!(status, Status::Ok);
    assert_eq!(out, text());
  }

  #[test]
  fn header_crc_is_skipped() {
    let mut input = gzip(b"hcrc");
    input[3] |= FHCRC;
    input.splice(10..10, [0xAB, 0xCD]);
    let (out, status) = run(&mut GzipDecoder::new(), &input);
    assert_eq!(status, Status::Ok);
    assert_eq!(out, b"hcrc");
  }

  #[test]
  fn header_rejections() {
    let good = gzip(b"x");
    for (index, value, reason) in [
      (0, 0x1E, "missing gzip magic"),
      (2, 0x07, "compression method is not deflate"),
      (3, 0x20, "reserved flag bits are set"),
    ] {
      let mut bad = good.clone();
      bad[index] = value;
      let (_, status) = run(&mut GzipDecoder::new(), &bad);
      assert_eq!(status, Status::Error(DecodeError::BadHeader(reason)));
    }
  }

  // Flip a bit in the CRC (8 bytes from the end) or in ISIZE (2 from the
  // end), stopping the first call short of the trailer each time.
  fn checksum_case(ignore: bool, flip_from_end: usize) {
    let mut input = gzip(&text());
    if flip_from_end != 0 {
      let i = input.len() - flip_from_end;
      input[i] ^= 1;
    }
    for end_limit in 0..10 {
      let mut dec = GzipDecoder::new();
      dec.set_ignore_checksum(ignore);
      let mut src = IoBuffer::reader_from(&input[..], true);
      let mut dst = IoBuffer::with_capacity(1 << 16);
      if end_limit > 0 {
        let mut limited = src.reader().with_limit(input.len() - end_limit);
        let status = dec.transform(&mut dst.writer(), &mut limited, &mut []);
        assert_eq!(status, Status::SHORT_READ, "end_limit={end_limit}");
      }
      let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
      if flip_from_end != 0 && !ignore {
        assert!(
          matches!(status, Status::Error(DecodeError::BadChecksum { .. })),
          "end_limit={end_limit}: {status:?}"
        );
      } else {
        assert_eq!(status, Status::Ok, "end_limit={end_limit}");
        assert_eq!(dst.reader_slice(), &text()[..]);
      }
    }
  }

  #[test]
  fn checksum_verify_good() {
    checksum_case(false, 0);
  }

  #[test]
  fn checksum_verify_bad_crc() {
    checksum_case(false, 8);
  }

  #[test]
  fn checksum_verify_bad_size() {
    checksum_case(false, 2);
  }

  #[test]
  fn checksum_ignore() {
    checksum_case(true, 2);
  }

  #[test]
  fn truncated_member() {
    let good = gzip(b"short");
    let (_, status) = run(&mut GzipDecoder::new(), &good[..good.len() - 3]);
    assert!(
      matches!(status, Status::Error(DecodeError::Truncated { .. })),
      "{status:?}"
    );
  }
}
