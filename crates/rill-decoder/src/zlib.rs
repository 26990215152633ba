use rill_hash::Adler32;
use rill_io::{Reader, Writer};
use rill_types::{DecodeError, Note, Status, TransformDecoder};
use tracing::debug;

use crate::inflate::Inflater;
use crate::resume::{Field, starved};

/// FLG bit announcing a preset dictionary.
const FDICT: u8 = 0x20;

/// ```text
///   Header ──→ DictId ──→ NeedDictionary ──┐
///      └───────────────────────────────────┴─→ Payload ──→ Trailer ──→ Done
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  Header,
  DictId,
  NeedDictionary,
  Payload,
  Trailer,
  Done,
}

/// Resumable zlib (RFC 1950) decoder: a two-byte header, an optional
/// preset-dictionary identifier, raw DEFLATE, then a big-endian Adler-32
/// of the decoded bytes.
///
/// When the header sets FDICT and no dictionary has been installed,
/// [`transform`](TransformDecoder::transform) returns
/// [`Note::DictionaryRequired`] on every call until
/// [`set_dictionary`](TransformDecoder::set_dictionary) is called.
#[derive(Clone, Debug)]
pub struct ZlibDecoder {
  state: State,
  header: Field<2>,
  dict_field: Field<4>,
  trailer: Field<4>,
  dict_id: Option<u32>,
  installed: Option<u32>,
  dictionary: Option<Vec<u8>>,
  inflater: Inflater,
  adler: Adler32,
  ignore_checksum: bool,
}

impl Default for ZlibDecoder {
  fn default() -> Self {
    Self::new()
  }
}

impl ZlibDecoder {
  #[must_use]
  pub fn new() -> Self {
    Self {
      state: State::Header,
      header: Field::default(),
      dict_field: Field::default(),
      trailer: Field::default(),
      dict_id: None,
      installed: None,
      dictionary: None,
      inflater: Inflater::new(),
      adler: Adler32::new(),
      ignore_checksum: false,
    }
  }

  /// Bytes of payload produced so far.
  pub fn total_out(&self) -> u64 {
    self.inflater.total_out()
  }

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
        let [cmf, flg] = *self.header.bytes();
        if cmf & 0x0F != 8 {
          return Err(DecodeError::BadHeader("compression method is not deflate"));
        }
        if cmf >> 4 > 7 {
          return Err(DecodeError::BadHeader("window size exceeds 32 KiB"));
        }
        if (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
          return Err(DecodeError::BadHeader("header check bits do not match"));
        }
        self.state = if flg & FDICT == 0 {
          State::Payload
        } else {
          State::DictId
        };
      }

      State::DictId => {
        if !self.dict_field.fill(src) {
          return Ok(Some(starved(src)));
        }
        self.dict_id = Some(u32::from_be_bytes(*self.dict_field.bytes()));
        self.state = State::NeedDictionary;
      }

      State::NeedDictionary => {
        let expected = self.dict_id.unwrap_or_default();
        match self.installed {
          None => {
            debug!(dict_id = format_args!("{expected:#010x}"), "zlib dictionary required");
            return Ok(Some(Status::Note(Note::DictionaryRequired)));
          }
          Some(actual) if actual != expected => {
            return Err(DecodeError::IncorrectDictionary { expected, actual });
          }
          Some(_) => {
            if let Some(dictionary) = self.dictionary.take() {
              self.inflater.prime(&dictionary);
            }
            self.state = State::Payload;
          }
        }
      }

      State::Payload => {
        let mark = dst.mark();
        let status = self.inflater.inflate(dst, src);
        self.adler.write(dst.written_since(mark));
        if status != Status::Ok {
          return Ok(Some(status));
        }
        self.state = State::Trailer;
      }

      State::Trailer => {
        if !self.trailer.fill(src) {
          return Ok(Some(starved(src)));
        }
        let expected = u32::from_be_bytes(*self.trailer.bytes());
        let computed = self.adler.checksum();
        if expected != computed {
          if !self.ignore_checksum {
            return Err(DecodeError::BadChecksum {
              expected: u64::from(expected),
              computed: u64::from(computed),
            });
          }
          debug!(
            expected = format_args!("{expected:#010x}"),
            computed = format_args!("{computed:#010x}"),
            "ignoring zlib checksum mismatch"
          );
        }
        self.state = State::Done;
      }

      State::Done => return Ok(Some(Status::Ok)),
    }
    Ok(None)
  }
}

impl TransformDecoder for ZlibDecoder {
  fn set_ignore_checksum(&mut self, ignore: bool) {
    self.ignore_checksum = ignore;
  }

  /// Keep `dictionary` for a stream whose header sets FDICT. Its Adler-32
  /// is checked against the DICTID before it becomes history; a stream
  /// without FDICT never sees it.
  fn set_dictionary(&mut self, dictionary: &[u8]) {
    let mut adler = Adler32::new();
    self.installed = Some(adler.write(dictionary));
    self.dictionary = Some(dictionary.to_vec());
  }

  fn dictionary_id(&self) -> Option<u32> {
    self.dict_id
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
  use flate2::write::ZlibEncoder;
  use rill_io::IoBuffer;

  use super::*;

  fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
  }

  fn run(dec: &mut ZlibDecoder, input: &[u8]) -> (Vec<u8>, Status) {
    let mut src = IoBuffer::reader_from(input, true);
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
    (dst.reader_slice().to_vec(), status)
  }

  // zlib stream of PLAIN compressed against DICT (DICTID 0x613c0ffa).
  const DICT: &[u8] = b"the quick brown fox jumps over the lazy dog";
  const PLAIN: &[u8] = b"the lazy dog jumps over the quick brown fox";
  const WITH_DICT: &str = "78f9613c0ffa4366a3ab413302005d660ffa";

  #[test]
  fn decodes_flate2_stream() {
    let text = b"zlib zlib zlib zlib, adler adler adler".repeat(20);
    let (out, status) = run(&mut ZlibDecoder::new(), &zlib(&text));
    assert_eq!(status, Status::Ok);
    assert_eq!(out, text);
  }

  #[test]
  fn empty_payload() {
    let (out, status) = run(&mut ZlibDecoder::new(), &zlib(b""));
    assert_eq!(status, Status::Ok);
    assert!(out.is_empty());
  }

  #[test]
  fn header_rejections() {
    for (input, reason) in [
      (&[0x79u8, 0x9C][..], "compression method is not deflate"),
      (&[0x88, 0x98][..], "window size exceeds 32 KiB"),
      (&[0x78, 0x9D][..], "header check bits do not match"),
    ] {
      let (_, status) = run(&mut ZlibDecoder::new(), input);
      assert_eq!(status, Status::Error(DecodeError::BadHeader(reason)));
    }
  }

  #[test]
  fn checksum_mismatch_and_ignore() {
    let text = b"checksummed payload";
    let mut bad = zlib(text);
    let last = bad.len() - 1;
    bad[last] ^= 0x01;

    let (_, status) = run(&mut ZlibDecoder::new(), &bad);
    assert!(
      matches!(status, Status::Error(DecodeError::BadChecksum { .. })),
      "{status:?}"
    );

    let mut dec = ZlibDecoder::new();
    dec.set_ignore_checksum(true);
    let (out, status) = run(&mut dec, &bad);
    assert_eq!(status, Status::Ok);
    assert_eq!(out, text);
  }

  #[test]
  fn truncated_trailer() {
    let good = zlib(b"abc");
    let (_, status) = run(&mut ZlibDecoder::new(), &good[..good.len() - 2]);
    assert!(
      matches!(status, Status::Error(DecodeError::Truncated { .. })),
      "{status:?}"
    );
  }

  #[test]
  fn dictionary_note_is_idempotent_until_installed() {
    let input = hex::decode(WITH_DICT).unwrap();
    let mut src = IoBuffer::reader_from(&input[..], true);
    let mut dst = IoBuffer::with_capacity(256);
    let mut dec = ZlibDecoder::new();

    for _ in 0..3 {
      let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
      assert_eq!(status, Status::Note(Note::DictionaryRequired));
      assert_eq!(dec.dictionary_id(), Some(0x613C_0FFA));
    }

    dec.set_dictionary(DICT);
    let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
    assert_eq!(status, Status::Ok);
    assert_eq!(dst.reader_slice(), PLAIN);
  }

  #[test]
  fn wrong_dictionary() {
    let input = hex::decode(WITH_DICT).unwrap();
    let mut dec = ZlibDecoder::new();
    dec.set_dictionary(b"not the right history");
    let (_, status) = run(&mut dec, &input);
    assert!(
      matches!(
        status,
        Status::Error(DecodeError::IncorrectDictionary {
          expected: 0x613C_0FFA,
          ..
        })
      ),
      "{status:?}"
    );
  }

  #[test]
  fn dictionary_ignored_without_fdict() {
    // The payload of WITH_DICT under a plain header: its back-references
    // reach into history the stream never asked for.
    let input = hex::decode("789c4366a3ab413302005d660ffa").unwrap();
    let mut dec = ZlibDecoder::new();
    dec.set_dictionary(DICT);
    let (_, status) = run(&mut dec, &input);
    assert!(
      matches!(status, Status::Error(DecodeError::BadDistance { .. })),
      "{status:?}"
    );
    assert_eq!(dec.dictionary_id(), None);
  }

  #[test]
  fn dictionary_installed_before_the_header() {
    let input = hex::decode(WITH_DICT).unwrap();
    let mut dec = ZlibDecoder::new();
    dec.set_dictionary(DICT);
    let (out, status) = run(&mut dec, &input);
    assert_eq!(status, Status::Ok);
    assert_eq!(out, PLAIN);
  }

  #[test]
  fn byte_at_a_time() {
    let text = b"one byte per call still decodes the same".repeat(8);
    let input = zlib(&text);
    let mut src = IoBuffer::with_capacity(input.len());
    let mut dst = IoBuffer::with_capacity(text.len());
    let mut dec = ZlibDecoder::new();
    let mut fed = 0;
    let status = loop {
      match dec.transform(&mut dst.writer(), &mut src.reader(), &mut []) {
        Status::SHORT_READ => {
          fed += src.fill_from(&input[fed..=fed]);
          if fed == input.len() {
            src.mark_closed();
          }
        }
        other => break other,
      }
    };
    assert_eq!(status, Status::Ok);
    assert_eq!(dst.reader_slice(), &text[..]);
  }
}
