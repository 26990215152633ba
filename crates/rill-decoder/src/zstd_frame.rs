use std::fmt;
use std::io;

use rill_io::{Reader, Writer};
use rill_types::{DecodeError, Note, Status, TransformDecoder};
use tracing::debug;
use zstd::stream::raw::{DParameter, Decoder, InBuffer, Operation, OutBuffer};

use crate::resume::{blocked, starved};

const FRAME_MAGIC: u32 = 0xFD2F_B528;
const SKIPPABLE_MAGIC: u32 = 0x184D_2A50;
const SKIPPABLE_MASK: u32 = 0xFFFF_FFF0;
/// Magic that opens a formatted (non raw-content) dictionary.
const DICT_MAGIC: u32 = 0xEC30_A437;

/// Dictionary ID field size for each value of the descriptor's low bits.
const DICT_ID_LEN: [usize; 4] = [0, 1, 2, 4];

/// Magic, frame header descriptor, window descriptor, dictionary ID.
const MAX_PREFIX: usize = 4 + 1 + 1 + 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  Magic,
  Prefix,
  NeedDictionary,
  Payload,
  Done,
}

/// Decoder for a single Zstandard frame, driven through the resume
/// protocol.
///
/// The frame header is read here, up to and including the dictionary ID,
/// so a [`Note::DictionaryRequired`] can be raised before any payload is
/// decoded. Those bytes are kept and handed to the codec once it is
/// built. Decoding stops at the end of the first frame; later bytes stay
/// in the reader.
pub struct ZstdDecoder {
  state: State,
  prefix: [u8; MAX_PREFIX],
  staged: usize,
  need: usize,
  fed: usize,
  dict_id: Option<u32>,
  dictionary: Option<Vec<u8>>,
  ignore_checksum: bool,
  codec: Option<Decoder<'static>>,
}

impl fmt::Debug for ZstdDecoder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ZstdDecoder")
      .field("state", &self.state)
      .field("dict_id", &self.dict_id)
      .field("has_dictionary", &self.dictionary.is_some())
      .field("ignore_checksum", &self.ignore_checksum)
      .finish_non_exhaustive()
  }
}

impl Default for ZstdDecoder {
  fn default() -> Self {
    Self::new()
  }
}

impl ZstdDecoder {
  #[must_use]
  pub fn new() -> Self {
    Self {
      state: State::Magic,
      prefix: [0; MAX_PREFIX],
      staged: 0,
      need: 5,
      fed: 0,
      dict_id: None,
      dictionary: None,
      ignore_checksum: false,
      codec: None,
    }
  }

  /// Pull header bytes until `need` are staged.
  fn stage(&mut self, src: &mut Reader<'_>) -> bool {
    let got = src.take(self.need - self.staged);
    self.prefix[self.staged..self.staged + got.len()].copy_from_slice(got);
    self.staged += got.len();
    self.staged == self.need
  }

  fn build_codec(&mut self) -> Result<(), DecodeError> {
    let mut codec = match &self.dictionary {
      Some(dict) => Decoder::with_dictionary(dict),
      None => Decoder::new(),
    }
    .map_err(codec_error)?;
    if self.ignore_checksum {
      codec
        .set_parameter(DParameter::ForceIgnoreChecksum(true))
        .map_err(codec_error)?;
    }
    self.codec = Some(codec);
    Ok(())
  }

  fn step(
    &mut self,
    dst: &mut Writer<'_>,
    src: &mut Reader<'_>,
  ) -> Result<Option<Status>, DecodeError> {
    match self.state {
      State::Magic => {
        if !self.stage(src) {
          return Ok(Some(starved(src)));
        }
        let magic = u32::from_le_bytes([
          self.prefix[0],
          self.prefix[1],
          self.prefix[2],
          self.prefix[3],
        ]);
        if magic & SKIPPABLE_MASK == SKIPPABLE_MAGIC {
          self.state = State::Payload;
          return Ok(None);
        }
        if magic != FRAME_MAGIC {
          return Err(DecodeError::BadHeader("missing zstd frame magic"));
        }
        let fhd = self.prefix[4];
        if fhd & 0x08 != 0 {
          return Err(DecodeError::BadHeader("reserved frame header bit is set"));
        }
        let single_segment = fhd & 0x20 != 0;
        let id_len = DICT_ID_LEN[usize::from(fhd & 0x03)];
        self.need = 5 + usize::from(!single_segment) + id_len;
        self.state = State::Prefix;
      }

      State::Prefix => {
        if !self.stage(src) {
          return Ok(Some(starved(src)));
        }
        let id_len = DICT_ID_LEN[usize::from(self.prefix[4] & 0x03)];
        let mut id = [0u8; 4];
        id[..id_len].copy_from_slice(&self.prefix[self.need - id_len..self.need]);
        let id = u32::from_le_bytes(id);
        if id == 0 {
          self.state = State::Payload;
        } else {
          self.dict_id = Some(id);
          self.state = State::NeedDictionary;
        }
      }

      State::NeedDictionary => {
        let expected = self.dict_id.unwrap_or_default();
        match self.dictionary.as_deref().map(formatted_dict_id) {
          None => {
            debug!(dict_id = expected, "zstd dictionary required");
            return Ok(Some(Status::Note(Note::DictionaryRequired)));
          }
          Some(Some(actual)) if actual != expected => {
            return Err(DecodeError::IncorrectDictionary { expected, actual });
          }
          Some(_) => self.state = State::Payload,
        }
      }

      State::Payload => {
        if self.codec.is_none() {
          self.build_codec()?;
        }
        let Some(codec) = self.codec.as_mut() else {
          return Err(DecodeError::Codec("zstd decoder unavailable".into()));
        };
        let from_prefix = self.fed < self.staged;
        let input = if from_prefix {
          &self.prefix[self.fed..self.staged]
        } else {
          src.peek()
        };

        let (hint, consumed, produced) = {
          let mut in_buf = InBuffer::around(input);
          let mut out_buf = OutBuffer::around(dst.spare_mut());
          let hint = codec.run(&mut in_buf, &mut out_buf).map_err(codec_error)?;
          (hint, in_buf.pos(), out_buf.pos())
        };

        if from_prefix {
          self.fed += consumed;
        } else {
          src.advance_read(consumed)?;
        }
        dst.advance_write(produced)?;

        if hint == 0 {
          debug!("zstd frame complete");
          self.state = State::Done;
        } else if consumed == 0 && produced == 0 {
          return match blocked(src, dst.available_to_write()) {
            Some(status) => Ok(Some(status)),
            None => Err(DecodeError::Codec("zstd decoder made no progress".into())),
          };
        }
      }

      State::Done => return Ok(Some(Status::Ok)),
    }
    Ok(None)
  }
}

/// The ID stored in a formatted dictionary. Raw-content dictionaries carry
/// none and are accepted for any frame.
fn formatted_dict_id(dict: &[u8]) -> Option<u32> {
  let magic = u32::from_le_bytes(dict.get(..4)?.try_into().ok()?);
  if magic != DICT_MAGIC {
    return None;
  }
  Some(u32::from_le_bytes(dict.get(4..8)?.try_into().ok()?))
}

fn codec_error(e: io::Error) -> DecodeError {
  let message = e.to_string();
  if message.to_ascii_lowercase().contains("checksum") {
    DecodeError::FrameChecksum(message)
  } else {
    DecodeError::Codec(message)
  }
}

impl TransformDecoder for ZstdDecoder {
  /// Takes effect when the codec is built, at the first payload byte.
  fn set_ignore_checksum(&mut self, ignore: bool) {
    self.ignore_checksum = ignore;
  }

  /// Must be called before the first payload byte is decoded.
  fn set_dictionary(&mut self, dictionary: &[u8]) {
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

  use rill_io::IoBuffer;

  use super::*;

  fn text() -> Vec<u8> {
    b"zstandard frames decode through the same resume protocol. ".repeat(64)
  }

  fn compress(data: &[u8], checksum: bool) -> Vec<u8> {
    let mut enc = zstd::stream::Encoder::new(Vec::new(), 3).unwrap();
    enc.include_checksum(checksum).unwrap();
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
  }

  fn run(dec: &mut ZstdDecoder, input: &[u8]) -> (Vec<u8>, Status) {
    let mut src = IoBuffer::reader_from(input, true);
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
    (dst.reader_slice().to_vec(), status)
  }

  #[test]
  fn decodes_encode_all() {
    let input = zstd::encode_all(&text()[..], 3).unwrap();
    let (out, status) = run(&mut ZstdDecoder::new(), &input);
    assert_eq!(status, Status::Ok);
    assert_eq!(out, text());
  }

  #[test]
  fn small_output_buffer_suspends() {
    let input = compress(&text(), true);
    let mut src = IoBuffer::reader_from(&input[..], true);
    let mut dst = IoBuffer::with_capacity(100);
    let mut dec = ZstdDecoder::new();
    let mut out = Vec::new();
    let status = loop {
      match dec.transform(&mut dst.writer(), &mut src.reader(), &mut []) {
        Status::SHORT_WRITE => {
          out.extend_from_slice(dst.reader_slice());
          dst.clear();
        }
        other => break other,
      }
    };
    out.extend_from_slice(dst.reader_slice());
    assert_eq!(status, Status::Ok);
    assert_eq!(out, text());
  }

  #[test]
  fn byte_at_a_time_input() {
    let input = compress(&text(), true);
    let mut src = IoBuffer::with_capacity(input.len());
    let mut dst = IoBuffer::with_capacity(1 << 16);
    let mut dec = ZstdDecoder::new();
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
    assert_eq!(dst.reader_slice(), &text()[..]);
  }

  #[test]
  fn trailing_bytes_stay() {
    let mut input = zstd::encode_all(&b"first"[..], 1).unwrap();
    let frame_len = input.len();
    input.extend_from_slice(b"next");
    let mut src = IoBuffer::reader_from(&input[..], true);
    let mut dst = IoBuffer::with_capacity(64);
    let status = ZstdDecoder::new().transform(&mut dst.writer(), &mut src.reader(), &mut []);
    assert_eq!(status, Status::Ok);
    assert_eq!(src.read_index(), frame_len);
  }

  #[test]
  fn checksum_mismatch_and_ignore() {
    let mut input = compress(&text(), true);
    let last = input.len() - 1;
    input[last] ^= 0x01;

    let (_, status) = run(&mut ZstdDecoder::new(), &input);
    assert!(
      matches!(status, Status::Error(DecodeError::FrameChecksum(_))),
      "{status:?}"
    );

    let mut dec = ZstdDecoder::new();
    dec.set_ignore_checksum(true);
    let (out, status) = run(&mut dec, &input);
    assert_eq!(status, Status::Ok);
    assert_eq!(out, text());
  }

  #[test]
  fn bad_magic() {
    let (_, status) = run(&mut ZstdDecoder::new(), b"not zstd at all");
    assert_eq!(
      status,
      Status::Error(DecodeError::BadHeader("missing zstd frame magic"))
    );
  }

  #[test]
  fn truncated_frame() {
    let input = compress(&text(), false);
    let (_, status) = run(&mut ZstdDecoder::new(), &input[..input.len() / 2]);
    assert!(
      matches!(status, Status::Error(DecodeError::Truncated { .. })),
      "{status:?}"
    );
  }

  #[test]
  fn dictionary_id_raises_note() {
    // Single-segment frame naming dictionary 7.
    let header = [0x28, 0xB5, 0x2F, 0xFD, 0x21, 0x07, 0x05];
    let mut src = IoBuffer::reader_from(&header[..], false);
    let mut dst = IoBuffer::with_capacity(16);
    let mut dec = ZstdDecoder::new();
    for _ in 0..2 {
      let status = dec.transform(&mut dst.writer(), &mut src.reader(), &mut []);
      assert_eq!(status, Status::Note(Note::DictionaryRequired));
    }
    assert_eq!(dec.dictionary_id(), Some(7));
  }

  #[test]
  fn formatted_dictionary_with_wrong_id() {
    let header = [0x28, 0xB5, 0x2F, 0xFD, 0x21, 0x07, 0x05];
    let mut dict = Vec::new();
    dict.extend_from_slice(&DICT_MAGIC.to_le_bytes());
    dict.extend_from_slice(&9u32.to_le_bytes());
    let mut dec = ZstdDecoder::new();
    dec.set_dictionary(&dict);
    let (_, status) = run(&mut dec, &header);
    assert_eq!(
      status,
      Status::Error(DecodeError::IncorrectDictionary {
        expected: 7,
        actual: 9
      })
    );
  }

  #[test]
  fn raw_content_dictionary() {
    let dict = b"shared history for raw-content dictionaries ".repeat(4);
    let plain = b"shared history for raw-content dictionaries, reused";
    let mut enc = zstd::stream::Encoder::with_dictionary(Vec::new(), 3, &dict).unwrap();
    enc.write_all(plain).unwrap();
    let input = enc.finish().unwrap();

    let mut dec = ZstdDecoder::new();
    dec.set_dictionary(&dict);
    let (out, status) = run(&mut dec, &input);
    assert_eq!(status, Status::Ok);
    assert_eq!(out, plain);
  }
}
