use rill_io::{Reader, TokenWriter};
use rill_types::{
  Container, DecodeError, FloatWidth, Literal, Status, StringPart, Token, TokenDecoder,
  TokenValue,
};

use crate::resume::{blocked, starved};

/// Deepest container nesting accepted before [`DecodeError::DepthExceeded`].
pub const MAX_DEPTH: usize = 1024;

/// Largest payload a single string content token covers.
pub const MAX_CONTENT_LEN: u64 = u16::MAX as u64;

/// The break stop code closing indefinite-length items.
const BREAK: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StrKind {
  Bytes,
  Text,
}

impl StrKind {
  fn major(self) -> u8 {
    match self {
      Self::Bytes => 2,
      Self::Text => 3,
    }
  }

  fn value(self, part: StringPart) -> TokenValue {
    match self {
      Self::Bytes => TokenValue::Bytes(part),
      Self::Text => TokenValue::Text(part),
    }
  }
}

/// An open container on the nesting stack.
///
/// `remaining` counts children still to come (two per map entry);
/// `None` means indefinite length, closed by a break.
#[derive(Clone, Copy, Debug)]
enum Frame {
  Array { remaining: Option<u64> },
  Map { remaining: Option<u64>, odd: bool },
  Chunks(StrKind),
}

/// An item header being assembled, possibly across several calls.
///
/// ```text
///   byte 0      : major type (3 bits) | additional info (5 bits)
///   bytes 1..=8 : big-endian argument when additional info is 24..=27
/// ```
#[derive(Clone, Copy, Debug, Default)]
struct Header {
  bytes: [u8; 9],
  len: u8,
  need: u8,
  position: u64,
}

impl Header {
  fn argument(&self) -> u64 {
    let ai = self.bytes[0] & 0x1F;
    if self.need == 1 {
      return u64::from(ai);
    }
    self.bytes[1..usize::from(self.need)]
      .iter()
      .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
  }
}

/// What applying a decoded header does to the decoder state.
#[derive(Clone, Copy, Debug)]
enum Effect {
  Item,
  Tag,
  Open(Frame),
  Content(StrKind, u64),
  EmptyString,
  Close,
}

/// Resumable CBOR (RFC 8949) tokenizer.
///
/// Decodes exactly one top-level data item into [`Token`]s and then
/// reports [`Status::Ok`], leaving any following bytes in the reader.
/// Structural rules are checked as each header arrives, so a malformed
/// item is rejected before anything after it is consumed.
///
/// Item headers are staged internally, so the decoder advances even when
/// every call sees a single input byte. String payloads become content
/// tokens sized by the input available in the call, capped at
/// [`MAX_CONTENT_LEN`].
///
/// # Example
///
/// ```rust
/// use rill_decoder::CborDecoder;
/// use rill_io::{IoBuffer, TokenBuffer};
/// use rill_types::{Status, TokenDecoder, TokenValue};
///
/// let mut src = IoBuffer::reader_from(&[0x18u8, 0x64][..], true);
/// let mut sink = TokenBuffer::with_capacity(4);
/// let mut dec = CborDecoder::new();
///
/// let status = dec.decode_tokens(&mut sink.writer(), &mut src.reader(), &mut []);
/// assert_eq!(status, Status::Ok);
/// assert_eq!(sink.pending()[0].value, TokenValue::Unsigned(100));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CborDecoder {
  stack: Vec<Frame>,
  header: Header,
  content: Option<(StrKind, u64)>,
  tagged: bool,
  done: bool,
}

impl CborDecoder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Current container nesting depth.
  pub fn depth(&self) -> usize {
    self.stack.len()
  }

  /// Run until something blocks. `Ok(None)` means progress was made.
  fn step(
    &mut self,
    dst: &mut TokenWriter<'_, Token>,
    src: &mut Reader<'_>,
  ) -> Result<Option<Status>, DecodeError> {
    if self.done {
      return Ok(Some(Status::Ok));
    }
    if let Some((kind, remaining)) = self.content {
      return Ok(self.step_content(dst, src, kind, remaining));
    }
    if let Some(container) = self.closable() {
      let token = Token {
        value: TokenValue::Pop(container),
        position: src.position(),
        length: 0,
        continued: false,
      };
      if dst.try_push(token).is_err() {
        return Ok(Some(Status::SHORT_WRITE));
      }
      self.stack.pop();
      self.end_item();
      return Ok(None);
    }

    if self.header.len == 0 {
      if let Some(status) = blocked(src, dst.available_to_write()) {
        return Ok(Some(status));
      }
      let position = src.position();
      let Some(initial) = src.read_u8() else {
        return Ok(Some(starved(src)));
      };
      let need = match initial & 0x1F {
        24 => 2,
        25 => 3,
        26 => 5,
        27 => 9,
        28..=30 => {
          return Err(DecodeError::InvalidStructure {
            offset: position,
            reason: "reserved additional information value",
          });
        }
        _ => 1,
      };
      self.header = Header {
        bytes: [initial, 0, 0, 0, 0, 0, 0, 0, 0],
        len: 1,
        need,
        position,
      };
    }
    while self.header.len < self.header.need {
      let Some(b) = src.read_u8() else {
        return Ok(Some(starved(src)));
      };
      self.header.bytes[usize::from(self.header.len)] = b;
      self.header.len += 1;
    }

    let (token, effect) = self.classify(&self.header)?;
    if dst.try_push(token).is_err() {
      return Ok(Some(Status::SHORT_WRITE));
    }
    self.header = Header::default();
    self.apply(effect);
    Ok(None)
  }

  fn step_content(
    &mut self,
    dst: &mut TokenWriter<'_, Token>,
    src: &mut Reader<'_>,
    kind: StrKind,
    remaining: u64,
  ) -> Option<Status> {
    if let Some(status) = blocked(src, dst.available_to_write()) {
      return Some(status);
    }
    let available = u64::try_from(src.available_to_read()).unwrap_or(u64::MAX);
    let n = remaining.min(MAX_CONTENT_LEN).min(available);
    let in_chunks = self.in_chunks();
    let token = Token {
      value: kind.value(StringPart::Content),
      position: src.position(),
      length: n,
      continued: remaining > n || in_chunks,
    };
    if dst.try_push(token).is_err() {
      return Some(Status::SHORT_WRITE);
    }
    // n <= available_to_read, so it fits in usize.
    #[allow(clippy::cast_possible_truncation)]
    src.take(n as usize);

    if remaining == n {
      self.content = None;
      if !in_chunks {
        self.end_item();
      }
    } else {
      self.content = Some((kind, remaining - n));
    }
    None
  }

  /// Decide what a complete header means, without changing any state.
  fn classify(&self, header: &Header) -> Result<(Token, Effect), DecodeError> {
    let initial = header.bytes[0];
    let major = initial >> 5;
    let ai = initial & 0x1F;
    let arg = header.argument();
    let invalid = |reason| DecodeError::InvalidStructure {
      offset: header.position,
      reason,
    };
    let token = |value, continued| Token {
      value,
      position: header.position,
      length: u64::from(header.need),
      continued,
    };

    if let Some(Frame::Chunks(kind)) = self.stack.last().copied() {
      if initial == BREAK {
        return Ok((token(kind.value(StringPart::End), false), Effect::Close));
      }
      if major != kind.major() || ai == 31 {
        return Err(invalid(
          "indefinite-length string chunk must be a definite string of the same type",
        ));
      }
    }

    if initial == BREAK {
      if self.tagged {
        return Err(invalid("tag followed by a break"));
      }
      let container = match self.stack.last() {
        Some(Frame::Array { remaining: None }) => Container::Array,
        Some(Frame::Map {
          remaining: None,
          odd,
        }) => {
          if *odd {
            return Err(invalid("map with an odd number of children"));
          }
          Container::Map
        }
        _ => return Err(invalid("break outside an indefinite-length item")),
      };
      return Ok((token(TokenValue::Pop(container), false), Effect::Close));
    }

    if ai == 31 && matches!(major, 0 | 1 | 6) {
      return Err(invalid("indefinite length on an integer or tag"));
    }
    let definite = (ai != 31).then_some(arg);

    let out = match major {
      0 => (token(TokenValue::Unsigned(arg), false), Effect::Item),
      1 => (token(TokenValue::Negative(arg), false), Effect::Item),
      2 | 3 => {
        let kind = if major == 2 { StrKind::Bytes } else { StrKind::Text };
        let value = kind.value(StringPart::Header { len: definite });
        match definite {
          None => {
            self.check_depth()?;
            (token(value, true), Effect::Open(Frame::Chunks(kind)))
          }
          Some(0) => (token(value, self.in_chunks()), Effect::EmptyString),
          Some(n) => (token(value, true), Effect::Content(kind, n)),
        }
      }
      4 => {
        self.check_depth()?;
        let value = TokenValue::Push {
          container: Container::Array,
          len: definite,
        };
        let frame = Frame::Array {
          remaining: definite,
        };
        (token(value, false), Effect::Open(frame))
      }
      5 => {
        self.check_depth()?;
        let children = match definite {
          Some(n) => Some(
            n.checked_mul(2)
              .ok_or_else(|| invalid("map length overflows"))?,
          ),
          None => None,
        };
        let value = TokenValue::Push {
          container: Container::Map,
          len: definite,
        };
        let frame = Frame::Map {
          remaining: children,
          odd: false,
        };
        (token(value, false), Effect::Open(frame))
      }
      6 => (token(TokenValue::Tag(arg), false), Effect::Tag),
      _ => {
        let value = match ai {
          0..=19 => TokenValue::Simple(ai),
          20 => TokenValue::Literal(Literal::False),
          21 => TokenValue::Literal(Literal::True),
          22 => TokenValue::Literal(Literal::Null),
          23 => TokenValue::Literal(Literal::Undefined),
          24 => match u8::try_from(arg) {
            Ok(v) if v >= 32 => TokenValue::Simple(v),
            _ => return Err(invalid("two-byte simple value below 32")),
          },
          25 => TokenValue::Float {
            bits: arg,
            width: FloatWidth::F16,
          },
          26 => TokenValue::Float {
            bits: arg,
            width: FloatWidth::F32,
          },
          27 => TokenValue::Float {
            bits: arg,
            width: FloatWidth::F64,
          },
          _ => return Err(invalid("reserved additional information value")),
        };
        (token(value, false), Effect::Item)
      }
    };
    Ok(out)
  }

  fn apply(&mut self, effect: Effect) {
    if !matches!(effect, Effect::Tag) {
      self.tagged = false;
    }
    match effect {
      Effect::Item => self.end_item(),
      Effect::Tag => self.tagged = true,
      Effect::Open(frame) => self.stack.push(frame),
      Effect::Content(kind, n) => self.content = Some((kind, n)),
      Effect::EmptyString => {
        if !self.in_chunks() {
          self.end_item();
        }
      }
      Effect::Close => {
        self.stack.pop();
        self.end_item();
      }
    }
  }

  /// Account for one finished data item in the enclosing container.
  fn end_item(&mut self) {
    match self.stack.last_mut() {
      None => self.done = true,
      Some(
        Frame::Array {
          remaining: Some(n),
        }
        | Frame::Map {
          remaining: Some(n), ..
        },
      ) => *n -= 1,
      Some(Frame::Map {
        remaining: None,
        odd,
      }) => *odd = !*odd,
      Some(Frame::Array { remaining: None } | Frame::Chunks(_)) => {}
    }
  }

  /// The definite container on top of the stack, if it has no children
  /// left.
  fn closable(&self) -> Option<Container> {
    match self.stack.last()? {
      Frame::Array { remaining: Some(0) } => Some(Container::Array),
      Frame::Map {
        remaining: Some(0), ..
      } => Some(Container::Map),
      _ => None,
    }
  }

  fn in_chunks(&self) -> bool {
    matches!(self.stack.last(), Some(Frame::Chunks(_)))
  }

  fn check_depth(&self) -> Result<(), DecodeError> {
    if self.stack.len() >= MAX_DEPTH {
      return Err(DecodeError::DepthExceeded { max: MAX_DEPTH });
    }
    Ok(())
  }
}

impl TokenDecoder for CborDecoder {
  fn decode_tokens(
    &mut self,
    dst: &mut TokenWriter<'_, Token>,
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
