/// A container kind opened by [`TokenValue::Push`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Container {
  Array,
  Map,
}

/// The four simple values with a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
  False,
  True,
  Null,
  Undefined,
}

/// Encoded width of a floating-point value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatWidth {
  F16,
  F32,
  F64,
}

/// One piece of a byte or text string.
///
/// A string is a chain of pieces linked through [`Token::continued`]:
///
/// ```text
///   definite "abc"        Header{len: Some(3)}+  Content
///   definite ""           Header{len: Some(0)}
///   indefinite ("ab" "c") Header{len: None}+  Header{Some(2)}+  Content+
///                         Header{Some(1)}+  Content+  End
/// ```
///
/// (`+` marks `continued = true`.)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StringPart {
  /// A string or chunk header. `None` opens an indefinite-length string.
  Header { len: Option<u64> },
  /// Raw payload bytes; the bytes themselves are
  /// `input[position..position + length]`.
  Content,
  /// The break that closes an indefinite-length string.
  End,
}

/// What a [`Token`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenValue {
  /// A container opened. `len` is the declared child count (pairs for a
  /// map) or `None` for indefinite length.
  Push { container: Container, len: Option<u64> },
  /// A container closed. Definite containers close without consuming
  /// input; indefinite ones consume their break byte.
  Pop(Container),
  Unsigned(u64),
  /// The integer `-1 - n`.
  Negative(u64),
  Bytes(StringPart),
  Text(StringPart),
  /// A semantic tag applying to the next value.
  Tag(u64),
  Literal(Literal),
  /// Any other simple value.
  Simple(u8),
  /// IEEE 754 bits, zero-extended to 64.
  Float { bits: u64, width: FloatWidth },
}

/// A fixed-size record for one decoded structural unit.
///
/// `position` and `length` locate the input bytes the token accounts for,
/// so that the lengths of every token emitted so far sum to the number of
/// bytes consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token {
  pub value: TokenValue,
  /// Absolute stream offset of the first byte.
  pub position: u64,
  /// Number of input bytes this token accounts for.
  pub length: u64,
  /// More pieces of the same string follow.
  pub continued: bool,
}

impl Token {
  /// True for string payload pieces.
  pub fn is_content(&self) -> bool {
    matches!(
      self.value,
      TokenValue::Bytes(StringPart::Content) | TokenValue::Text(StringPart::Content)
    )
  }

  /// The input bytes this token covers, given the full input it was
  /// decoded from.
  ///
  /// Returns `None` when `input` does not reach that far.
  pub fn bytes<'a>(&self, input: &'a [u8]) -> Option<&'a [u8]> {
    let start = usize::try_from(self.position).ok()?;
    let len = usize::try_from(self.length).ok()?;
    input.get(start..start.checked_add(len)?)
  }
}

/// Merge adjacent content pieces of the same string.
///
/// Content tokens are sized by whatever input a call happened to have, so
/// two runs over differently chunked input agree only after coalescing.
/// Every other token passes through unchanged.
pub fn coalesce(tokens: &[Token]) -> Vec<Token> {
  let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
  for &t in tokens {
    match out.last_mut() {
      Some(prev)
        if prev.is_content()
          && prev.continued
          && prev.value == t.value
          && prev.position + prev.length == t.position =>
      {
        prev.length += t.length;
        prev.continued = t.continued;
      }
      _ => out.push(t),
    }
  }
  out
}
