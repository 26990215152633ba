use rill_io::IoError;

/// The coarse failure classes every decoder reports into.
///
/// Conformance tests assert on the class as well as on the exact variant:
/// a stream cut short must never be mistaken for a corrupt one, and
/// neither must be mistaken for a checksum failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
  /// The bytes violate the format's rules.
  Structural,
  /// The source was closed before a structurally required byte arrived.
  Truncated,
  /// A checksum embedded in the stream disagrees with the computed one.
  ChecksumMismatch,
}

/// Fatal outcomes of a decode call.
///
/// Suspensions and notes are not errors; they live on
/// [`Status`](crate::Status). Once a decoder returns one of these, its
/// further behaviour is unspecified and the instance should be dropped.
///
/// ```text
///   DecodeError
///   ├── Truncated            ← source closed mid-structure
///   ├── BadChecksum          ← trailer disagrees with the payload
///   ├── IncorrectDictionary  ← installed history has the wrong Adler-32
///   ├── InvalidStructure     ← CBOR rule violated
///   ├── DepthExceeded        ← CBOR nesting too deep
///   ├── BadHeader            ← zlib / gzip / zstd framing rejected
///   ├── BadBlockType         ← DEFLATE BTYPE = 3
///   ├── BadStoredLength      ← LEN != !NLEN
///   ├── BadCodeLengths       ← dynamic Huffman header is inconsistent
///   ├── BadHuffmanCode       ← bit pattern matches no code
///   ├── BadDistance          ← back-reference before the window start
///   ├── FrameChecksum        ← wrapped codec rejected its own checksum
///   ├── Codec                ← failure reported by a wrapped codec
///   └── Buffer(IoError)      ← a view was advanced past its bounds
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
  /// The source was closed before the format's next required byte.
  #[error("truncated input at offset {offset}")]
  Truncated { offset: u64 },

  /// A trailing checksum or length field did not match the payload.
  #[error("bad checksum: stream says {expected:#x}, computed {computed:#x}")]
  BadChecksum { expected: u64, computed: u64 },

  /// The dictionary passed to `set_dictionary` is not the one the stream
  /// was compressed against.
  #[error("incorrect dictionary: stream wants {expected:#010x}, got {actual:#010x}")]
  IncorrectDictionary { expected: u32, actual: u32 },

  /// A self-describing format broke one of its structural rules.
  #[error("invalid structure at offset {offset}: {reason}")]
  InvalidStructure { offset: u64, reason: &'static str },

  /// Containers were nested deeper than the decoder supports.
  #[error("nesting deeper than {max} levels")]
  DepthExceeded { max: usize },

  /// A container header (zlib, gzip, zstd frame) was rejected.
  #[error("bad header: {0}")]
  BadHeader(&'static str),

  /// DEFLATE block type 3 is reserved.
  #[error("bad DEFLATE block type {0}")]
  BadBlockType(u8),

  /// A stored block's LEN was not the complement of NLEN.
  #[error("stored block length {len:#06x} does not match complement {nlen:#06x}")]
  BadStoredLength { len: u16, nlen: u16 },

  /// The code lengths of a dynamic Huffman block do not form a usable
  /// code.
  #[error("bad code lengths: {0}")]
  BadCodeLengths(&'static str),

  /// The bit stream selected a symbol that no Huffman code defines.
  #[error("bad Huffman code")]
  BadHuffmanCode,

  /// A back-reference reaches before the start of the history window.
  #[error("distance {distance} exceeds the {available} bytes of history")]
  BadDistance { distance: usize, available: usize },

  /// A wrapped codec verified its own frame checksum and it failed.
  #[error("frame checksum mismatch: {0}")]
  FrameChecksum(String),

  /// A wrapped third-party codec failed.
  #[error("codec error: {0}")]
  Codec(String),

  /// A decoder advanced a view past its bounds. Only a bug in the
  /// decoder produces this.
  #[error(transparent)]
  Buffer(#[from] IoError),
}

impl DecodeError {
  /// Map the variant onto its [`ErrorClass`].
  pub fn class(&self) -> ErrorClass {
    match self {
      Self::Truncated { .. } => ErrorClass::Truncated,
      Self::BadChecksum { .. } | Self::IncorrectDictionary { .. } | Self::FrameChecksum(_) => {
        ErrorClass::ChecksumMismatch
      }
      Self::InvalidStructure { .. }
      | Self::DepthExceeded { .. }
      | Self::BadHeader(_)
      | Self::BadBlockType(_)
      | Self::BadStoredLength { .. }
      | Self::BadCodeLengths(_)
      | Self::BadHuffmanCode
      | Self::BadDistance { .. }
      | Self::Codec(_)
      | Self::Buffer(_) => ErrorClass::Structural,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classes() {
    assert_eq!(
      DecodeError::Truncated { offset: 3 }.class(),
      ErrorClass::Truncated
    );
    assert_eq!(
      DecodeError::BadChecksum {
        expected: 1,
        computed: 2
      }
      .class(),
      ErrorClass::ChecksumMismatch
    );
    assert_eq!(DecodeError::BadHuffmanCode.class(), ErrorClass::Structural);
  }

  #[test]
  fn display_carries_context() {
    let err = DecodeError::InvalidStructure {
      offset: 7,
      reason: "odd map",
    };
    assert_eq!(err.to_string(), "invalid structure at offset 7: odd map");
    let err = DecodeError::BadDistance {
      distance: 40,
      available: 3,
    };
    assert_eq!(err.to_string(), "distance 40 exceeds the 3 bytes of history");
  }
}
