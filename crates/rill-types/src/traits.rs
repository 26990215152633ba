//! One capability trait per decoder role.
//!
//! Every role shares the same resumable step shape: the caller lends
//! bounded views for the duration of one call, the decoder makes as much
//! progress as those views allow and reports why it stopped through a
//! [`Status`]. All progress lives in `self`, so calling again after a
//! suspension continues exactly where the previous call left off.

use rill_io::{Reader, TokenWriter, Writer};

use crate::status::Status;
use crate::token::Token;

/// A running checksum over a byte stream.
///
/// Hashing never suspends: every `update` consumes its whole slice.
pub trait Hasher {
  /// Start a fresh computation, discarding anything fed so far.
  fn initialize(&mut self);

  /// Feed `bytes` and return the checksum of everything fed since the
  /// last [`initialize`](Self::initialize).
  fn update(&mut self, bytes: &[u8]) -> u64;

  /// The running checksum, without feeding anything.
  fn checksum_u64(&self) -> u64;
}

/// Decodes bytes into a bounded sequence of [`Token`]s.
pub trait TokenDecoder {
  /// Bytes of caller-provided scratch memory `decode_tokens` needs.
  fn scratch_len(&self) -> usize {
    0
  }

  /// Consume from `src` and append to `dst` until the top-level value is
  /// complete, either view runs out, or the input is invalid.
  fn decode_tokens(
    &mut self,
    dst: &mut TokenWriter<'_, Token>,
    src: &mut Reader<'_>,
    scratch: &mut [u8],
  ) -> Status;
}

/// Decodes bytes into bytes, optionally verifying a trailing checksum and
/// optionally priming its history with a preset dictionary.
pub trait TransformDecoder {
  /// Bytes of caller-provided scratch memory `transform` needs.
  fn scratch_len(&self) -> usize {
    0
  }

  /// When set, trailer mismatches are not reported. Trailer bytes are
  /// still consumed.
  fn set_ignore_checksum(&mut self, ignore: bool);

  /// Install preset history. Call after a
  /// [`Note::DictionaryRequired`](crate::Note::DictionaryRequired) or
  /// before the first `transform`.
  fn set_dictionary(&mut self, dictionary: &[u8]);

  /// The identifier of the dictionary the stream asked for, once a
  /// `DictionaryRequired` note has been returned.
  fn dictionary_id(&self) -> Option<u32> {
    None
  }

  /// Consume from `src` and produce into `dst`.
  fn transform(&mut self, dst: &mut Writer<'_>, src: &mut Reader<'_>, scratch: &mut [u8])
  -> Status;
}

impl<T: TransformDecoder + ?Sized> TransformDecoder for Box<T> {
  fn scratch_len(&self) -> usize {
    (**self).scratch_len()
  }

  fn set_ignore_checksum(&mut self, ignore: bool) {
    (**self).set_ignore_checksum(ignore);
  }

  fn set_dictionary(&mut self, dictionary: &[u8]) {
    (**self).set_dictionary(dictionary);
  }

  fn dictionary_id(&self) -> Option<u32> {
    (**self).dictionary_id()
  }

  fn transform(&mut self, dst: &mut Writer<'_>, src: &mut Reader<'_>, scratch: &mut [u8])
  -> Status {
    (**self).transform(dst, src, scratch)
  }
}

impl<T: Hasher + ?Sized> Hasher for Box<T> {
  fn initialize(&mut self) {
    (**self).initialize();
  }

  fn update(&mut self, bytes: &[u8]) -> u64 {
    (**self).update(bytes)
  }

  fn checksum_u64(&self) -> u64 {
    (**self).checksum_u64()
  }
}
