//! Helpers shared by every decoder for reporting why a call stopped and
//! for staging fixed-size fields that may arrive across several calls.

use rill_io::Reader;
use rill_types::{DecodeError, Status};

/// The status for "need another input byte and there is none".
pub(crate) fn starved(src: &Reader<'_>) -> Status {
  if src.is_closed() {
    Status::Error(DecodeError::Truncated {
      offset: src.position(),
    })
  } else {
    Status::SHORT_READ
  }
}

/// Why a step needing both an input byte and `room` output slots cannot
/// proceed, in resume-protocol priority order. `None` means it can.
pub(crate) fn blocked(src: &Reader<'_>, room: usize) -> Option<Status> {
  let available = src.available_to_read();
  if available == 0 && !src.is_closed() {
    Some(Status::SHORT_READ)
  } else if room == 0 {
    Some(Status::SHORT_WRITE)
  } else if available == 0 {
    Some(starved(src))
  } else {
    None
  }
}

/// A fixed-size field read a byte at a time, so it can straddle calls.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Field<const N: usize> {
  bytes: [u8; N],
  len: usize,
}

impl<const N: usize> Default for Field<N> {
  fn default() -> Self {
    Self {
      bytes: [0; N],
      len: 0,
    }
  }
}

impl<const N: usize> Field<N> {
  /// Pull bytes until the field is complete. `false` means `src` ran out
  /// first; what was read is kept for the next call.
  pub(crate) fn fill(&mut self, src: &mut Reader<'_>) -> bool {
    let got = src.take(N - self.len);
    self.bytes[self.len..self.len + got.len()].copy_from_slice(got);
    self.len += got.len();
    self.len == N
  }

  pub(crate) fn bytes(&self) -> &[u8; N] {
    &self.bytes
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rill_io::IoBuffer;

  #[test]
  fn field_straddles_calls() {
    let mut field = Field::<4>::default();
    let mut a = IoBuffer::reader_from(&b"\x01\x02"[..], false);
    assert!(!field.fill(&mut a.reader()));
    let mut b = IoBuffer::reader_from(&b"\x03\x04\x05"[..], false);
    assert!(field.fill(&mut b.reader()));
    assert_eq!(field.bytes(), &[1, 2, 3, 4]);
    assert_eq!(b.reader_slice(), b"\x05");
  }

  #[test]
  fn blocked_priorities() {
    let mut open = IoBuffer::reader_from(&b""[..], false);
    assert_eq!(blocked(&open.reader(), 0), Some(Status::SHORT_READ));

    let mut closed = IoBuffer::reader_from(&b""[..], true);
    assert_eq!(blocked(&closed.reader(), 0), Some(Status::SHORT_WRITE));
    assert_eq!(
      blocked(&closed.reader(), 1),
      Some(Status::Error(DecodeError::Truncated { offset: 0 }))
    );

    let mut some = IoBuffer::reader_from(&b"x"[..], false);
    assert_eq!(blocked(&some.reader(), 1), None);
  }
}
