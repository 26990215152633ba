use crate::error::DecodeError;

/// Which view stopped a decode call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Suspension {
  /// The source has no more bytes in this call and is not closed.
  ShortRead,
  /// The destination (byte writer or token sink) is full.
  ShortWrite,
}

/// A non-fatal pause that needs caller action before resuming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Note {
  /// The stream was compressed against a preset dictionary. Query the
  /// decoder's `dictionary_id()`, install the bytes with
  /// `set_dictionary`, then call again.
  DictionaryRequired,
}

/// The outcome of one decode call.
///
/// A call makes as much progress as its views allow and then reports the
/// first thing that stopped it, in this order:
///
/// ```text
///   1. finished                          → Ok
///   2. source empty, not closed          → Suspended(ShortRead)
///   3. destination full                  → Suspended(ShortWrite)
///   4. source empty and closed           → Error(Truncated)
///   5. invalid bytes                     → Error(..)
/// ```
///
/// Notes are raised at the point in the stream where they apply, before
/// any of the above can happen for that position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
  Ok,
  Suspended(Suspension),
  Note(Note),
  Error(DecodeError),
}

impl Status {
  pub const SHORT_READ: Self = Self::Suspended(Suspension::ShortRead);
  pub const SHORT_WRITE: Self = Self::Suspended(Suspension::ShortWrite);

  pub fn is_ok(&self) -> bool {
    matches!(self, Self::Ok)
  }

  /// True for `ShortRead` and `ShortWrite`: retrying after refilling or
  /// draining is always safe.
  pub fn is_suspension(&self) -> bool {
    matches!(self, Self::Suspended(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, Self::Error(_))
  }

  /// The error, if this status is fatal.
  pub fn error(&self) -> Option<&DecodeError> {
    match self {
      Self::Error(e) => Some(e),
      _ => None,
    }
  }

  /// Collapse into a `Result`, treating every non-error as success.
  ///
  /// # Errors
  ///
  /// Returns the contained [`DecodeError`] for `Status::Error`.
  pub fn into_result(self) -> Result<Self, DecodeError> {
    match self {
      Self::Error(e) => Err(e),
      other => Ok(other),
    }
  }
}

impl From<DecodeError> for Status {
  fn from(e: DecodeError) -> Self {
    Self::Error(e)
  }
}

impl From<Suspension> for Status {
  fn from(s: Suspension) -> Self {
    Self::Suspended(s)
  }
}
