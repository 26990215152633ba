/// DEFLATE's maximum back-reference distance.
pub const WINDOW_LEN: usize = 32 * 1024;

const MASK: usize = WINDOW_LEN - 1;

/// Ring buffer of the most recent output, the source for back-references.
#[derive(Clone)]
pub(crate) struct Window {
  buf: Vec<u8>,
  pos: usize,
  filled: usize,
}

impl std::fmt::Debug for Window {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Window")
      .field("pos", &self.pos)
      .field("filled", &self.filled)
      .finish_non_exhaustive()
  }
}

impl Window {
  pub(crate) fn new() -> Self {
    Self {
      buf: vec![0; WINDOW_LEN],
      pos: 0,
      filled: 0,
    }
  }

  /// Bytes of history available to back-references.
  pub(crate) fn filled(&self) -> usize {
    self.filled
  }

  pub(crate) fn push(&mut self, b: u8) {
    self.buf[self.pos] = b;
    self.pos = (self.pos + 1) & MASK;
    if self.filled < WINDOW_LEN {
      self.filled += 1;
    }
  }

  pub(crate) fn extend(&mut self, bytes: &[u8]) {
    let tail = &bytes[bytes.len().saturating_sub(WINDOW_LEN)..];
    for &b in tail {
      self.buf[self.pos] = b;
      self.pos = (self.pos + 1) & MASK;
    }
    self.filled = (self.filled + bytes.len()).min(WINDOW_LEN);
  }

  /// The byte `distance` positions back. `distance` must be in
  /// `1..=filled()`.
  pub(crate) fn back(&self, distance: usize) -> u8 {
    self.buf[(self.pos + WINDOW_LEN - distance) & MASK]
  }
}
