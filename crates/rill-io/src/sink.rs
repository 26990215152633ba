use crate::error::IoError;

/// A fixed-capacity array of records, filled by a token decoder and
/// drained by the caller.
///
/// This is the record-typed sibling of [`IoBuffer`](crate::IoBuffer):
/// the decoder appends through a [`TokenWriter`] view and must stop (and
/// report a short write) when the view is full. The buffer never grows
/// past the capacity it was created with.
///
/// ```text
///   0          ri              len               capacity
///   ├──────────┼───────────────┼─────────────────┤
///   │ drained  │  pending      │  free slots     │
///   └──────────┴───────────────┴─────────────────┘
/// ```
#[derive(Clone, Debug)]
pub struct TokenBuffer<T> {
    data: Vec<T>,
    capacity: usize,
    ri: usize,
}

impl<T> TokenBuffer<T> {
    /// Create an empty buffer holding at most `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            ri: 0,
        }
    }

    /// Maximum number of records the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records written but not yet drained.
    pub fn pending(&self) -> &[T] {
        &self.data[self.ri..]
    }

    /// Number of free slots left without compacting.
    pub fn available_to_write(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// Mark `n` pending records as drained.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutOfRange`] if fewer than `n` records are
    /// pending.
    pub fn advance_read(&mut self, n: usize) -> Result<(), IoError> {
        let available = self.data.len() - self.ri;
        if n > available {
            return Err(IoError::OutOfRange {
                requested: n,
                available,
            });
        }
        self.ri += n;
        Ok(())
    }

    /// Remove and yield every pending record, leaving the buffer empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.compact();
        self.data.drain(..)
    }

    /// Drop drained records so their slots can be reused.
    pub fn compact(&mut self) {
        let ri = std::mem::take(&mut self.ri);
        self.data.drain(..ri);
    }

    /// Borrow the free slots as a [`TokenWriter`] view for one decode
    /// call.
    pub fn writer(&mut self) -> TokenWriter<'_, T> {
        let end = self.capacity;
        TokenWriter {
            data: &mut self.data,
            end,
        }
    }
}

/// The write side of a [`TokenBuffer`], handed to a decoder for one call.
///
/// As with byte writers, the caller may impose a per-call limit that is
/// tighter than the buffer's remaining capacity.
#[derive(Debug)]
pub struct TokenWriter<'a, T> {
    data: &'a mut Vec<T>,
    end: usize,
}

impl<T> TokenWriter<'_, T> {
    /// Cap this view at `limit` further records.
    #[must_use]
    pub fn with_limit(self, limit: usize) -> Self {
        let end = self.end.min(self.data.len().saturating_add(limit));
        Self { end, ..self }
    }

    /// Free slots remaining in this call.
    pub fn available_to_write(&self) -> usize {
        self.end - self.data.len()
    }

    /// Append `token`, or hand it back if the view is full.
    ///
    /// # Errors
    ///
    /// Returns the rejected record when no slot is free.
    pub fn try_push(&mut self, token: T) -> Result<(), T> {
        if self.data.len() < self.end {
            self.data.push(token);
            Ok(())
        } else {
            Err(token)
        }
    }
}
