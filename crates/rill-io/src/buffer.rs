use crate::error::IoError;

/// Cursor metadata for an [`IoBuffer`].
///
/// ```text
///   0          ri              wi                capacity
///   ├──────────┼───────────────┼─────────────────┤
///   │ consumed │  readable     │  writable       │
///   └──────────┴───────────────┴─────────────────┘
/// ```
///
/// Invariant: `ri <= wi <= capacity`. `pos` is the stream position of
/// `data[0]`, so `pos + ri` is the absolute position of the next byte to
/// be read. `closed` means the producer will never append again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Meta {
    wi: usize,
    ri: usize,
    pos: u64,
    closed: bool,
}

/// A fixed-capacity byte region with independent read and write cursors.
///
/// The same type serves both directions of a decode call:
///
/// - as the **source**, the caller appends bytes at `wi` and the decoder
///   consumes them from `ri` through a [`Reader`] view;
/// - as the **destination**, the decoder appends bytes at `wi` through a
///   [`Writer`] view and the caller drains them from `ri`.
///
/// The backing storage is anything that derefs to a byte slice, so a
/// buffer may own its bytes (`Vec<u8>`, the default) or borrow them
/// (`&[u8]` for a read-only source, `&mut [u8]` for a destination).
///
/// # Example
///
/// ```rust
/// use rill_io::IoBuffer;
///
/// let mut src = IoBuffer::with_capacity(8);
/// assert_eq!(src.fill_from(b"hello world"), 8);
/// assert_eq!(src.reader_slice(), b"hello wo");
///
/// src.advance_read(6).unwrap();
/// src.compact();
/// assert_eq!(src.reader_slice(), b"wo");
/// assert_eq!(src.reader_position(), 6);
/// ```
#[derive(Clone, Debug)]
pub struct IoBuffer<B = Vec<u8>> {
    data: B,
    meta: Meta,
}

impl IoBuffer<Vec<u8>> {
    /// Create an empty, owned buffer of `capacity` bytes.
    ///
    /// The bytes are zero-filled once here and then reused; nothing in
    /// this crate ever reads `data[wi..]`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::writer_from(vec![0u8; capacity])
    }
}

impl<B: AsRef<[u8]>> IoBuffer<B> {
    /// Wrap `data` as a fully-written source buffer.
    ///
    /// Every byte of `data` is readable. Pass `closed = true` when `data`
    /// is the entire stream.
    pub fn reader_from(data: B, closed: bool) -> Self {
        let wi = data.as_ref().len();
        Self {
            data,
            meta: Meta {
                wi,
                ri: 0,
                pos: 0,
                closed,
            },
        }
    }

    /// Total size of the backing region.
    pub fn capacity(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Number of written but not yet consumed bytes.
    pub fn available_to_read(&self) -> usize {
        self.meta.wi - self.meta.ri
    }

    /// The read cursor.
    pub fn read_index(&self) -> usize {
        self.meta.ri
    }

    /// The write cursor.
    pub fn write_index(&self) -> usize {
        self.meta.wi
    }

    /// Whether the producer has declared end of stream.
    pub fn is_closed(&self) -> bool {
        self.meta.closed
    }

    /// Declare that no further bytes will ever be appended.
    pub fn mark_closed(&mut self) {
        self.meta.closed = true;
    }

    /// The unconsumed bytes `data[ri..wi]`.
    pub fn reader_slice(&self) -> &[u8] {
        &self.data.as_ref()[self.meta.ri..self.meta.wi]
    }

    /// Absolute stream position of the next byte to be read.
    pub fn reader_position(&self) -> u64 {
        self.meta.pos.saturating_add(self.meta.ri as u64)
    }

    /// Absolute stream position of the next byte to be written.
    pub fn writer_position(&self) -> u64 {
        self.meta.pos.saturating_add(self.meta.wi as u64)
    }

    /// Consume `n` bytes from the read side.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutOfRange`] if `n` exceeds
    /// [`available_to_read`](Self::available_to_read).
    pub fn advance_read(&mut self, n: usize) -> Result<(), IoError> {
        let available = self.available_to_read();
        if n > available {
            return Err(IoError::OutOfRange {
                requested: n,
                available,
            });
        }
        self.meta.ri += n;
        Ok(())
    }

    /// Borrow the read side as a [`Reader`] view for one decode call.
    ///
    /// Bytes the decoder consumes through the view advance this buffer's
    /// read cursor directly.
    pub fn reader(&mut self) -> Reader<'_> {
        let wi = self.meta.wi;
        Reader {
            data: &self.data.as_ref()[..wi],
            ri: &mut self.meta.ri,
            end: wi,
            closed: self.meta.closed,
            pos: self.meta.pos,
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> IoBuffer<B> {
    /// Wrap `data` as an empty destination buffer.
    pub fn writer_from(data: B) -> Self {
        Self {
            data,
            meta: Meta::default(),
        }
    }

    /// Number of bytes that can still be appended without compacting.
    pub fn available_to_write(&self) -> usize {
        self.capacity() - self.meta.wi
    }

    /// Mark `n` more bytes of `data[wi..]` as written.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutOfRange`] if `n` exceeds
    /// [`available_to_write`](Self::available_to_write).
    pub fn advance_write(&mut self, n: usize) -> Result<(), IoError> {
        let available = self.available_to_write();
        if n > available {
            return Err(IoError::OutOfRange {
                requested: n,
                available,
            });
        }
        self.meta.wi += n;
        Ok(())
    }

    /// The unwritten tail `data[wi..]`, for callers that fill it directly
    /// (for example with `std::io::Read::read`) and then call
    /// [`advance_write`](Self::advance_write).
    pub fn writer_slice_mut(&mut self) -> &mut [u8] {
        let wi = self.meta.wi;
        &mut self.data.as_mut()[wi..]
    }

    /// Append as much of `src` as fits and return how many bytes were
    /// copied.
    pub fn fill_from(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.available_to_write());
        let wi = self.meta.wi;
        self.data.as_mut()[wi..wi + n].copy_from_slice(&src[..n]);
        self.meta.wi += n;
        n
    }

    /// Move the unconsumed bytes to the front of the buffer.
    ///
    /// The stream position is carried forward so that
    /// [`reader_position`](Self::reader_position) is unchanged.
    pub fn compact(&mut self) {
        if self.meta.ri == 0 {
            return;
        }
        let (ri, wi) = (self.meta.ri, self.meta.wi);
        self.data.as_mut().copy_within(ri..wi, 0);
        self.meta.pos = self.meta.pos.saturating_add(ri as u64);
        self.meta.wi = wi - ri;
        self.meta.ri = 0;
    }

    /// Discard every byte, readable or not, keeping the stream position.
    ///
    /// This is how a caller drains a destination buffer after copying
    /// out [`reader_slice`](IoBuffer::reader_slice).
    pub fn clear(&mut self) {
        self.meta.pos = self.meta.pos.saturating_add(self.meta.wi as u64);
        self.meta.wi = 0;
        self.meta.ri = 0;
    }

    /// Borrow the write side as a [`Writer`] view for one decode call.
    pub fn writer(&mut self) -> Writer<'_> {
        let data = self.data.as_mut();
        let end = data.len();
        Writer {
            data,
            wi: &mut self.meta.wi,
            end,
        }
    }
}

/// The read side of an [`IoBuffer`], handed to a decoder for one call.
///
/// A view may carry a caller-imposed *limit* tighter than the bytes the
/// buffer actually holds:
///
/// ```text
///   effective_end = min(read_index + limit, write_index)
/// ```
///
/// A limited view is never reported as closed, because bytes beyond the
/// limit still exist. Once a closed view is exhausted the decoder must
/// report truncation rather than a short read.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    ri: &'a mut usize,
    end: usize,
    closed: bool,
    pos: u64,
}

impl<'a> Reader<'a> {
    /// Cap this view at `limit` further bytes.
    #[must_use]
    pub fn with_limit(self, limit: usize) -> Self {
        let end = self.end.min(self.ri.saturating_add(limit));
        Self { end, ..self }
    }

    /// Bytes the decoder may still consume in this call.
    pub fn available_to_read(&self) -> usize {
        self.end - *self.ri
    }

    /// True when the producer closed the stream and no limit hides
    /// further bytes.
    pub fn is_closed(&self) -> bool {
        self.closed && self.end == self.data.len()
    }

    /// True when nothing more is available and nothing more ever will be.
    pub fn is_exhausted(&self) -> bool {
        self.is_closed() && self.available_to_read() == 0
    }

    /// The bytes available in this call, without consuming them.
    pub fn peek(&self) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        &data[*self.ri..self.end]
    }

    /// Consume and return a single byte.
    pub fn read_u8(&mut self) -> Option<u8> {
        if *self.ri < self.end {
            let b = self.data[*self.ri];
            *self.ri += 1;
            Some(b)
        } else {
            None
        }
    }

    /// Consume and return up to `max` bytes.
    pub fn take(&mut self, max: usize) -> &'a [u8] {
        let n = max.min(self.available_to_read());
        let data: &'a [u8] = self.data;
        let start = *self.ri;
        *self.ri += n;
        &data[start..start + n]
    }

    /// Consume `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutOfRange`] if `n` exceeds
    /// [`available_to_read`](Self::available_to_read).
    pub fn advance_read(&mut self, n: usize) -> Result<(), IoError> {
        let available = self.available_to_read();
        if n > available {
            return Err(IoError::OutOfRange {
                requested: n,
                available,
            });
        }
        *self.ri += n;
        Ok(())
    }

    /// Absolute stream position of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.pos.saturating_add(*self.ri as u64)
    }
}

/// The write side of an [`IoBuffer`], handed to a decoder for one call.
///
/// Like [`Reader`], a writer may carry a per-call limit:
///
/// ```text
///   effective_end = min(write_index + limit, capacity)
/// ```
#[derive(Debug)]
pub struct Writer<'a> {
    data: &'a mut [u8],
    wi: &'a mut usize,
    end: usize,
}

impl Writer<'_> {
    /// Cap this view at `limit` further bytes.
    #[must_use]
    pub fn with_limit(self, limit: usize) -> Self {
        let end = self.end.min(self.wi.saturating_add(limit));
        Self { end, ..self }
    }

    /// Bytes the decoder may still produce in this call.
    pub fn available_to_write(&self) -> usize {
        self.end - *self.wi
    }

    /// The write cursor, for use with
    /// [`written_since`](Self::written_since).
    pub fn mark(&self) -> usize {
        *self.wi
    }

    /// The bytes written through this view since `mark` was taken.
    pub fn written_since(&self, mark: usize) -> &[u8] {
        &self.data[mark.min(*self.wi)..*self.wi]
    }

    /// Append one byte. Returns `false` if the view is full.
    pub fn write_u8(&mut self, b: u8) -> bool {
        if *self.wi < self.end {
            self.data[*self.wi] = b;
            *self.wi += 1;
            true
        } else {
            false
        }
    }

    /// Append as much of `src` as fits and return how many bytes were
    /// written.
    pub fn write_slice(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.available_to_write());
        let wi = *self.wi;
        self.data[wi..wi + n].copy_from_slice(&src[..n]);
        *self.wi += n;
        n
    }

    /// The writable region of this call, `data[wi..effective_end]`.
    ///
    /// Anything placed here only counts once
    /// [`advance_write`](Self::advance_write) is called.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let wi = *self.wi;
        &mut self.data[wi..self.end]
    }

    /// Mark `n` bytes of [`spare_mut`](Self::spare_mut) as written.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutOfRange`] if `n` exceeds
    /// [`available_to_write`](Self::available_to_write).
    pub fn advance_write(&mut self, n: usize) -> Result<(), IoError> {
        let available = self.available_to_write();
        if n > available {
            return Err(IoError::OutOfRange {
                requested: n,
                available,
            });
        }
        *self.wi += n;
        Ok(())
    }
}
