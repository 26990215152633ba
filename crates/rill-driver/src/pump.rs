use std::io::{self, Read, Write};

use rill_io::{IoBuffer, TokenBuffer};
use rill_types::{Hasher, Note, Status, Suspension, Token, TokenDecoder, TransformDecoder};
use tracing::{debug, trace};

use crate::config::PumpConfig;
use crate::error::DriverError;

/// Counters gathered while pumping one stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Bytes the decoder consumed.
    pub bytes_in: u64,
    /// Bytes the decoder produced.
    pub bytes_out: u64,
    /// Decoder calls made.
    pub calls: u64,
    pub short_reads: u64,
    pub short_writes: u64,
}

impl PumpReport {
    /// Total suspensions of either kind.
    pub fn suspensions(&self) -> u64 {
        self.short_reads + self.short_writes
    }
}

/// What the pump has to do before the next decoder call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Next {
    Call,
    Refill,
    Finished,
}

/// Buffers and bookkeeping shared by the blocking and async pumps.
///
/// [`call`](Self::call) runs the decoder once and turns its status into a
/// [`Next`]. The pump then drains [`output`](Self::output) and, on
/// [`Next::Refill`], reads into [`input_spare`](Self::input_spare).
pub(crate) struct Session {
    src: IoBuffer,
    dst: IoBuffer,
    scratch: Vec<u8>,
    read_limit: Option<usize>,
    write_limit: Option<usize>,
    dictionary_sent: bool,
    report: PumpReport,
}

impl Session {
    pub(crate) fn new<D>(decoder: &mut D, config: &PumpConfig) -> Self
    where
        D: TransformDecoder + ?Sized,
    {
        decoder.set_ignore_checksum(config.ignore_checksum);
        Self {
            src: IoBuffer::with_capacity(config.input_len()),
            dst: IoBuffer::with_capacity(config.output_len()),
            scratch: vec![0u8; decoder.scratch_len()],
            read_limit: config.read_limit(),
            write_limit: config.write_limit(),
            dictionary_sent: false,
            report: PumpReport::default(),
        }
    }

    pub(crate) fn call<D>(&mut self, decoder: &mut D, config: &PumpConfig) -> Result<Next, DriverError>
    where
        D: TransformDecoder + ?Sized,
    {
        let before = self.src.reader_position();
        let status = {
            let mut src = self.src.reader();
            if let Some(limit) = self.read_limit {
                src = src.with_limit(limit);
            }
            let mut dst = self.dst.writer();
            if let Some(limit) = self.write_limit {
                dst = dst.with_limit(limit);
            }
            decoder.transform(&mut dst, &mut src, &mut self.scratch)
        };
        self.report.calls += 1;
        self.report.bytes_in = self.src.reader_position();
        let consumed = self.report.bytes_in - before;
        let produced = self.dst.available_to_read();
        trace!(?status, consumed, produced, "transform returned");

        match status {
            Status::Ok => Ok(Next::Finished),
            Status::Error(e) => Err(e.into()),
            Status::Suspended(Suspension::ShortWrite) => {
                self.report.short_writes += 1;
                if produced == 0 {
                    return Err(DriverError::Stalled {
                        status: "short write",
                    });
                }
                Ok(Next::Call)
            }
            Status::Suspended(Suspension::ShortRead) => {
                self.report.short_reads += 1;
                if self.src.available_to_read() == 0 {
                    if self.src.is_closed() {
                        return Err(DriverError::Stalled {
                            status: "short read",
                        });
                    }
                    Ok(Next::Refill)
                } else if consumed == 0 && produced == 0 {
                    Err(DriverError::Stalled {
                        status: "short read",
                    })
                } else {
                    // A read limit hid bytes that are already buffered.
                    Ok(Next::Call)
                }
            }
            Status::Note(Note::DictionaryRequired) => {
                let id = decoder.dictionary_id();
                match &config.dictionary {
                    _ if self.dictionary_sent => Err(DriverError::Stalled {
                        status: "dictionary required",
                    }),
                    Some(dictionary) => {
                        debug!(?id, len = dictionary.len(), "installing dictionary");
                        decoder.set_dictionary(dictionary);
                        self.dictionary_sent = true;
                        Ok(Next::Call)
                    }
                    None => Err(DriverError::DictionaryUnavailable { id }),
                }
            }
        }
    }

    /// Decoded bytes waiting to be written out.
    pub(crate) fn output(&self) -> &[u8] {
        self.dst.reader_slice()
    }

    /// Record that [`output`](Self::output) has been written and reuse its
    /// space.
    pub(crate) fn output_drained(&mut self) {
        self.report.bytes_out += self.dst.available_to_read() as u64;
        self.dst.clear();
    }

    /// Free space to read more input into.
    pub(crate) fn input_spare(&mut self) -> &mut [u8] {
        self.src.compact();
        self.src.writer_slice_mut()
    }

    /// Commit `n` bytes read into [`input_spare`](Self::input_spare). Zero
    /// means end of input.
    pub(crate) fn input_read(&mut self, n: usize) -> Result<(), DriverError> {
        if n == 0 {
            trace!(bytes_in = self.report.bytes_in, "input closed");
            self.src.mark_closed();
        } else {
            self.src.advance_write(n)?;
        }
        Ok(())
    }

    pub(crate) fn report(&self) -> PumpReport {
        self.report
    }
}

/// Read once, retrying on [`io::ErrorKind::Interrupted`].
pub(crate) fn read_some<R: Read + ?Sized>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            other => return other,
        }
    }
}

/// Run `decoder` from `input` to `output` until it finishes or fails.
///
/// Decoded bytes are written after every call, so on error `output` holds
/// everything produced before the failure.
///
/// # Errors
///
/// Returns [`DriverError::Decode`] for decoder errors, [`DriverError::Io`]
/// for failures of `input` or `output`, and
/// [`DriverError::DictionaryUnavailable`] when the stream asks for a
/// dictionary that `config` does not carry.
pub fn pump_transform<D, R, W>(
    decoder: &mut D,
    mut input: R,
    mut output: W,
    config: &PumpConfig,
) -> Result<PumpReport, DriverError>
where
    D: TransformDecoder + ?Sized,
    R: Read,
    W: Write,
{
    let mut session = Session::new(decoder, config);
    loop {
        let next = session.call(decoder, config);
        output.write_all(session.output())?;
        session.output_drained();
        match next? {
            Next::Finished => {
                output.flush()?;
                return Ok(session.report());
            }
            Next::Call => {}
            Next::Refill => {
                let n = read_some(&mut input, session.input_spare())?;
                session.input_read(n)?;
            }
        }
    }
}

/// Feed all of `input` through `hasher`, `chunk` bytes at a time, and
/// return the final checksum.
///
/// # Errors
///
/// Propagates read errors from `input`.
pub fn hash_reader<H, R>(hasher: &mut H, mut input: R, chunk: usize) -> io::Result<u64>
where
    H: Hasher + ?Sized,
    R: Read,
{
    hasher.initialize();
    let mut buf = vec![0u8; chunk.max(1)];
    loop {
        let n = read_some(&mut input, &mut buf)?;
        if n == 0 {
            return Ok(hasher.checksum_u64());
        }
        hasher.update(&buf[..n]);
    }
}

/// Run a token decoder over `input` through a sink of `token_capacity`
/// slots and collect every token.
///
/// # Errors
///
/// Returns [`DriverError::Decode`] for decoder errors and
/// [`DriverError::Io`] for read failures.
pub fn collect_tokens<D, R>(
    decoder: &mut D,
    mut input: R,
    config: &PumpConfig,
    token_capacity: usize,
) -> Result<Vec<Token>, DriverError>
where
    D: TokenDecoder + ?Sized,
    R: Read,
{
    let mut src = IoBuffer::with_capacity(config.input_len());
    let mut sink = TokenBuffer::with_capacity(token_capacity.max(1));
    let mut scratch = vec![0u8; decoder.scratch_len()];
    let mut tokens = Vec::new();
    loop {
        let before = src.reader_position();
        let status = {
            let mut r = src.reader();
            if let Some(limit) = config.read_limit() {
                r = r.with_limit(limit);
            }
            let mut w = sink.writer();
            if let Some(limit) = config.write_limit() {
                w = w.with_limit(limit);
            }
            decoder.decode_tokens(&mut w, &mut r, &mut scratch)
        };
        let produced = sink.pending().len();
        let consumed = src.reader_position() - before;
        tokens.extend(sink.drain());
        trace!(?status, consumed, produced, "decode_tokens returned");

        match status {
            Status::Ok => return Ok(tokens),
            Status::Error(e) => return Err(e.into()),
            Status::Suspended(Suspension::ShortWrite) if produced == 0 => {
                return Err(DriverError::Stalled {
                    status: "short write",
                });
            }
            Status::Suspended(Suspension::ShortWrite) => {}
            Status::Suspended(Suspension::ShortRead) => {
                if src.available_to_read() > 0 {
                    if consumed == 0 && produced == 0 {
                        return Err(DriverError::Stalled {
                            status: "short read",
                        });
                    }
                    continue;
                }
                if src.is_closed() {
                    return Err(DriverError::Stalled {
                        status: "short read",
                    });
                }
                src.compact();
                let n = read_some(&mut input, src.writer_slice_mut())?;
                if n == 0 {
                    src.mark_closed();
                } else {
                    src.advance_write(n)?;
                }
            }
            Status::Note(_) => {
                return Err(DriverError::Stalled {
                    status: "note from a token decoder",
                });
            }
        }
    }
}
