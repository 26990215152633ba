use rill_io::IoError;
use rill_types::DecodeError;

/// Errors that stop a pump.
///
/// ```text
/// ┌───────────────────────┬──────────────────────────────────────────────┐
/// │ Variant               │ Cause                                        │
/// ├───────────────────────┼──────────────────────────────────────────────┤
/// │ Io                    │ Reading input or writing output failed       │
/// │ Decode                │ The decoder returned an error status         │
/// │ Buffer                │ A buffer cursor was moved out of range       │
/// │ DictionaryUnavailable │ Stream needs a dictionary none was given for │
/// │ Stalled               │ A status repeated with nothing left to do    │
/// └───────────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("buffer error: {0}")]
    Buffer(#[from] IoError),

    #[error("stream requires dictionary {} but none is configured", display_id(.id))]
    DictionaryUnavailable { id: Option<u32> },

    #[error("decoder stalled on {status}")]
    Stalled { status: &'static str },
}

#[allow(clippy::ref_option)]
fn display_id(id: &Option<u32>) -> String {
    id.map_or_else(|| "(unknown id)".to_owned(), |id| format!("{id:#010x}"))
}

impl DriverError {
    /// The decode error, if this is one.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}
