/// Errors raised by the buffer views themselves.
///
/// These are caller contract violations, not data errors: a correct
/// caller never asks a view to advance past the bytes it holds. Data
/// errors (truncation, bad checksums, malformed structure) live in
/// `rill-types` as `DecodeError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IoError {
    /// An advance asked for more bytes (or token slots) than the view
    /// currently has available.
    #[error("cannot advance {requested} positions: only {available} available")]
    OutOfRange { requested: usize, available: usize },
}
