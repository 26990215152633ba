#![warn(clippy::pedantic)]

//! The caller side of the resume protocol.
//!
//! Decoders never touch files or sockets. The pumps here own the
//! buffers, move bytes between them and real I/O, and react to each
//! [`Status`](rill_types::Status) a decoder returns:
//!
//! ```text
//!   ShortRead   → refill (or mark closed at EOF) and call again
//!   ShortWrite  → drain output and call again
//!   Note        → install the configured dictionary once and call again
//!   Ok / Error  → stop
//! ```

pub mod config;
pub mod error;
pub mod pump;
pub mod streaming;

pub use config::PumpConfig;
pub use error::DriverError;
pub use pump::{PumpReport, collect_tokens, hash_reader, pump_transform};
pub use streaming::AsyncPump;
