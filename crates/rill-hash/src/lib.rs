#![warn(clippy::pedantic)]

//! Streaming checksums.
//!
//! Each hasher implements [`rill_types::Hasher`]: feed it slices of any
//! size, in any number of calls, and it reports the same value as one call
//! over the concatenation.

pub mod adler32;
pub mod crc32;
pub mod crc64;

pub use adler32::Adler32;
pub use crc32::Crc32;
pub use crc64::Crc64;
