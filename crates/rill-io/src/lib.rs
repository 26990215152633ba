#![warn(clippy::pedantic)]

pub mod buffer;
pub mod error;
pub mod sink;

pub use buffer::{IoBuffer, Reader, Writer};
pub use error::IoError;
pub use sink::{TokenBuffer, TokenWriter};
