#![warn(clippy::pedantic)]

pub mod error;
pub mod status;
pub mod token;
pub mod traits;

pub use error::{DecodeError, ErrorClass};
pub use status::{Note, Status, Suspension};
pub use token::{Container, FloatWidth, Literal, StringPart, Token, TokenValue};
pub use traits::{Hasher, TokenDecoder, TransformDecoder};
