#![warn(clippy::pedantic)]

//! Concrete resumable decoders.
//!
//! Every decoder here is a plain state object driven by repeated calls to
//! its step method ([`TokenDecoder::decode_tokens`] or
//! [`TransformDecoder::transform`]). Nothing blocks and nothing buffers
//! without bound: when a view runs dry the call returns a suspension and
//! the next call picks up from the saved state.
//!
//! [`TokenDecoder::decode_tokens`]: rill_types::TokenDecoder::decode_tokens
//! [`TransformDecoder::transform`]: rill_types::TransformDecoder::transform

pub mod cbor;
pub mod gzip;
pub mod inflate;
pub mod zlib;
pub mod zstd_frame;

mod resume;

pub use cbor::CborDecoder;
pub use gzip::GzipDecoder;
pub use inflate::Inflater;
pub use zlib::ZlibDecoder;
pub use zstd_frame::ZstdDecoder;
