#![warn(missing_docs)]
//! Parsed server event records consumed by the audio core.
//!
//! Transport and wire decoding live elsewhere; this crate defines the
//! already-deserialized event shapes and their validity limits.

mod protocol;

pub use protocol::*;
