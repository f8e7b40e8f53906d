//! Binary blob codec for the Structured Object Model (SOM).
//!
//! Serializes a full object graph, change flags included, into a
//! CRC-checked blob and rebuilds it against a schema repository. Decoding
//! verifies kind tags and nested type ids against the schema, so a blob
//! produced under a different schema fails loudly instead of misreading.
//!
//! # Architecture
//!
//! - **Blob** (`"SOMB"`): header, schema-driven body, CRC32 trailer
//! - **Envelope** (`"SOMZ"`): optional zstd wrapper around a blob
//! - [`to_binary`] / [`from_binary`]: the flag-preserving round trip
//! - [`peek_type_id`]: header-only type dispatch without a full decode

pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
mod reader;
mod writer;

pub use decode::{from_binary, peek_type_id};
pub use encode::to_binary;
pub use envelope::{compress, compress_with, decompress, is_compressed, EnvelopeConfig};
pub use error::{WireError, WireResult};
