//! # docwire - Document Codec
//!
//! docwire converts between ordered, dynamically typed documents and the
//! BSON binary document format used by document-database clients.
//!
//! ## Key Features
//!
//! - **Ordered documents**: field order survives every round trip
//! - **Pluggable leaf codecs**: every scalar type is handled by a registered codec
//! - **References**: `{"$ref", "$id"[, "$db"]}` documents fold into typed references
//! - **Identifiers**: `_id` generation and `_id`-first placement for collectible documents
//! - **Binary subtypes**: UUIDs, raw bytes and generic binaries are told apart on decode
//! - **Fail-closed encoding**: an error never leaves half a value in the output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docwire::codec::{DecoderContext, DocumentCodec, EncoderContext};
//! use docwire::doc;
//!
//! let codec = DocumentCodec::default();
//! let mut document = doc! { name: "Alice", tags: ["a", "b"] };
//!
//! let bytes = codec.encode_to_vec(&document, &EncoderContext::default())?;
//! let back = codec.decode_from_slice(&bytes, &DecoderContext::default())?;
//! assert_eq!(document, back);
//! ```
//!
//! ## Module Organization
//!
//! - [`codec`] - The document codec, leaf codecs, registry and type table
//! - [`codec_builder`] - Fluent construction of a codec
//! - [`codec_config`] - Codec configuration
//! - [`common`] - Values, value types and leaf value types
//! - [`document`] - Documents, object ids and identifier generation
//! - [`errors`] - Error types and result definitions
//! - [`wire`] - Binary reader and writer

pub mod codec;
pub mod codec_builder;
pub mod codec_config;
pub mod common;
pub mod document;
pub mod errors;
pub mod wire;

pub use crate::codec::{DecoderContext, DocumentCodec, EncoderContext};
pub use crate::codec_builder::DocumentCodecBuilder;
pub use crate::codec_config::CodecConfig;
pub(crate) use crate::common::{atomic, Atomic};
pub use crate::common::Value;
pub use crate::document::{Document, ObjectId};
pub use crate::errors::{DocwireError, DocwireResult, ErrorKind};
