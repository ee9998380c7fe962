//! The document codec and its collaborators: leaf codecs and their
//! registry, the wire type table, field paths, document factories and the
//! per-call contexts.

mod context;
mod document_codec;
mod factory;
mod field_path;
mod identifier;
mod leaf;
mod leaf_codecs;
mod registry;
mod type_map;

pub use context::*;
pub use document_codec::*;
pub use factory::*;
pub use field_path::*;
pub use leaf::*;
pub use leaf_codecs::*;
pub use registry::*;
pub use type_map::*;
