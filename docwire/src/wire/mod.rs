//! The wire layer: type tags, the reader/writer contracts and their
//! implementations over bytes and over [`crate::common::Value`] trees.

mod binary_reader;
mod binary_writer;
mod bson_type;
mod reader;
mod value_writer;
mod writer;

pub use binary_reader::*;
pub use binary_writer::*;
pub use bson_type::*;
pub use reader::*;
pub use value_writer::*;
pub use writer::*;
