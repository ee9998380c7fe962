mod document;
mod id_generator;

pub use bson::oid::ObjectId;
pub use document::*;
pub use id_generator::*;
