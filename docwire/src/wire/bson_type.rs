use bson::spec::ElementType;
use std::fmt::{Display, Formatter};

pub use bson::spec::BinarySubtype;

/// The wire type of an element, plus the end-of-container marker a reader
/// reports when a document or array has no more elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BsonType {
    /// Terminates a document or an array.
    EndOfDocument,
    Double,
    String,
    Document,
    Array,
    Binary,
    /// Deprecated.
    Undefined,
    ObjectId,
    Boolean,
    DateTime,
    Null,
    RegularExpression,
    /// Deprecated legacy reference: namespace + object id.
    DbPointer,
    JavaScript,
    /// Deprecated.
    Symbol,
    JavaScriptWithScope,
    Int32,
    Timestamp,
    Int64,
    Decimal128,
    MinKey,
    MaxKey,
}

impl BsonType {
    /// The element type behind this tag, `None` for [BsonType::EndOfDocument].
    pub fn element_type(&self) -> Option<ElementType> {
        let element_type = match self {
            BsonType::EndOfDocument => return None,
            BsonType::Double => ElementType::Double,
            BsonType::String => ElementType::String,
            BsonType::Document => ElementType::EmbeddedDocument,
            BsonType::Array => ElementType::Array,
            BsonType::Binary => ElementType::Binary,
            BsonType::Undefined => ElementType::Undefined,
            BsonType::ObjectId => ElementType::ObjectId,
            BsonType::Boolean => ElementType::Boolean,
            BsonType::DateTime => ElementType::DateTime,
            BsonType::Null => ElementType::Null,
            BsonType::RegularExpression => ElementType::RegularExpression,
            BsonType::DbPointer => ElementType::DbPointer,
            BsonType::JavaScript => ElementType::JavaScriptCode,
            BsonType::Symbol => ElementType::Symbol,
            BsonType::JavaScriptWithScope => ElementType::JavaScriptCodeWithScope,
            BsonType::Int32 => ElementType::Int32,
            BsonType::Timestamp => ElementType::Timestamp,
            BsonType::Int64 => ElementType::Int64,
            BsonType::Decimal128 => ElementType::Decimal128,
            BsonType::MinKey => ElementType::MinKey,
            BsonType::MaxKey => ElementType::MaxKey,
        };
        Some(element_type)
    }

    /// The tag byte written in front of the element.
    pub fn tag(&self) -> u8 {
        self.element_type().map(|element_type| element_type as u8).unwrap_or(0)
    }
}

impl From<ElementType> for BsonType {
    fn from(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Double => BsonType::Double,
            ElementType::String => BsonType::String,
            ElementType::EmbeddedDocument => BsonType::Document,
            ElementType::Array => BsonType::Array,
            ElementType::Binary => BsonType::Binary,
            ElementType::Undefined => BsonType::Undefined,
            ElementType::ObjectId => BsonType::ObjectId,
            ElementType::Boolean => BsonType::Boolean,
            ElementType::DateTime => BsonType::DateTime,
            ElementType::Null => BsonType::Null,
            ElementType::RegularExpression => BsonType::RegularExpression,
            ElementType::DbPointer => BsonType::DbPointer,
            ElementType::JavaScriptCode => BsonType::JavaScript,
            ElementType::Symbol => BsonType::Symbol,
            ElementType::JavaScriptCodeWithScope => BsonType::JavaScriptWithScope,
            ElementType::Int32 => BsonType::Int32,
            ElementType::Timestamp => BsonType::Timestamp,
            ElementType::Int64 => BsonType::Int64,
            ElementType::Decimal128 => BsonType::Decimal128,
            ElementType::MinKey => BsonType::MinKey,
            ElementType::MaxKey => BsonType::MaxKey,
        }
    }
}

impl Display for BsonType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Classifies the binary subtypes the decoder dispatches on.
pub trait SubtypeClass {
    /// Returns `true` for the two subtypes that mark a UUID payload.
    fn is_uuid(&self) -> bool;

    /// Returns `true` for the two subtypes that carry plain bytes.
    fn is_raw_bytes(&self) -> bool;
}

impl SubtypeClass for BinarySubtype {
    fn is_uuid(&self) -> bool {
        matches!(self, BinarySubtype::Uuid | BinarySubtype::UuidOld)
    }

    fn is_raw_bytes(&self) -> bool {
        matches!(self, BinarySubtype::Generic | BinarySubtype::BinaryOld)
    }
}
