use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::ValueType;
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::BsonType;

static DEFAULT_TYPE_MAP: Lazy<HashMap<BsonType, ValueType>> = Lazy::new(|| {
    HashMap::from([
        (BsonType::Double, ValueType::Double),
        (BsonType::String, ValueType::String),
        (BsonType::Array, ValueType::Array),
        (BsonType::Binary, ValueType::Binary),
        (BsonType::Undefined, ValueType::Null),
        (BsonType::ObjectId, ValueType::ObjectId),
        (BsonType::Boolean, ValueType::Boolean),
        (BsonType::DateTime, ValueType::DateTime),
        (BsonType::Null, ValueType::Null),
        (BsonType::RegularExpression, ValueType::Regex),
        (BsonType::DbPointer, ValueType::Reference),
        (BsonType::JavaScript, ValueType::JavaScript),
        (BsonType::Symbol, ValueType::String),
        (BsonType::Int32, ValueType::Int32),
        (BsonType::Timestamp, ValueType::Timestamp),
        (BsonType::Int64, ValueType::Int64),
        (BsonType::Decimal128, ValueType::Decimal128),
        (BsonType::MinKey, ValueType::MinKey),
        (BsonType::MaxKey, ValueType::MaxKey),
    ])
});

/// Maps a wire type tag to the [ValueType] whose leaf codec decodes it.
///
/// The table is fixed once built. Embedded documents and code-with-scope have
/// no entry: the document codec reads them itself.
///
/// Defaults worth noting: the deprecated symbol reads as a string, the
/// deprecated undefined reads as null and a DB pointer reads as a reference.
///
/// # Examples
///
/// ```rust,ignore
/// let map = BsonTypeClassMap::with_overrides([(BsonType::Symbol, ValueType::custom("symbol"))]);
/// assert_eq!(map.get(BsonType::Symbol)?, &ValueType::custom("symbol"));
/// ```
#[derive(Clone, Debug)]
pub struct BsonTypeClassMap {
    map: Arc<HashMap<BsonType, ValueType>>,
}

impl Default for BsonTypeClassMap {
    fn default() -> Self {
        BsonTypeClassMap {
            map: Arc::new(DEFAULT_TYPE_MAP.clone()),
        }
    }
}

impl BsonTypeClassMap {
    pub fn new() -> Self {
        BsonTypeClassMap::default()
    }

    /// Builds the default table with the given entries replaced or added.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (BsonType, ValueType)>,
    {
        let mut map = DEFAULT_TYPE_MAP.clone();
        for (bson_type, value_type) in overrides {
            map.insert(bson_type, value_type);
        }
        BsonTypeClassMap { map: Arc::new(map) }
    }

    /// Returns the value type registered for the tag.
    ///
    /// # Errors
    ///
    /// [ErrorKind::CodecConfigurationError] when the tag has no entry.
    pub fn get(&self, bson_type: BsonType) -> DocwireResult<&ValueType> {
        self.map.get(&bson_type).ok_or_else(|| {
            log::error!("No value type is mapped for wire type {}", bson_type);
            DocwireError::new(
                &format!("No value type is mapped for wire type {}", bson_type),
                ErrorKind::CodecConfigurationError,
            )
        })
    }

    pub fn contains(&self, bson_type: BsonType) -> bool {
        self.map.contains_key(&bson_type)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
