use std::fmt::{Display, Formatter};

/// Type identity of a [`crate::common::Value`].
///
/// This is the key of the leaf codec registry and the target of the
/// wire-tag resolution table. Application types plug in through
/// [`ValueType::Custom`], keyed by the same name their
/// [`crate::common::CustomValue`]s carry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Null,
    Boolean,
    Int32,
    Int64,
    Double,
    Decimal128,
    String,
    Symbol,
    Bytes,
    Binary,
    Uuid,
    ObjectId,
    DateTime,
    Regex,
    JavaScript,
    JavaScriptWithScope,
    Document,
    Array,
    Reference,
    Timestamp,
    MinKey,
    MaxKey,
    Custom(String),
}

impl ValueType {
    pub fn custom(type_name: &str) -> Self {
        ValueType::Custom(type_name.to_string())
    }

    /// Returns `true` for the forms the document codec writes itself rather
    /// than handing to a leaf codec.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ValueType::Null
                | ValueType::Reference
                | ValueType::Document
                | ValueType::Array
                | ValueType::JavaScriptWithScope
                | ValueType::Bytes
                | ValueType::Symbol
        )
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Custom(name) => write!(f, "Custom({})", name),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ValueType::Int32.to_string(), "Int32");
        assert_eq!(ValueType::custom("money").to_string(), "Custom(money)");
    }

    #[test]
    fn test_structural_forms() {
        assert!(ValueType::Reference.is_structural());
        assert!(ValueType::Bytes.is_structural());
        assert!(!ValueType::Uuid.is_structural());
        assert!(!ValueType::custom("money").is_structural());
    }
}
