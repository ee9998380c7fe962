use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::fmt::{Debug, Display};

use crate::common::{Value, DOC_ID};

/// Represents an ordered document: field name to [Value].
///
/// Field order is the insertion order and it is semantically significant:
/// it is kept through encoding and decoding, and two documents are equal only
/// when they hold the same fields in the same order.
///
/// Replacing the value of an existing field keeps the field at its original
/// position. Removing a field keeps the relative order of the others.
///
/// Any string is a valid field name, including the empty string.
#[derive(Clone, Default)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let doc = Document::new();
    /// assert!(doc.is_empty());
    /// assert_eq!(doc.size(), 0);
    /// ```
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Document {
            data: IndexMap::with_capacity(capacity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified key in this document.
    ///
    /// A new key is appended at the end. An existing key keeps its position
    /// and the previous value is returned.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice");
    /// doc.put("age", 30);
    /// assert_eq!(doc.put("name", "Bob"), Some(Value::from("Alice")));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: impl Into<String>, value: T) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Returns the value associated with the key, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Value::as_i32)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(Value::as_document)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes the key and returns its value. The remaining fields keep their
    /// relative order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Returns the `_id` value of the document, if present.
    pub fn id(&self) -> Option<&Value> {
        self.data.get(DOC_ID)
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.data.iter()
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.data.keys()
    }

    pub fn values(&self) -> Values<'_, String, Value> {
        self.data.values()
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let estimated_size = self.data.len() * 30 + indent * 2;
        let mut json_string = String::with_capacity(estimated_size);

        json_string.push_str("{\n");
        let indent_str = " ".repeat(indent + 2);
        for (key, value) in self.data.iter() {
            json_string.push_str(&format!(
                "{}\"{}\": {},\n",
                indent_str,
                key,
                value.to_pretty_json(indent + 2)
            ));
        }

        json_string.pop();
        json_string.pop();
        json_string.push_str(&format!("\n{}}}", " ".repeat(indent)));
        json_string
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // field order is part of document identity
        self.data.len() == other.data.len() && self.data.iter().eq(other.data.iter())
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut document = Document::new();
        document.extend(iter);
        document
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

/// Strips the quotes `stringify!` leaves around literal keys.
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use docwire::doc;
///
/// // Empty document
/// let empty = doc!{};
///
/// // Simple key-value pairs
/// let simple = doc!{
///     name: "Alice",
///     age: 30
/// };
///
/// // Quoted keys for names that are not identifiers
/// let reference = doc!{ "$ref": "authors", "$id": 7 };
///
/// // Nested documents and arrays
/// let nested = doc!{
///     user: {
///         tags: ["a", "b"],
///     }
/// };
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::document::Document::new()
    };

    () => {
        $crate::document::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::document::Document::new();
            $(
                doc.put($crate::document::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
/// Handles nested documents, arrays, and expressions.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn set_up() -> Document {
        doc! {
            score: 1034,
            location: {
                state: "NY",
                city: "New York",
                address: {
                    line1: "40",
                    house: ["1", "2", "3"],
                    zip: 10001,
                },
            },
            category: ["food", "produce", "grocery"],
        }
    }

    #[test]
    fn test_new_is_empty() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.size(), 0);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let doc = set_up();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["score", "location", "category"]);
    }

    #[test]
    fn test_put_existing_key_keeps_position() {
        let mut doc = doc! { a: 1, b: 2, c: 3 };
        let previous = doc.put("b", "two");
        assert_eq!(previous, Some(Value::Int32(2)));
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(doc.get_str("b"), Some("two"));
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut doc = doc! { a: 1, b: 2, c: 3 };
        assert_eq!(doc.remove("a"), Some(Value::Int32(1)));
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert!(doc.remove("missing").is_none());
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = doc! { x: 1, y: 2 };
        let b = doc! { y: 2, x: 1 };
        let c = doc! { x: 1, y: 2 };
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_empty_key_is_allowed() {
        let mut doc = Document::new();
        doc.put("", 1);
        assert!(doc.contains_key(""));
        assert_eq!(doc.get_i32(""), Some(1));
    }

    #[test]
    fn test_typed_getters() {
        let doc = set_up();
        assert_eq!(doc.get_i32("score"), Some(1034));
        assert_eq!(doc.get_i64("score"), None);
        let location = doc.get_document("location").unwrap();
        assert_eq!(location.get_str("city"), Some("New York"));
        assert_eq!(doc.get_array("category").map(Vec::len), Some(3));
    }

    #[test]
    fn test_id() {
        let mut doc = doc! { a: 1 };
        assert!(!doc.has_id());
        assert!(doc.id().is_none());
        doc.put("_id", 5);
        assert!(doc.has_id());
        assert_eq!(doc.id(), Some(&Value::Int32(5)));
    }

    #[test]
    fn test_get_mut() {
        let mut doc = doc! { a: [1] };
        doc.get_mut("a").and_then(Value::as_array_mut).unwrap().push(Value::Int32(2));
        assert_eq!(doc.get_array("a").unwrap().len(), 2);
    }

    #[test]
    fn test_from_iterator_and_extend() {
        let mut doc: Document = vec![("a", 1), ("b", 2)].into_iter().collect();
        doc.extend(vec![("c", "x")]);
        let keys: Vec<String> = doc.clone().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!((&doc).into_iter().count(), 3);
    }

    #[test]
    fn test_quoted_keys_in_macro() {
        let doc = doc! { "$ref": "authors", "first name": "x" };
        assert!(doc.contains_key("$ref"));
        assert!(doc.contains_key("first name"));
    }

    #[test]
    fn test_to_pretty_json() {
        assert_eq!(Document::new().to_string(), "{}");
        let doc = doc! { a: 1, b: { c: "x" } };
        assert_eq!(
            doc.to_string(),
            "{\n  \"a\": 1,\n  \"b\": {\n    \"c\": \"x\"\n  }\n}"
        );
    }

    #[test]
    fn test_debug_lists_fields_in_order() {
        let doc = doc! { b: 1, a: 2 };
        assert_eq!(format!("{:?}", doc), "{\"b\": Int32(1), \"a\": Int32(2)}");
    }
}
