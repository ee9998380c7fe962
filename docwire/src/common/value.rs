use crate::common::{
    Binary, CodeWithScope, CustomValue, DateTime, DbRef, Decimal128, Regex, Timestamp, ValueType,
};
use crate::document::{Document, ObjectId};
use std::fmt::{Display, Formatter};

/// Represents a [Document] value. It can be a simple value like [Value::Int32],
/// [Value::String] or a container like [Value::Document] or [Value::Array].
///
/// # Variants
/// - Null, Boolean, Int32, Int64, Double, Decimal128, String: scalars
/// - Bytes: a raw byte sequence, written as generic binary
/// - Binary: a blob that keeps its binary subtype
/// - Uuid: a 16-byte UUID, written as UUID binary
/// - Document / Array: containers
/// - ObjectId, DateTime, Regex, Timestamp: opinionated leaf types
/// - Symbol, JavaScript, JavaScriptWithScope: legacy and code forms
/// - Reference: a cross-document pointer, written as `{$ref, $id[, $db]}`
/// - MinKey / MaxKey: sentinels that sort below and above everything
/// - Custom: an application type encoded by a registered leaf codec
///
/// # Usage
/// ```text
/// let v1: Value = 42.into();              // Int32
/// let v2 = Value::from("hello");          // String
/// let v3 = Value::from(vec![1i64, 2]);    // Array of Int64
/// let v4 = Value::from(vec![1u8, 2]);     // Bytes
/// let doc = doc! { "age": 42, "name": "Alice" };
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Decimal128(Decimal128),
    String(String),
    /// A raw byte sequence. It is written with the generic binary subtype.
    Bytes(Vec<u8>),
    Binary(Binary),
    Uuid(uuid::Uuid),
    Document(Document),
    Array(Vec<Value>),
    ObjectId(ObjectId),
    DateTime(DateTime),
    Regex(Regex),
    /// Legacy string alias. Decodes as [Value::String].
    Symbol(String),
    JavaScript(String),
    JavaScriptWithScope(CodeWithScope),
    Reference(DbRef),
    Timestamp(Timestamp),
    MinKey,
    MaxKey,
    Custom(CustomValue),
}

impl Value {
    /// Creates a new [Value] from anything that converts into one.
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Creates a new [Value] from the given [Option] value. [None] becomes
    /// [Value::Null].
    pub fn from_option<T: Into<Value>>(value: Option<T>) -> Value {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }

    /// Creates a new [Value::Array] from the vector of values.
    pub fn from_vec<T: Into<Value>>(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(|v| v.into()).collect())
    }

    /// Returns the type identity of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::Double(_) => ValueType::Double,
            Value::Decimal128(_) => ValueType::Decimal128,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Binary(_) => ValueType::Binary,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Document(_) => ValueType::Document,
            Value::Array(_) => ValueType::Array,
            Value::ObjectId(_) => ValueType::ObjectId,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Regex(_) => ValueType::Regex,
            Value::Symbol(_) => ValueType::Symbol,
            Value::JavaScript(_) => ValueType::JavaScript,
            Value::JavaScriptWithScope(_) => ValueType::JavaScriptWithScope,
            Value::Reference(_) => ValueType::Reference,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::MinKey => ValueType::MinKey,
            Value::MaxKey => ValueType::MaxKey,
            Value::Custom(custom) => ValueType::custom(custom.type_name()),
        }
    }

    /// Returns `true` if this value, and everything nested in it, already has
    /// the shape the wire format reads back.
    ///
    /// References, UUIDs, raw byte sequences and custom values are views that
    /// only exist in memory; on the wire they are documents or binaries.
    pub fn is_wire_native(&self) -> bool {
        match self {
            Value::Reference(_) | Value::Uuid(_) | Value::Bytes(_) | Value::Custom(_) => false,
            Value::Document(doc) => doc.values().all(Value::is_wire_native),
            Value::Array(values) => values.iter().all(Value::is_wire_native),
            Value::JavaScriptWithScope(code) => code.scope().values().all(Value::is_wire_native),
            _ => true,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Reference(_))
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text of a [Value::String] or a [Value::Symbol].
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) | Value::Symbol(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Value::ObjectId(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_reference(&self) -> Option<&DbRef> {
        match self {
            Value::Reference(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_uuid(&self) -> Option<&uuid::Uuid> {
        match self {
            Value::Uuid(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_date_time(&self) -> Option<DateTime> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self {
            Value::Custom(v) => Some(v),
            _ => None,
        }
    }

    /// Takes the value out, leaving [Value::Null] in its place.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => format!("{{\"$numberLong\": \"{}\"}}", v),
            Value::Double(v) => v.to_string(),
            Value::Decimal128(v) => format!("{{\"$numberDecimalBytes\": \"{}\"}}", to_hex(&v.bytes())),
            Value::String(v) => format!("\"{}\"", v),
            Value::Bytes(v) => binary_json(0, v),
            Value::Binary(v) => binary_json(u8::from(v.subtype), &v.bytes),
            Value::Uuid(v) => format!("{{\"$uuid\": \"{}\"}}", v.hyphenated()),
            Value::Document(v) => v.to_pretty_json(indent),
            Value::Array(v) => {
                if v.is_empty() {
                    return "[]".to_string();
                }

                let mut json_str = String::new();
                json_str.push_str("[\n");
                let indent_str = " ".repeat(indent + 2);
                for value in v {
                    json_str.push_str(&format!(
                        "{}{},\n",
                        indent_str,
                        value.to_pretty_json(indent + 2)
                    ));
                }
                json_str.pop(); // remove last comma
                json_str.pop(); // remove last newline
                json_str.push_str(&format!("\n{}]", " ".repeat(indent)));
                json_str
            }
            Value::ObjectId(v) => format!("{{\"$oid\": \"{}\"}}", v),
            Value::DateTime(v) => format!("{{\"$date\": \"{}\"}}", v),
            Value::Regex(v) => format!(
                "{{\"$regularExpression\": {{\"pattern\": \"{}\", \"options\": \"{}\"}}}}",
                v.pattern(),
                v.options()
            ),
            Value::Symbol(v) => format!("{{\"$symbol\": \"{}\"}}", v),
            Value::JavaScript(v) => format!("{{\"$code\": \"{}\"}}", v),
            Value::JavaScriptWithScope(v) => v.to_string(),
            Value::Reference(v) => v.to_document().to_pretty_json(indent),
            Value::Timestamp(v) => format!(
                "{{\"$timestamp\": {{\"t\": {}, \"i\": {}}}}}",
                v.time, v.increment
            ),
            Value::MinKey => "{\"$minKey\": 1}".to_string(),
            Value::MaxKey => "{\"$maxKey\": 1}".to_string(),
            Value::Custom(v) => format!("\"{:?}\"", v),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

fn binary_json(subtype: u8, bytes: &[u8]) -> String {
    format!(
        "{{\"$binary\": {{\"hex\": \"{}\", \"subType\": \"{:02x}\"}}}}",
        to_hex(bytes),
        subtype
    )
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Int32(value as i32)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Int32(value as i32)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int32(value as i32)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int32(value as i32)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int64(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Double(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        Value::from_option(value)
    }
}

/// Element types a `Vec` converts into a [Value::Array] from.
///
/// `u8` is not an element type: a `Vec<u8>` is a byte sequence and becomes
/// [Value::Bytes].
pub trait ArrayElement: Into<Value> {}

macro_rules! array_elements {
    ($($element:ty),* $(,)?) => {
        $(impl ArrayElement for $element {})*
    };
}

array_elements!(
    bool,
    i8,
    i16,
    u16,
    i32,
    u32,
    i64,
    f32,
    f64,
    String,
    Value,
    Document,
    ObjectId,
    uuid::Uuid,
    Binary,
    DateTime,
    chrono::DateTime<chrono::Utc>,
    Regex,
    Timestamp,
    Decimal128,
    CodeWithScope,
    DbRef,
    CustomValue,
);

impl ArrayElement for &str {}

impl<T: Into<Value>> ArrayElement for Option<T> {}

impl<T> ArrayElement for Vec<T> where Vec<T>: Into<Value> {}

impl<T: ArrayElement> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::from_vec(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: ArrayElement> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::ObjectId(value)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(value: uuid::Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<Binary> for Value {
    fn from(value: Binary) -> Self {
        Value::Binary(value)
    }
}

impl From<DateTime> for Value {
    fn from(value: DateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Value::DateTime(DateTime::from(value))
    }
}

impl From<Regex> for Value {
    fn from(value: Regex) -> Self {
        Value::Regex(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Decimal128> for Value {
    fn from(value: Decimal128) -> Self {
        Value::Decimal128(value)
    }
}

impl From<CodeWithScope> for Value {
    fn from(value: CodeWithScope) -> Self {
        Value::JavaScriptWithScope(value)
    }
}

impl From<DbRef> for Value {
    fn from(value: DbRef) -> Self {
        Value::Reference(value)
    }
}

impl From<CustomValue> for Value {
    fn from(value: CustomValue) -> Self {
        Value::Custom(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
