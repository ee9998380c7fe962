use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::codec::{DecoderContext, EncoderContext};
use crate::common::{Value, ValueType};
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::{BsonReader, BsonWriter};

/// Contract for a leaf codec: the reader and writer of one [ValueType].
///
/// # Purpose
/// The document codec handles the structural forms itself (documents,
/// arrays, references, code-with-scope, raw bytes, symbols and null) and
/// hands every other value to the leaf codec registered for its type.
/// Applications add support for their own types by implementing this trait
/// for a [`ValueType::Custom`] name.
///
/// # Contract
/// - `encode` is called with the writer positioned for a value (its name
///   already given) and must write exactly one value. It should check the
///   variant it was given before writing anything, so a wrong variant fails
///   without output.
/// - `decode` is called with the reader positioned on an element and must
///   consume exactly that element's value.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; a registry is shared across threads.
pub trait CodecProvider: Send + Sync {
    /// The value type this codec reads and writes.
    fn value_type(&self) -> ValueType;

    fn encode(
        &self,
        writer: &mut dyn BsonWriter,
        value: &Value,
        context: &EncoderContext,
    ) -> DocwireResult<()>;

    fn decode(&self, reader: &mut dyn BsonReader, context: &DecoderContext) -> DocwireResult<Value>;
}

/// Type-erased, cloneable handle to a [CodecProvider].
#[derive(Clone)]
pub struct Codec {
    inner: Arc<dyn CodecProvider>,
}

impl Codec {
    pub fn new<T: CodecProvider + 'static>(inner: T) -> Self {
        Codec {
            inner: Arc::new(inner),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.inner.value_type()
    }

    pub fn encode(
        &self,
        writer: &mut dyn BsonWriter,
        value: &Value,
        context: &EncoderContext,
    ) -> DocwireResult<()> {
        self.inner.encode(writer, value, context)
    }

    pub fn decode(&self, reader: &mut dyn BsonReader, context: &DecoderContext) -> DocwireResult<Value> {
        self.inner.decode(reader, context)
    }
}

impl Debug for Codec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Codec({})", self.inner.value_type())
    }
}

/// Error for a leaf codec handed a value of the wrong variant.
pub fn unexpected_value(expected: &ValueType, value: &Value) -> DocwireError {
    log::error!(
        "Codec for {} cannot encode a value of type {}",
        expected,
        value.value_type()
    );
    DocwireError::new(
        &format!(
            "Codec for {} cannot encode a value of type {}",
            expected,
            value.value_type()
        ),
        ErrorKind::InvalidDataType,
    )
}
