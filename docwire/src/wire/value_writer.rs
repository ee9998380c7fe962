use crate::common::{Binary, CodeWithScope, DateTime, Decimal128, Regex, Timestamp, Value};
use crate::document::{Document, ObjectId};
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::{BinarySubtype, BsonWriter, WriterMark};

enum Node {
    Document {
        document: Document,
        pending_name: Option<String>,
    },
    Array(Vec<Value>),
    CodeWithScope(String),
}

/// [BsonWriter] that builds a [Value] tree instead of bytes.
///
/// The tree holds the wire-native form of what was written, before reference
/// folding and binary-subtype dispatch: binary payloads stay [Value::Binary]
/// whatever their subtype and references stay plain `$ref`/`$id` documents.
/// The deprecated undefined marker becomes [Value::Null]. Unlike
/// [crate::wire::BinaryWriter] it accepts a single unnamed value at the root.
///
/// # Examples
///
/// ```rust,ignore
/// let mut writer = ValueWriter::new();
/// codec.encode_value(&mut writer, &Value::from(uuid), &EncoderContext::default())?;
/// let wire_form = writer.into_value()?;   // Value::Binary with subtype 0x04
/// ```
#[derive(Default)]
pub struct ValueWriter {
    stack: Vec<Node>,
    result: Option<Value>,
}

impl ValueWriter {
    pub fn new() -> Self {
        ValueWriter::default()
    }

    /// Returns the value written. Fails if nothing was written or a container
    /// is still open.
    pub fn into_value(self) -> DocwireResult<Value> {
        if !self.stack.is_empty() {
            return Err(invalid_operation(&format!(
                "Cannot take the value of a writer with {} open container(s)",
                self.stack.len()
            )));
        }
        self.result
            .ok_or_else(|| invalid_operation("No value has been written"))
    }

    fn emit(&mut self, value: Value) -> DocwireResult<()> {
        match self.stack.last_mut() {
            None => {
                if self.result.is_some() {
                    return Err(invalid_operation("A value has already been written"));
                }
                self.result = Some(value);
            }
            Some(Node::Document {
                document,
                pending_name,
            }) => match pending_name.take() {
                Some(name) => {
                    document.put(name, value);
                }
                None => {
                    return Err(invalid_operation(&format!(
                        "A {} value inside a document needs a name",
                        value.value_type()
                    )))
                }
            },
            Some(Node::Array(values)) => values.push(value),
            Some(Node::CodeWithScope(_)) => {
                return Err(invalid_operation(
                    "Expected the scope document of a code-with-scope value",
                ))
            }
        }
        Ok(())
    }

    /// Checks that a value may be emitted here before a container is opened.
    fn check_slot(&self) -> DocwireResult<()> {
        match self.stack.last() {
            None if self.result.is_some() => {
                Err(invalid_operation("A value has already been written"))
            }
            Some(Node::Document {
                pending_name: None, ..
            }) => Err(invalid_operation("A value inside a document needs a name")),
            _ => Ok(()),
        }
    }
}

impl BsonWriter for ValueWriter {
    fn write_start_document(&mut self) -> DocwireResult<()> {
        if !matches!(self.stack.last(), Some(Node::CodeWithScope(_))) {
            self.check_slot()?;
        }
        self.stack.push(Node::Document {
            document: Document::new(),
            pending_name: None,
        });
        Ok(())
    }

    fn write_end_document(&mut self) -> DocwireResult<()> {
        let document = match self.stack.pop() {
            Some(Node::Document {
                document,
                pending_name: None,
            }) => document,
            Some(Node::Document {
                pending_name: Some(name),
                document,
            }) => {
                self.stack.push(Node::Document {
                    document,
                    pending_name: Some(name.clone()),
                });
                return Err(invalid_operation(&format!("Field {} has no value", name)));
            }
            Some(other) => {
                self.stack.push(other);
                return Err(invalid_operation("The innermost open container is not a document"));
            }
            None => return Err(invalid_operation("No container is open")),
        };

        // the scope document completes its code-with-scope value
        if matches!(self.stack.last(), Some(Node::CodeWithScope(_))) {
            if let Some(Node::CodeWithScope(code)) = self.stack.pop() {
                return self.emit(Value::JavaScriptWithScope(CodeWithScope::new(code, document)));
            }
        }
        self.emit(Value::Document(document))
    }

    fn write_start_array(&mut self) -> DocwireResult<()> {
        self.check_slot()?;
        self.stack.push(Node::Array(Vec::new()));
        Ok(())
    }

    fn write_end_array(&mut self) -> DocwireResult<()> {
        match self.stack.pop() {
            Some(Node::Array(values)) => self.emit(Value::Array(values)),
            Some(other) => {
                self.stack.push(other);
                Err(invalid_operation("The innermost open container is not an array"))
            }
            None => Err(invalid_operation("No container is open")),
        }
    }

    fn write_name(&mut self, name: &str) -> DocwireResult<()> {
        match self.stack.last_mut() {
            Some(Node::Document { pending_name, .. }) => {
                if let Some(pending) = pending_name {
                    return Err(invalid_operation(&format!("Field {} has no value", pending)));
                }
                *pending_name = Some(name.to_string());
                Ok(())
            }
            _ => Err(invalid_operation(&format!(
                "Field name {} can only be written inside a document",
                name
            ))),
        }
    }

    fn write_null(&mut self) -> DocwireResult<()> {
        self.emit(Value::Null)
    }

    fn write_undefined(&mut self) -> DocwireResult<()> {
        self.emit(Value::Null)
    }

    fn write_boolean(&mut self, value: bool) -> DocwireResult<()> {
        self.emit(Value::Boolean(value))
    }

    fn write_int32(&mut self, value: i32) -> DocwireResult<()> {
        self.emit(Value::Int32(value))
    }

    fn write_int64(&mut self, value: i64) -> DocwireResult<()> {
        self.emit(Value::Int64(value))
    }

    fn write_double(&mut self, value: f64) -> DocwireResult<()> {
        self.emit(Value::Double(value))
    }

    fn write_decimal128(&mut self, value: Decimal128) -> DocwireResult<()> {
        self.emit(Value::Decimal128(value))
    }

    fn write_string(&mut self, value: &str) -> DocwireResult<()> {
        self.emit(Value::String(value.to_string()))
    }

    fn write_symbol(&mut self, value: &str) -> DocwireResult<()> {
        self.emit(Value::Symbol(value.to_string()))
    }

    fn write_object_id(&mut self, value: ObjectId) -> DocwireResult<()> {
        self.emit(Value::ObjectId(value))
    }

    fn write_date_time(&mut self, millis: i64) -> DocwireResult<()> {
        self.emit(Value::DateTime(DateTime::from_millis(millis)))
    }

    fn write_regular_expression(&mut self, value: &Regex) -> DocwireResult<()> {
        self.emit(Value::Regex(value.clone()))
    }

    fn write_javascript(&mut self, code: &str) -> DocwireResult<()> {
        self.emit(Value::JavaScript(code.to_string()))
    }

    fn write_javascript_with_scope(&mut self, code: &str) -> DocwireResult<()> {
        self.check_slot()?;
        if matches!(self.stack.last(), Some(Node::CodeWithScope(_))) {
            return Err(invalid_operation(
                "Expected the scope document of a code-with-scope value",
            ));
        }
        self.stack.push(Node::CodeWithScope(code.to_string()));
        Ok(())
    }

    fn write_binary_data(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> DocwireResult<()> {
        self.emit(Value::Binary(Binary {
            subtype,
            bytes: bytes.to_vec(),
        }))
    }

    fn write_timestamp(&mut self, value: Timestamp) -> DocwireResult<()> {
        self.emit(Value::Timestamp(value))
    }

    fn write_min_key(&mut self) -> DocwireResult<()> {
        self.emit(Value::MinKey)
    }

    fn write_max_key(&mut self) -> DocwireResult<()> {
        self.emit(Value::MaxKey)
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn rollback(&mut self, mark: WriterMark) {
        self.stack.truncate(mark.depth());
        if let Some(Node::Document { pending_name, .. }) = self.stack.last_mut() {
            *pending_name = None;
        }
    }
}

fn invalid_operation(message: &str) -> DocwireError {
    log::error!("{}", message);
    DocwireError::new(message, ErrorKind::InvalidOperation)
}
