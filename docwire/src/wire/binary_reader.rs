use bson::{Bson, RawBsonRef, RawDocument};
use smallvec::SmallVec;

use crate::common::{Binary, Decimal128, Regex, Timestamp};
use crate::document::ObjectId;
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::{BinarySubtype, BsonReader, BsonType};

// length prefix + terminator
const MIN_DOCUMENT_LENGTH: usize = 5;

enum Frame<'a> {
    Document(std::vec::IntoIter<(&'a str, RawBsonRef<'a>)>),
    Array {
        elements: std::vec::IntoIter<RawBsonRef<'a>>,
        index: usize,
    },
    /// Completed by the end of its scope document.
    CodeWithScope,
}

impl Frame<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Frame::Document(_) => "Document",
            Frame::Array { .. } => "Array",
            Frame::CodeWithScope => "CodeWithScope",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Expecting a root document.
    Initial,
    /// Expecting the next element header.
    Type,
    /// Positioned on an element, expecting its value to be read.
    Value,
    /// Code read, expecting the scope document.
    ScopeDocument,
    /// Every element read, expecting the container to be closed.
    EndOfContainer,
}

/// [BsonReader] over a byte slice in the binary document layout.
///
/// Each root document is bounds checked against the slice and every
/// container is validated as a whole when it is entered, so a truncated or
/// inconsistent buffer fails with [ErrorKind::MalformedInput] before any of
/// its elements are handed out.
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    position: usize,
    frames: SmallVec<[Frame<'a>; 8]>,
    state: State,
    current_type: Option<BsonType>,
    current_name: Option<String>,
    current_value: Option<RawBsonRef<'a>>,
    pending_scope: Option<&'a RawDocument>,
}

macro_rules! read_as {
    ($self:ident, $bson_type:ident, $pattern:pat => $value:expr) => {
        match $self.take_value(BsonType::$bson_type)? {
            $pattern => Ok($value),
            other => Err(unexpected_value(BsonType::$bson_type, &other)),
        }
    };
}

impl<'a> BinaryReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BinaryReader {
            bytes,
            position: 0,
            frames: SmallVec::new(),
            state: State::Initial,
            current_type: None,
            current_name: None,
            current_value: None,
            pending_scope: None,
        }
    }

    /// Offset just past the last root document entered.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` when every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.position == self.bytes.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

    fn next_root(&mut self) -> DocwireResult<&'a RawDocument> {
        let start = self.position;
        let prefix = self
            .bytes
            .get(start..start + 4)
            .ok_or_else(|| malformed(&format!("Unexpected end of input at offset {}", start)))?;
        let mut length = [0u8; 4];
        length.copy_from_slice(prefix);
        let length = i32::from_le_bytes(length);

        let end = usize::try_from(length)
            .ok()
            .filter(|length| *length >= MIN_DOCUMENT_LENGTH)
            .map(|length| start + length)
            .ok_or_else(|| {
                malformed(&format!("Invalid document length {} at offset {}", length, start))
            })?;
        if end > self.bytes.len() {
            return Err(malformed(&format!(
                "Document at offset {} with length {} overruns the input of {} bytes",
                start,
                length,
                self.bytes.len()
            )));
        }

        let document = RawDocument::from_bytes(&self.bytes[start..end]).map_err(|err| {
            malformed(&format!("Invalid document at offset {}: {}", start, err))
        })?;
        self.position = end;
        Ok(document)
    }

    fn enter_document(&mut self, document: &'a RawDocument) -> DocwireResult<()> {
        let elements = document
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| malformed(&format!("Invalid document: {}", err)))?;
        self.frames.push(Frame::Document(elements.into_iter()));
        self.state = State::Type;
        Ok(())
    }

    fn exit(&mut self, expected: &str) -> DocwireResult<()> {
        match self.frames.last() {
            Some(frame) if frame.describe() == expected && self.state == State::EndOfContainer => {}
            _ => {
                return Err(invalid_operation(&format!(
                    "Cannot end {}, reader is in state {:?}",
                    expected, self.state
                )))
            }
        }
        self.frames.pop();

        // the scope document completes its code-with-scope value
        if matches!(self.frames.last(), Some(Frame::CodeWithScope)) {
            self.frames.pop();
        }

        self.state = if self.frames.is_empty() {
            State::Initial
        } else {
            State::Type
        };
        self.current_type = None;
        self.current_name = None;
        self.current_value = None;
        Ok(())
    }

    fn check_value(&self, expected: BsonType) -> DocwireResult<RawBsonRef<'a>> {
        match self.current_value {
            Some(value) if self.state == State::Value && self.current_type == Some(expected) => {
                Ok(value)
            }
            _ => Err(invalid_operation(&format!(
                "Cannot read {}, reader is positioned on {:?}",
                expected, self.current_type
            ))),
        }
    }

    fn take_value(&mut self, expected: BsonType) -> DocwireResult<RawBsonRef<'a>> {
        let value = self.check_value(expected)?;
        self.current_value = None;
        self.state = State::Type;
        Ok(value)
    }

    fn peek_binary(&self) -> DocwireResult<(BinarySubtype, usize)> {
        match self.check_value(BsonType::Binary)? {
            RawBsonRef::Binary(binary) => Ok((binary.subtype, binary.bytes.len())),
            other => Err(unexpected_value(BsonType::Binary, &other)),
        }
    }
}

impl<'a> BsonReader for BinaryReader<'a> {
    fn read_start_document(&mut self) -> DocwireResult<()> {
        let document = match self.state {
            State::Initial => self.next_root()?,
            State::ScopeDocument => self
                .pending_scope
                .take()
                .ok_or_else(|| invalid_operation("No scope document is pending"))?,
            _ => read_as!(self, Document, RawBsonRef::Document(document) => document)?,
        };
        self.enter_document(document)
    }

    fn read_end_document(&mut self) -> DocwireResult<()> {
        self.exit("Document")
    }

    fn read_start_array(&mut self) -> DocwireResult<()> {
        let array = read_as!(self, Array, RawBsonRef::Array(array) => array)?;
        let elements = array
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| malformed(&format!("Invalid array: {}", err)))?;
        self.frames.push(Frame::Array {
            elements: elements.into_iter(),
            index: 0,
        });
        self.state = State::Type;
        Ok(())
    }

    fn read_end_array(&mut self) -> DocwireResult<()> {
        self.exit("Array")
    }

    fn read_bson_type(&mut self) -> DocwireResult<BsonType> {
        match self.state {
            State::Type => {}
            State::EndOfContainer => return Ok(BsonType::EndOfDocument),
            _ => {
                return Err(invalid_operation(&format!(
                    "Cannot read an element header in state {:?}",
                    self.state
                )))
            }
        }

        let next = match self.frames.last_mut() {
            Some(Frame::Document(elements)) => elements
                .next()
                .map(|(name, value)| (name.to_string(), value)),
            Some(Frame::Array { elements, index }) => elements.next().map(|value| {
                let name = index.to_string();
                *index += 1;
                (name, value)
            }),
            _ => return Err(invalid_operation("No container is open")),
        };

        match next {
            Some((name, value)) => {
                let bson_type = BsonType::from(value.element_type());
                self.current_type = Some(bson_type);
                self.current_name = Some(name);
                self.current_value = Some(value);
                self.state = State::Value;
                Ok(bson_type)
            }
            None => {
                self.current_type = Some(BsonType::EndOfDocument);
                self.current_name = None;
                self.current_value = None;
                self.state = State::EndOfContainer;
                Ok(BsonType::EndOfDocument)
            }
        }
    }

    fn current_type(&self) -> Option<BsonType> {
        self.current_type
    }

    fn read_name(&mut self) -> DocwireResult<String> {
        match (&self.current_name, self.state) {
            (Some(name), State::Value) => Ok(name.clone()),
            _ => Err(invalid_operation("Reader is not positioned on a named element")),
        }
    }

    fn read_null(&mut self) -> DocwireResult<()> {
        read_as!(self, Null, RawBsonRef::Null => ())
    }

    fn read_undefined(&mut self) -> DocwireResult<()> {
        read_as!(self, Undefined, RawBsonRef::Undefined => ())
    }

    fn read_boolean(&mut self) -> DocwireResult<bool> {
        read_as!(self, Boolean, RawBsonRef::Boolean(value) => value)
    }

    fn read_int32(&mut self) -> DocwireResult<i32> {
        read_as!(self, Int32, RawBsonRef::Int32(value) => value)
    }

    fn read_int64(&mut self) -> DocwireResult<i64> {
        read_as!(self, Int64, RawBsonRef::Int64(value) => value)
    }

    fn read_double(&mut self) -> DocwireResult<f64> {
        read_as!(self, Double, RawBsonRef::Double(value) => value)
    }

    fn read_decimal128(&mut self) -> DocwireResult<Decimal128> {
        read_as!(self, Decimal128, RawBsonRef::Decimal128(value) => value)
    }

    fn read_string(&mut self) -> DocwireResult<String> {
        read_as!(self, String, RawBsonRef::String(value) => value.to_string())
    }

    fn read_symbol(&mut self) -> DocwireResult<String> {
        read_as!(self, Symbol, RawBsonRef::Symbol(value) => value.to_string())
    }

    fn read_object_id(&mut self) -> DocwireResult<ObjectId> {
        read_as!(self, ObjectId, RawBsonRef::ObjectId(value) => value)
    }

    fn read_date_time(&mut self) -> DocwireResult<i64> {
        read_as!(self, DateTime, RawBsonRef::DateTime(value) => value.timestamp_millis())
    }

    fn read_regular_expression(&mut self) -> DocwireResult<Regex> {
        read_as!(self, RegularExpression, RawBsonRef::RegularExpression(regex) => {
            Regex::new(regex.pattern, regex.options)
        })
    }

    fn read_javascript(&mut self) -> DocwireResult<String> {
        read_as!(self, JavaScript, RawBsonRef::JavaScriptCode(code) => code.to_string())
    }

    fn read_javascript_with_scope(&mut self) -> DocwireResult<String> {
        let value = read_as!(
            self,
            JavaScriptWithScope,
            RawBsonRef::JavaScriptCodeWithScope(value) => value
        )?;
        self.frames.push(Frame::CodeWithScope);
        self.pending_scope = Some(value.scope);
        self.state = State::ScopeDocument;
        Ok(value.code.to_string())
    }

    fn read_binary_data(&mut self) -> DocwireResult<Binary> {
        read_as!(self, Binary, RawBsonRef::Binary(binary) => Binary {
            subtype: binary.subtype,
            bytes: binary.bytes.to_vec(),
        })
    }

    fn read_timestamp(&mut self) -> DocwireResult<Timestamp> {
        read_as!(self, Timestamp, RawBsonRef::Timestamp(value) => value)
    }

    fn read_min_key(&mut self) -> DocwireResult<()> {
        read_as!(self, MinKey, RawBsonRef::MinKey => ())
    }

    fn read_max_key(&mut self) -> DocwireResult<()> {
        read_as!(self, MaxKey, RawBsonRef::MaxKey => ())
    }

    fn read_db_pointer(&mut self) -> DocwireResult<(String, ObjectId)> {
        let value = self.take_value(BsonType::DbPointer)?;
        // the pointer's parts are only exposed through its extended JSON form
        let json = Bson::try_from(value.to_raw_bson())
            .map_err(|err| malformed(&format!("Invalid database pointer: {}", err)))?
            .into_relaxed_extjson();
        let pointer = &json["$dbPointer"];
        let namespace = pointer["$ref"].as_str();
        let id = pointer["$id"]["$oid"]
            .as_str()
            .and_then(|hex| ObjectId::parse_str(hex).ok());
        match (namespace, id) {
            (Some(namespace), Some(id)) => Ok((namespace.to_string(), id)),
            _ => Err(malformed(&format!("Invalid database pointer: {}", json))),
        }
    }

    fn peek_binary_subtype(&self) -> DocwireResult<BinarySubtype> {
        self.peek_binary().map(|(subtype, _)| subtype)
    }

    fn peek_binary_size(&self) -> DocwireResult<usize> {
        self.peek_binary().map(|(_, size)| size)
    }
}

fn malformed(message: &str) -> DocwireError {
    log::error!("{}", message);
    DocwireError::new(message, ErrorKind::MalformedInput)
}

fn invalid_operation(message: &str) -> DocwireError {
    log::error!("{}", message);
    DocwireError::new(message, ErrorKind::InvalidOperation)
}

fn unexpected_value(expected: BsonType, value: &RawBsonRef<'_>) -> DocwireError {
    invalid_operation(&format!(
        "Expected a {} value, found {}",
        expected,
        BsonType::from(value.element_type())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{BinaryWriter, BsonWriter};

    const HELLO_WORLD: &[u8] = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";

    // reads the first element of a single-document input as a string
    fn read_first_string(bytes: &[u8]) -> DocwireResult<String> {
        let mut reader = BinaryReader::new(bytes);
        reader.read_start_document()?;
        reader.read_bson_type()?;
        reader.read_string()
    }

    fn read_first_boolean(bytes: &[u8]) -> DocwireResult<bool> {
        let mut reader = BinaryReader::new(bytes);
        reader.read_start_document()?;
        reader.read_bson_type()?;
        reader.read_boolean()
    }

    fn enter_first_document(bytes: &[u8]) -> DocwireResult<()> {
        let mut reader = BinaryReader::new(bytes);
        reader.read_start_document()?;
        reader.read_bson_type()?;
        reader.read_start_document()
    }

    #[test]
    fn test_hello_world() {
        let mut reader = BinaryReader::new(HELLO_WORLD);
        reader.read_start_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::String);
        assert_eq!(reader.read_name().unwrap(), "hello");
        assert_eq!(reader.read_string().unwrap(), "world");
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_document().unwrap();
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_truncated_input_is_malformed() {
        let mut reader = BinaryReader::new(&HELLO_WORLD[..10]);
        let err = reader.read_start_document().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_length_below_minimum_is_malformed() {
        let mut reader = BinaryReader::new(&[4, 0, 0, 0]);
        let err = reader.read_start_document().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_unknown_tag_is_malformed() {
        let bytes = [8, 0, 0, 0, 0x42, b'a', 0, 0];
        let err = read_first_string(&bytes).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_missing_terminator_is_malformed() {
        // declared length covers the element but no terminator follows
        let bytes = [8, 0, 0, 0, 0x0A, b'a', 0, 0x0A];
        let mut reader = BinaryReader::new(&bytes);
        let err = reader.read_start_document().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let bytes = [14, 0, 0, 0, 0x02, b'a', 0, 2, 0, 0, 0, 0xFF, 0, 0];
        let err = read_first_string(&bytes).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_typed_read_mismatch_is_invalid_operation() {
        let mut reader = BinaryReader::new(HELLO_WORLD);
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        let err = reader.read_int32().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        // the element is still there to be read correctly
        assert_eq!(reader.read_string().unwrap(), "world");
    }

    #[test]
    fn test_nested_length_overrun_is_malformed() {
        // embedded document claims 0x20 bytes inside a 12 byte parent
        let bytes = [12, 0, 0, 0, 0x03, b'a', 0, 0x20, 0, 0, 0, 0];
        let err = enter_first_document(&bytes).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_invalid_boolean_is_malformed() {
        let bytes = [9, 0, 0, 0, 0x08, b'a', 0, 2, 0];
        let err = read_first_boolean(&bytes).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_consecutive_root_documents() {
        let mut bytes = HELLO_WORLD.to_vec();
        bytes.extend_from_slice(&[5, 0, 0, 0, 0]);
        let mut reader = BinaryReader::new(&bytes);
        reader.read_start_document().unwrap();
        assert_eq!(reader.remaining(), &[5, 0, 0, 0, 0]);
        assert!(reader.read_end_document().is_err());
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::String);
        reader.read_string().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_document().unwrap();

        reader.read_start_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_document().unwrap();
        assert!(reader.is_at_end());
    }

    fn single_binary(subtype: BinarySubtype, bytes: &[u8]) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("b").unwrap();
        writer.write_binary_data(subtype, bytes).unwrap();
        writer.write_end_document().unwrap();
        writer.into_bytes().unwrap()
    }

    #[test]
    fn test_peek_binary_does_not_consume() {
        let bytes = single_binary(BinarySubtype::Uuid, &[7; 16]);
        let mut reader = BinaryReader::new(&bytes);
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        assert_eq!(reader.peek_binary_subtype().unwrap(), BinarySubtype::Uuid);
        assert_eq!(reader.peek_binary_size().unwrap(), 16);
        assert_eq!(reader.peek_binary_subtype().unwrap(), BinarySubtype::Uuid);
        let binary = reader.read_binary_data().unwrap();
        assert_eq!(binary.bytes, vec![7; 16]);
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
    }

    #[test]
    fn test_old_binary_strips_inner_length() {
        let bytes = single_binary(BinarySubtype::BinaryOld, &[1, 2, 3]);
        let mut reader = BinaryReader::new(&bytes);
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        assert_eq!(reader.peek_binary_size().unwrap(), 3);
        let binary = reader.read_binary_data().unwrap();
        assert_eq!(binary.subtype, BinarySubtype::BinaryOld);
        assert_eq!(binary.bytes, vec![1, 2, 3]);
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
    }

    #[test]
    fn test_peek_outside_binary_is_invalid_operation() {
        let mut reader = BinaryReader::new(HELLO_WORLD);
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        let err = reader.peek_binary_subtype().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_code_with_scope() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("f").unwrap();
        writer.write_javascript_with_scope("return x;").unwrap();
        writer.write_start_document().unwrap();
        writer.write_name("x").unwrap();
        writer.write_int32(1).unwrap();
        writer.write_end_document().unwrap();
        writer.write_end_document().unwrap();
        let bytes = writer.into_bytes().unwrap();

        let mut reader = BinaryReader::new(&bytes);
        reader.read_start_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::JavaScriptWithScope);
        assert_eq!(reader.read_javascript_with_scope().unwrap(), "return x;");
        reader.read_start_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::Int32);
        assert_eq!(reader.read_int32().unwrap(), 1);
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_document().unwrap();
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_db_pointer_and_array() {
        // {p: DBPointer("db.things", 0101..), a: [9L]}
        let mut bytes = vec![0, 0, 0, 0, 0x0C, b'p', 0];
        bytes.extend_from_slice(&10i32.to_le_bytes());
        bytes.extend_from_slice(b"db.things\0");
        bytes.extend_from_slice(&[1; 12]);
        bytes.extend_from_slice(&[0x04, b'a', 0, 16, 0, 0, 0, 0x12, b'0', 0]);
        bytes.extend_from_slice(&9i64.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);
        let length = bytes.len() as i32;
        bytes[..4].copy_from_slice(&length.to_le_bytes());

        let mut reader = BinaryReader::new(&bytes);
        reader.read_start_document().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::DbPointer);
        assert_eq!(
            reader.read_db_pointer().unwrap(),
            ("db.things".to_string(), ObjectId::from_bytes([1; 12]))
        );
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::Array);
        reader.read_start_array().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::Int64);
        assert_eq!(reader.read_name().unwrap(), "0");
        assert_eq!(reader.read_int64().unwrap(), 9);
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_array().unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_document().unwrap();
        assert!(reader.is_at_end());
    }
}
