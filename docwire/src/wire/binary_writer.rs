use bson::{RawArrayBuf, RawBson, RawDocumentBuf, RawJavaScriptCodeWithScope};
use smallvec::SmallVec;

use crate::common::{Binary, Decimal128, Regex, Timestamp};
use crate::document::ObjectId;
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::{BinarySubtype, BsonType, BsonWriter, WriterMark};

// `key` is the field name the finished container is appended under, `None`
// inside an array, at the root or for a scope document.
#[derive(Debug)]
enum Frame {
    Document {
        document: RawDocumentBuf,
        pending_name: Option<String>,
        key: Option<String>,
    },
    Array {
        array: RawArrayBuf,
        key: Option<String>,
    },
    CodeWithScope {
        code: String,
        key: Option<String>,
    },
}

impl Frame {
    fn describe(&self) -> &'static str {
        match self {
            Frame::Document { .. } => "Document",
            Frame::Array { .. } => "Array",
            Frame::CodeWithScope { .. } => "CodeWithScope",
        }
    }
}

/// [BsonWriter] producing the binary document layout.
///
/// Every open container is built as its own raw buffer and appended to its
/// parent when it closes, so a value that fails half way leaves no trace in
/// the parent. Closed root documents are collected in order; several may be
/// written one after the other.
///
/// # Examples
///
/// ```rust,ignore
/// let mut writer = BinaryWriter::new();
/// writer.write_start_document()?;
/// writer.write_name("hello")?;
/// writer.write_string("world")?;
/// writer.write_end_document()?;
/// let bytes = writer.into_bytes()?;
/// ```
#[derive(Debug, Default)]
pub struct BinaryWriter {
    output: Vec<u8>,
    frames: SmallVec<[Frame; 8]>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        BinaryWriter::default()
    }

    /// The root documents closed so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Returns `true` once at least one root document has been closed and no
    /// container is open.
    pub fn is_complete(&self) -> bool {
        self.frames.is_empty() && !self.output.is_empty()
    }

    /// Returns the written bytes. Fails if a container is still open.
    pub fn into_bytes(self) -> DocwireResult<Vec<u8>> {
        if !self.frames.is_empty() {
            return Err(invalid_operation(&format!(
                "Cannot take the output of a writer with {} open container(s)",
                self.frames.len()
            )));
        }
        Ok(self.output)
    }

    /// Checks that a value of the given type may go here and hands back the
    /// name it is to be stored under.
    fn claim_slot(&mut self, bson_type: BsonType) -> DocwireResult<Option<String>> {
        match self.frames.last_mut() {
            Some(Frame::Document { pending_name, .. }) => match pending_name.take() {
                Some(name) => Ok(Some(name)),
                None => Err(invalid_operation(&format!(
                    "A {} value inside a document needs a name",
                    bson_type
                ))),
            },
            Some(Frame::Array { .. }) => Ok(None),
            Some(Frame::CodeWithScope { .. }) => Err(invalid_operation(&format!(
                "Expected the scope document of a code-with-scope value, got {}",
                bson_type
            ))),
            None => Err(invalid_operation(&format!(
                "Cannot write a {} value outside of a document",
                bson_type
            ))),
        }
    }

    fn write_value(&mut self, bson_type: BsonType, value: RawBson) -> DocwireResult<()> {
        let key = self.claim_slot(bson_type)?;
        self.append(key, value)
    }

    fn append(&mut self, key: Option<String>, value: RawBson) -> DocwireResult<()> {
        match (self.frames.last_mut(), key) {
            (Some(Frame::Document { document, .. }), Some(key)) => {
                document.append(key, value);
                Ok(())
            }
            (Some(Frame::Array { array, .. }), None) => {
                array.push(value);
                Ok(())
            }
            (Some(frame), _) => Err(invalid_operation(&format!(
                "Cannot place a finished value into the open {}",
                frame.describe()
            ))),
            (None, _) => match value {
                RawBson::Document(document) => {
                    self.output.extend_from_slice(document.as_bytes());
                    Ok(())
                }
                _ => Err(invalid_operation("Only documents can be written at the root")),
            },
        }
    }

    fn check_closing(&self, expected: &str) -> DocwireResult<()> {
        match self.frames.last() {
            Some(Frame::Document {
                pending_name: Some(name),
                ..
            }) => Err(invalid_operation(&format!("Field {} has no value", name))),
            Some(frame) if frame.describe() == expected => Ok(()),
            Some(frame) => Err(invalid_operation(&format!(
                "Cannot end {}, the innermost open container is {}",
                expected,
                frame.describe()
            ))),
            None => Err(invalid_operation(&format!(
                "Cannot end {}, no container is open",
                expected
            ))),
        }
    }
}

impl BsonWriter for BinaryWriter {
    fn write_start_document(&mut self) -> DocwireResult<()> {
        let key = match self.frames.last() {
            None | Some(Frame::CodeWithScope { .. }) => None,
            Some(_) => self.claim_slot(BsonType::Document)?,
        };
        self.frames.push(Frame::Document {
            document: RawDocumentBuf::new(),
            pending_name: None,
            key,
        });
        Ok(())
    }

    fn write_end_document(&mut self) -> DocwireResult<()> {
        self.check_closing("Document")?;
        let (document, key) = match self.frames.pop() {
            Some(Frame::Document { document, key, .. }) => (document, key),
            _ => return Err(invalid_operation("Cannot end Document, no document is open")),
        };

        // the scope document completes its code-with-scope value
        if matches!(self.frames.last(), Some(Frame::CodeWithScope { .. })) {
            if let Some(Frame::CodeWithScope { code, key }) = self.frames.pop() {
                let value = RawJavaScriptCodeWithScope {
                    code,
                    scope: document,
                };
                return self.append(key, RawBson::JavaScriptCodeWithScope(value));
            }
        }
        self.append(key, RawBson::Document(document))
    }

    fn write_start_array(&mut self) -> DocwireResult<()> {
        let key = self.claim_slot(BsonType::Array)?;
        self.frames.push(Frame::Array {
            array: RawArrayBuf::new(),
            key,
        });
        Ok(())
    }

    fn write_end_array(&mut self) -> DocwireResult<()> {
        self.check_closing("Array")?;
        match self.frames.pop() {
            Some(Frame::Array { array, key }) => self.append(key, RawBson::Array(array)),
            _ => Err(invalid_operation("Cannot end Array, no array is open")),
        }
    }

    fn write_name(&mut self, name: &str) -> DocwireResult<()> {
        check_cstring(name, "field name")?;
        match self.frames.last_mut() {
            Some(Frame::Document { pending_name, .. }) => {
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
        self.write_value(BsonType::Null, RawBson::Null)
    }

    fn write_undefined(&mut self) -> DocwireResult<()> {
        self.write_value(BsonType::Undefined, RawBson::Undefined)
    }

    fn write_boolean(&mut self, value: bool) -> DocwireResult<()> {
        self.write_value(BsonType::Boolean, RawBson::Boolean(value))
    }

    fn write_int32(&mut self, value: i32) -> DocwireResult<()> {
        self.write_value(BsonType::Int32, RawBson::Int32(value))
    }

    fn write_int64(&mut self, value: i64) -> DocwireResult<()> {
        self.write_value(BsonType::Int64, RawBson::Int64(value))
    }

    fn write_double(&mut self, value: f64) -> DocwireResult<()> {
        self.write_value(BsonType::Double, RawBson::Double(value))
    }

    fn write_decimal128(&mut self, value: Decimal128) -> DocwireResult<()> {
        self.write_value(BsonType::Decimal128, RawBson::Decimal128(value))
    }

    fn write_string(&mut self, value: &str) -> DocwireResult<()> {
        check_length(value.len() + 1)?;
        self.write_value(BsonType::String, RawBson::String(value.to_string()))
    }

    fn write_symbol(&mut self, value: &str) -> DocwireResult<()> {
        check_length(value.len() + 1)?;
        self.write_value(BsonType::Symbol, RawBson::Symbol(value.to_string()))
    }

    fn write_object_id(&mut self, value: ObjectId) -> DocwireResult<()> {
        self.write_value(BsonType::ObjectId, RawBson::ObjectId(value))
    }

    fn write_date_time(&mut self, millis: i64) -> DocwireResult<()> {
        self.write_value(
            BsonType::DateTime,
            RawBson::DateTime(bson::DateTime::from_millis(millis)),
        )
    }

    fn write_regular_expression(&mut self, value: &Regex) -> DocwireResult<()> {
        check_cstring(value.pattern(), "regular expression pattern")?;
        check_cstring(value.options(), "regular expression options")?;
        let regex = bson::Regex {
            pattern: value.pattern().to_string(),
            options: value.options().to_string(),
        };
        self.write_value(BsonType::RegularExpression, RawBson::RegularExpression(regex))
    }

    fn write_javascript(&mut self, code: &str) -> DocwireResult<()> {
        check_length(code.len() + 1)?;
        self.write_value(BsonType::JavaScript, RawBson::JavaScriptCode(code.to_string()))
    }

    fn write_javascript_with_scope(&mut self, code: &str) -> DocwireResult<()> {
        check_length(code.len() + 1)?;
        let key = self.claim_slot(BsonType::JavaScriptWithScope)?;
        self.frames.push(Frame::CodeWithScope {
            code: code.to_string(),
            key,
        });
        Ok(())
    }

    fn write_binary_data(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> DocwireResult<()> {
        // the old binary subtype repeats the length inside the payload
        check_length(bytes.len() + 4)?;
        let binary = Binary {
            subtype,
            bytes: bytes.to_vec(),
        };
        self.write_value(BsonType::Binary, RawBson::Binary(binary))
    }

    fn write_timestamp(&mut self, value: Timestamp) -> DocwireResult<()> {
        self.write_value(BsonType::Timestamp, RawBson::Timestamp(value))
    }

    fn write_min_key(&mut self) -> DocwireResult<()> {
        self.write_value(BsonType::MinKey, RawBson::MinKey)
    }

    fn write_max_key(&mut self) -> DocwireResult<()> {
        self.write_value(BsonType::MaxKey, RawBson::MaxKey)
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn rollback(&mut self, mark: WriterMark) {
        if self.frames.len() > mark.depth() {
            log::debug!(
                "Discarding {} partially written container(s)",
                self.frames.len() - mark.depth()
            );
            self.frames.truncate(mark.depth());
        }
        if let Some(Frame::Document { pending_name, .. }) = self.frames.last_mut() {
            *pending_name = None;
        }
    }
}

fn invalid_operation(message: &str) -> DocwireError {
    log::error!("{}", message);
    DocwireError::new(message, ErrorKind::InvalidOperation)
}

fn check_length(length: usize) -> DocwireResult<()> {
    if i32::try_from(length).is_err() {
        log::error!("Length {} does not fit the wire format", length);
        return Err(DocwireError::new(
            &format!("Length {} does not fit the wire format", length),
            ErrorKind::EncodingError,
        ));
    }
    Ok(())
}

fn check_cstring(value: &str, what: &str) -> DocwireResult<()> {
    if value.as_bytes().contains(&0) {
        log::error!("The {} {:?} contains a NUL byte", what, value);
        return Err(DocwireError::new(
            &format!("The {} {:?} contains a NUL byte", what, value),
            ErrorKind::EncodingError,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_world() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("hello").unwrap();
        writer.write_string("world").unwrap();
        writer.write_end_document().unwrap();
        assert!(writer.is_complete());
        assert_eq!(
            writer.into_bytes().unwrap(),
            b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00".to_vec()
        );
    }

    #[test]
    fn test_empty_document() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_end_document().unwrap();
        assert_eq!(writer.into_bytes().unwrap(), vec![5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_array_elements_are_indexed() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("a").unwrap();
        writer.write_start_array().unwrap();
        writer.write_boolean(true).unwrap();
        writer.write_end_array().unwrap();
        writer.write_end_document().unwrap();
        assert_eq!(
            writer.into_bytes().unwrap(),
            vec![17, 0, 0, 0, 4, b'a', 0, 9, 0, 0, 0, 8, b'0', 0, 1, 0, 0]
        );
    }

    #[test]
    fn test_code_with_scope_closes_with_its_scope() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("f").unwrap();
        writer.write_javascript_with_scope("x").unwrap();
        assert_eq!(writer.depth(), 2);
        writer.write_start_document().unwrap();
        writer.write_end_document().unwrap();
        assert_eq!(writer.depth(), 1);
        writer.write_end_document().unwrap();

        let bytes = writer.into_bytes().unwrap();
        // total(4) + code string(4 + 2) + scope(5)
        assert_eq!(&bytes[7..11], &15i32.to_le_bytes());
        assert_eq!(bytes.len(), 4 + 1 + 2 + 15 + 1);
    }

    #[test]
    fn test_value_needs_a_name_in_document() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        let err = writer.write_int32(1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_value_outside_document_fails() {
        let mut writer = BinaryWriter::new();
        assert!(writer.write_int32(1).is_err());
        assert!(writer.write_name("a").is_err());
        assert!(writer.write_start_array().is_err());
    }

    #[test]
    fn test_second_name_without_value_fails() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("a").unwrap();
        let err = writer.write_name("b").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_end_with_pending_name_fails() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("a").unwrap();
        assert!(writer.write_end_document().is_err());
        assert_eq!(writer.depth(), 1);
    }

    #[test]
    fn test_mismatched_end_fails() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        assert!(writer.write_end_array().is_err());
        writer.write_end_document().unwrap();
        assert!(writer.write_end_document().is_err());
    }

    #[test]
    fn test_nul_in_name_is_rejected() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        let err = writer.write_name("a\0b").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
        writer.write_end_document().unwrap();
        assert_eq!(writer.into_bytes().unwrap(), vec![5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_nul_in_regex_is_rejected() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("r").unwrap();
        let err = writer
            .write_regular_expression(&Regex::new("a\0", ""))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
        writer.write_null().unwrap();
        writer.write_end_document().unwrap();
        assert_eq!(
            writer.into_bytes().unwrap(),
            vec![8, 0, 0, 0, 0x0A, b'r', 0, 0]
        );
    }

    #[test]
    fn test_old_binary_repeats_length() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("b").unwrap();
        writer
            .write_binary_data(BinarySubtype::BinaryOld, &[9, 9])
            .unwrap();
        writer.write_end_document().unwrap();
        let bytes = writer.into_bytes().unwrap();
        assert_eq!(&bytes[7..11], &6i32.to_le_bytes());
        assert_eq!(bytes[11], 0x02);
        assert_eq!(&bytes[12..16], &2i32.to_le_bytes());
        assert_eq!(&bytes[16..18], &[9, 9]);
    }

    #[test]
    fn test_into_bytes_with_open_container_fails() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        assert!(!writer.is_complete());
        let err = writer.into_bytes().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_timestamp_layout_is_increment_then_time() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("t").unwrap();
        writer
            .write_timestamp(Timestamp {
                time: 1,
                increment: 2,
            })
            .unwrap();
        writer.write_end_document().unwrap();
        let bytes = writer.into_bytes().unwrap();
        assert_eq!(&bytes[7..15], &[2, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_root_documents_follow_each_other() {
        let mut writer = BinaryWriter::new();
        for _ in 0..2 {
            writer.write_start_document().unwrap();
            writer.write_end_document().unwrap();
        }
        assert_eq!(writer.into_bytes().unwrap(), vec![5, 0, 0, 0, 0, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_rollback_discards_open_containers_and_their_name() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("keep").unwrap();
        writer.write_int32(1).unwrap();
        writer.write_name("drop").unwrap();
        let mark = writer.mark();
        writer.write_start_document().unwrap();
        writer.write_name("x").unwrap();
        writer.write_start_array().unwrap();
        writer.write_int32(2).unwrap();
        assert_eq!(writer.depth(), 3);

        writer.rollback(mark);
        assert_eq!(writer.depth(), 1);
        writer.write_end_document().unwrap();
        assert_eq!(
            writer.into_bytes().unwrap(),
            vec![15, 0, 0, 0, 0x10, b'k', b'e', b'e', b'p', 0, 1, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_rollback_at_root_keeps_finished_documents() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_end_document().unwrap();
        let mark = writer.mark();
        writer.write_start_document().unwrap();
        writer.write_name("a").unwrap();
        writer.rollback(mark);
        assert_eq!(writer.depth(), 0);
        assert!(writer.is_complete());
        assert_eq!(writer.as_bytes(), &[5, 0, 0, 0, 0]);
    }
}
