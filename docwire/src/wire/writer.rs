use crate::common::{Decimal128, Regex, Timestamp};
use crate::document::ObjectId;
use crate::errors::DocwireResult;
use crate::wire::BinarySubtype;

/// Structured sink for the wire format.
///
/// A writer is driven as a sequence of structural events: open a document,
/// name a field, write its value, close the document. Inside an array values
/// are written without names. Writers reject calls that arrive out of order
/// with [`crate::errors::ErrorKind::InvalidOperation`].
///
/// A code-with-scope value is written in two steps: [`BsonWriter::write_javascript_with_scope`]
/// writes the code, then the scope is written as a document
/// (`write_start_document` ... `write_end_document`), which also completes
/// the code-with-scope value.
///
/// The trait is object safe; codecs receive `&mut dyn BsonWriter`.
pub trait BsonWriter {
    fn write_start_document(&mut self) -> DocwireResult<()>;

    fn write_end_document(&mut self) -> DocwireResult<()>;

    fn write_start_array(&mut self) -> DocwireResult<()>;

    fn write_end_array(&mut self) -> DocwireResult<()>;

    /// Names the next value of the enclosing document.
    fn write_name(&mut self, name: &str) -> DocwireResult<()>;

    fn write_null(&mut self) -> DocwireResult<()>;

    /// Writes the deprecated undefined marker.
    fn write_undefined(&mut self) -> DocwireResult<()>;

    fn write_boolean(&mut self, value: bool) -> DocwireResult<()>;

    fn write_int32(&mut self, value: i32) -> DocwireResult<()>;

    fn write_int64(&mut self, value: i64) -> DocwireResult<()>;

    fn write_double(&mut self, value: f64) -> DocwireResult<()>;

    fn write_decimal128(&mut self, value: Decimal128) -> DocwireResult<()>;

    fn write_string(&mut self, value: &str) -> DocwireResult<()>;

    fn write_symbol(&mut self, value: &str) -> DocwireResult<()>;

    fn write_object_id(&mut self, value: ObjectId) -> DocwireResult<()>;

    /// Writes a UTC instant as milliseconds since the Unix epoch.
    fn write_date_time(&mut self, millis: i64) -> DocwireResult<()>;

    fn write_regular_expression(&mut self, value: &Regex) -> DocwireResult<()>;

    fn write_javascript(&mut self, code: &str) -> DocwireResult<()>;

    fn write_javascript_with_scope(&mut self, code: &str) -> DocwireResult<()>;

    fn write_binary_data(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> DocwireResult<()>;

    fn write_timestamp(&mut self, value: Timestamp) -> DocwireResult<()>;

    fn write_min_key(&mut self) -> DocwireResult<()>;

    fn write_max_key(&mut self) -> DocwireResult<()>;

    /// Number of containers currently open.
    fn depth(&self) -> usize;

    /// Remembers the current position so a failed value can be undone.
    fn mark(&self) -> WriterMark {
        WriterMark::at(self.depth())
    }

    /// Drops every container opened since `mark` together with the field
    /// name waiting at the marked level. Values completed before the mark
    /// are kept.
    fn rollback(&mut self, mark: WriterMark);
}

/// Position returned by [BsonWriter::mark].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterMark {
    depth: usize,
}

impl WriterMark {
    pub fn at(depth: usize) -> Self {
        WriterMark { depth }
    }

    /// Number of containers that were open when the mark was taken.
    pub fn depth(&self) -> usize {
        self.depth
    }
}
