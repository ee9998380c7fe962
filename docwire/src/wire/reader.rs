use crate::common::{Binary, Decimal128, Regex, Timestamp};
use crate::document::ObjectId;
use crate::errors::DocwireResult;
use crate::wire::{BinarySubtype, BsonType};

/// Structured source for the wire format.
///
/// The mirror of [`crate::wire::BsonWriter`]. Inside a container,
/// [`BsonReader::read_bson_type`] advances to the next element and reports its
/// type, or [`BsonType::EndOfDocument`] at the end of the container; the
/// element name is then available from [`BsonReader::read_name`] and the value
/// is consumed with the typed read that matches [`BsonReader::current_type`].
///
/// Structural defects in the input surface as
/// [`crate::errors::ErrorKind::MalformedInput`]; a typed read that does not
/// match the current element is [`crate::errors::ErrorKind::InvalidOperation`].
pub trait BsonReader {
    fn read_start_document(&mut self) -> DocwireResult<()>;

    fn read_end_document(&mut self) -> DocwireResult<()>;

    fn read_start_array(&mut self) -> DocwireResult<()>;

    fn read_end_array(&mut self) -> DocwireResult<()>;

    /// Advances to the next element of the open container.
    fn read_bson_type(&mut self) -> DocwireResult<BsonType>;

    /// Type of the element the reader is positioned on.
    fn current_type(&self) -> Option<BsonType>;

    /// Name of the element the reader is positioned on.
    fn read_name(&mut self) -> DocwireResult<String>;

    fn read_null(&mut self) -> DocwireResult<()>;

    fn read_undefined(&mut self) -> DocwireResult<()>;

    fn read_boolean(&mut self) -> DocwireResult<bool>;

    fn read_int32(&mut self) -> DocwireResult<i32>;

    fn read_int64(&mut self) -> DocwireResult<i64>;

    fn read_double(&mut self) -> DocwireResult<f64>;

    fn read_decimal128(&mut self) -> DocwireResult<Decimal128>;

    fn read_string(&mut self) -> DocwireResult<String>;

    fn read_symbol(&mut self) -> DocwireResult<String>;

    fn read_object_id(&mut self) -> DocwireResult<ObjectId>;

    /// Reads a UTC instant as milliseconds since the Unix epoch.
    fn read_date_time(&mut self) -> DocwireResult<i64>;

    fn read_regular_expression(&mut self) -> DocwireResult<Regex>;

    fn read_javascript(&mut self) -> DocwireResult<String>;

    /// Reads the code of a code-with-scope value. The scope follows as a
    /// document and its `read_end_document` completes the value.
    fn read_javascript_with_scope(&mut self) -> DocwireResult<String>;

    fn read_binary_data(&mut self) -> DocwireResult<Binary>;

    fn read_timestamp(&mut self) -> DocwireResult<Timestamp>;

    fn read_min_key(&mut self) -> DocwireResult<()>;

    fn read_max_key(&mut self) -> DocwireResult<()>;

    /// Reads the deprecated namespace + object id pointer.
    fn read_db_pointer(&mut self) -> DocwireResult<(String, ObjectId)>;

    /// Subtype of the binary element the reader is positioned on, without
    /// consuming it.
    fn peek_binary_subtype(&self) -> DocwireResult<BinarySubtype>;

    /// Payload length of the binary element the reader is positioned on,
    /// without consuming it.
    fn peek_binary_size(&self) -> DocwireResult<usize>;
}
