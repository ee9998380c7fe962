use std::sync::Arc;

use crate::codec::{
    BsonTypeClassMap, CodecRegistry, DecoderContext, DocumentFactory, EncoderContext, FieldPath,
};
use crate::codec_builder::DocumentCodecBuilder;
use crate::codec_config::CodecConfig;
use crate::common::{CodeWithScope, DbRef, Value, ValueType, DOC_ID, UUID_LENGTH};
use crate::document::{Document, IdGenerator};
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::{
    BinaryReader, BinarySubtype, BinaryWriter, BsonReader, BsonType, BsonWriter, SubtypeClass,
};

/// Converts between [Document] trees and the binary document format.
///
/// The codec writes the structural forms itself and delegates every other
/// value to the leaf codec registered for its [ValueType]:
///
/// | value | written as |
/// |---|---|
/// | [Value::Null] | null |
/// | [Value::Reference] | `{"$ref": .., "$id": ..[, "$db": ..]}` |
/// | [Value::Document] | embedded document |
/// | [Value::Array] | array |
/// | [Value::JavaScriptWithScope] | code-with-scope, then its scope document |
/// | [Value::Bytes] | binary with the generic subtype |
/// | [Value::Symbol] | symbol |
/// | anything else | the registered leaf codec |
///
/// On the way back an embedded document shaped like a reference folds into
/// [Value::Reference], binaries are told apart by subtype and size, and
/// every other tag goes through the [BsonTypeClassMap] to a leaf codec.
///
/// A codec is cheap to clone and safe to share between threads; it keeps no
/// state between calls.
///
/// # Examples
///
/// ```rust,ignore
/// let codec = DocumentCodec::default();
/// let bytes = codec.encode_to_vec(&doc! { name: "Alice" }, &EncoderContext::default())?;
/// let back = codec.decode_from_slice(&bytes, &DecoderContext::default())?;
/// ```
#[derive(Clone)]
pub struct DocumentCodec {
    inner: Arc<DocumentCodecInner>,
}

impl std::fmt::Debug for DocumentCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCodec").finish_non_exhaustive()
    }
}

impl Default for DocumentCodec {
    fn default() -> Self {
        DocumentCodec::new(CodecConfig::default())
    }
}

impl DocumentCodec {
    /// Creates a codec from the configuration. The configuration can no
    /// longer be changed afterwards.
    pub fn new(config: CodecConfig) -> Self {
        config.initialize();
        log::debug!("Created document codec with {:?}", config.registry());
        DocumentCodec {
            inner: Arc::new(DocumentCodecInner {
                registry: config.registry(),
                type_map: config.type_map(),
                document_factory: config.document_factory(),
                id_generator: config.id_generator(),
                config,
            }),
        }
    }

    pub fn builder() -> DocumentCodecBuilder {
        DocumentCodecBuilder::new()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.inner.registry
    }

    pub(crate) fn id_generator(&self) -> &Arc<dyn IdGenerator> {
        &self.inner.id_generator
    }

    /// Writes the document to the writer.
    ///
    /// In a collectible context the `_id` field, when present, is written
    /// first and the other fields follow in their own order.
    ///
    /// # Errors
    ///
    /// [ErrorKind::CodecConfigurationError] when a value has no registered
    /// leaf codec. On failure the writer is rolled back to the depth it had
    /// before the call, so nothing of the document is left behind and the
    /// caller's containers can still be closed.
    pub fn encode(
        &self,
        writer: &mut dyn BsonWriter,
        document: &Document,
        context: &EncoderContext,
    ) -> DocwireResult<()> {
        let mark = writer.mark();
        let result = self.write_document(writer, document, context);
        if result.is_err() {
            writer.rollback(mark);
        }
        result
    }

    /// Writes a single value. The writer must be positioned for a value.
    ///
    /// Fails the same way as [DocumentCodec::encode]: a value that cannot be
    /// written is dropped together with its field name.
    pub fn encode_value(
        &self,
        writer: &mut dyn BsonWriter,
        value: &Value,
        context: &EncoderContext,
    ) -> DocwireResult<()> {
        let mark = writer.mark();
        let result = self.write_value(writer, value, context);
        if result.is_err() {
            writer.rollback(mark);
        }
        result
    }

    fn write_document(
        &self,
        writer: &mut dyn BsonWriter,
        document: &Document,
        context: &EncoderContext,
    ) -> DocwireResult<()> {
        writer.write_start_document()?;
        let child = context.child();

        let id_first = context.is_collectible() && document.has_id();
        if id_first {
            if let Some(id) = document.get(DOC_ID) {
                writer.write_name(DOC_ID)?;
                self.write_value(writer, id, &child)?;
            }
        }

        for (name, value) in document.iter() {
            if id_first && name == DOC_ID {
                continue;
            }
            writer.write_name(name)?;
            self.write_value(writer, value, &child)?;
        }

        writer.write_end_document()
    }

    fn write_value(
        &self,
        writer: &mut dyn BsonWriter,
        value: &Value,
        context: &EncoderContext,
    ) -> DocwireResult<()> {
        let hooked;
        let value = match context.encoding_hook() {
            Some(hook) => {
                hooked = hook(value.clone());
                &hooked
            }
            None => value,
        };

        match value {
            Value::Null => writer.write_null(),
            Value::Reference(reference) => {
                self.write_document(writer, &reference.to_document(), &context.child())
            }
            Value::Document(document) => self.write_document(writer, document, &context.child()),
            Value::Array(values) => {
                writer.write_start_array()?;
                let child = context.child();
                for value in values {
                    self.write_value(writer, value, &child)?;
                }
                writer.write_end_array()
            }
            Value::JavaScriptWithScope(code) => {
                writer.write_javascript_with_scope(code.code())?;
                self.write_document(writer, code.scope(), &context.child())
            }
            Value::Bytes(bytes) => writer.write_binary_data(BinarySubtype::Generic, bytes),
            Value::Symbol(symbol) => writer.write_symbol(symbol),
            other => {
                let codec = self.inner.registry.get(&other.value_type())?;
                codec.encode(writer, other, context)
            }
        }
    }

    /// Encodes the document into a new buffer. Either the complete encoding
    /// is returned or an error; partial output is never exposed.
    pub fn encode_to_vec(&self, document: &Document, context: &EncoderContext) -> DocwireResult<Vec<u8>> {
        let mut writer = BinaryWriter::new();
        self.encode(&mut writer, document, context)?;
        writer.into_bytes()
    }

    /// Write path for a document headed for a collection: gives it an `_id`
    /// when it has none, then encodes it with the `_id` first.
    pub fn encode_collectible(&self, writer: &mut dyn BsonWriter, document: &mut Document) -> DocwireResult<()> {
        self.ensure_identifier(document);
        self.encode(writer, document, &EncoderContext::collectible())
    }

    /// Reads a document from the reader.
    ///
    /// # Errors
    ///
    /// [ErrorKind::MalformedInput] for structural defects in the input and
    /// [ErrorKind::CodecConfigurationError] when a wire tag has no mapped
    /// value type or the mapped type has no registered leaf codec.
    pub fn decode(&self, reader: &mut dyn BsonReader, context: &DecoderContext) -> DocwireResult<Document> {
        self.decode_document(reader, &FieldPath::root(), context)
    }

    /// Decodes a complete buffer holding exactly one document.
    pub fn decode_from_slice(&self, bytes: &[u8], context: &DecoderContext) -> DocwireResult<Document> {
        let mut reader = BinaryReader::new(bytes);
        let document = self.decode(&mut reader, context)?;
        if !reader.is_at_end() {
            log::error!(
                "{} trailing bytes after the document",
                reader.remaining().len()
            );
            return Err(DocwireError::new(
                &format!("{} trailing bytes after the document", reader.remaining().len()),
                ErrorKind::MalformedInput,
            ));
        }
        Ok(document)
    }

    fn decode_document(
        &self,
        reader: &mut dyn BsonReader,
        path: &FieldPath<'_>,
        context: &DecoderContext,
    ) -> DocwireResult<Document> {
        let mut document = self.inner.document_factory.new_document(path);
        reader.read_start_document()?;
        loop {
            let bson_type = reader.read_bson_type()?;
            if bson_type == BsonType::EndOfDocument {
                break;
            }
            let name = reader.read_name()?;
            let value = self.decode_value(reader, bson_type, &path.child(&name), context)?;
            document.put(name, value);
        }
        reader.read_end_document()?;
        Ok(document)
    }

    fn decode_value(
        &self,
        reader: &mut dyn BsonReader,
        bson_type: BsonType,
        path: &FieldPath<'_>,
        context: &DecoderContext,
    ) -> DocwireResult<Value> {
        let value = match bson_type {
            BsonType::Document => {
                let document = self.decode_document(reader, path, context)?;
                match DbRef::from_document(&document) {
                    Some(reference) => Value::Reference(reference),
                    None => Value::Document(document),
                }
            }
            BsonType::Array => {
                reader.read_start_array()?;
                let mut values = Vec::new();
                loop {
                    let element_type = reader.read_bson_type()?;
                    if element_type == BsonType::EndOfDocument {
                        break;
                    }
                    // elements are unnamed, they share the array's path
                    values.push(self.decode_value(reader, element_type, path, context)?);
                }
                reader.read_end_array()?;
                Value::Array(values)
            }
            BsonType::JavaScriptWithScope => {
                let code = reader.read_javascript_with_scope()?;
                let scope = self.decode_document(reader, path, context)?;
                Value::JavaScriptWithScope(CodeWithScope::new(code, scope))
            }
            BsonType::DbPointer => {
                let (namespace, id) = reader.read_db_pointer()?;
                Value::Reference(DbRef::new(namespace, id))
            }
            BsonType::Binary => {
                let subtype = reader.peek_binary_subtype()?;
                let size = reader.peek_binary_size()?;
                let value_type = if subtype.is_uuid() && size == UUID_LENGTH {
                    ValueType::Uuid
                } else if subtype.is_raw_bytes() {
                    ValueType::Bytes
                } else {
                    ValueType::Binary
                };
                self.inner.registry.get(&value_type)?.decode(reader, context)?
            }
            BsonType::Null => {
                reader.read_null()?;
                Value::Null
            }
            other => {
                let value_type = self.inner.type_map.get(other)?;
                self.inner.registry.get(value_type)?.decode(reader, context)?
            }
        };
        Ok(context.apply_decoding_hook(value))
    }
}

struct DocumentCodecInner {
    config: CodecConfig,
    registry: CodecRegistry,
    type_map: BsonTypeClassMap,
    document_factory: Arc<dyn DocumentFactory>,
    id_generator: Arc<dyn IdGenerator>,
}
