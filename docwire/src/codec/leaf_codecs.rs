use crate::codec::{unexpected_value, Codec, CodecProvider, DecoderContext, EncoderContext};
use crate::common::{DateTime, DbRef, Value, ValueType, UUID_LENGTH};
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::{BinarySubtype, BsonReader, BsonType, BsonWriter, SubtypeClass};

/// How [Value::Uuid] is laid out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UuidRepresentation {
    /// Binary subtype 0x04, bytes in RFC 4122 order.
    #[default]
    Standard,
    /// Binary subtype 0x03, bytes in RFC 4122 order.
    Legacy,
}

impl UuidRepresentation {
    pub fn subtype(&self) -> BinarySubtype {
        match self {
            UuidRepresentation::Standard => BinarySubtype::Uuid,
            UuidRepresentation::Legacy => BinarySubtype::UuidOld,
        }
    }
}

macro_rules! leaf_codec {
    (
        $(#[$meta:meta])*
        $name:ident, $value_type:ident,
        encode($writer:ident) { $pattern:pat => $encode:expr }
        decode($reader:ident) { $decode:expr }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl CodecProvider for $name {
            fn value_type(&self) -> ValueType {
                ValueType::$value_type
            }

            fn encode(
                &self,
                $writer: &mut dyn BsonWriter,
                value: &Value,
                _context: &EncoderContext,
            ) -> DocwireResult<()> {
                match value {
                    $pattern => $encode,
                    other => Err(unexpected_value(&self.value_type(), other)),
                }
            }

            fn decode(
                &self,
                $reader: &mut dyn BsonReader,
                _context: &DecoderContext,
            ) -> DocwireResult<Value> {
                $decode
            }
        }
    };
}

leaf_codec! {
    BooleanCodec, Boolean,
    encode(writer) { Value::Boolean(v) => writer.write_boolean(*v) }
    decode(reader) { reader.read_boolean().map(Value::Boolean) }
}

leaf_codec! {
    Int32Codec, Int32,
    encode(writer) { Value::Int32(v) => writer.write_int32(*v) }
    decode(reader) { reader.read_int32().map(Value::Int32) }
}

leaf_codec! {
    Int64Codec, Int64,
    encode(writer) { Value::Int64(v) => writer.write_int64(*v) }
    decode(reader) { reader.read_int64().map(Value::Int64) }
}

leaf_codec! {
    DoubleCodec, Double,
    encode(writer) { Value::Double(v) => writer.write_double(*v) }
    decode(reader) { reader.read_double().map(Value::Double) }
}

leaf_codec! {
    Decimal128Codec, Decimal128,
    encode(writer) { Value::Decimal128(v) => writer.write_decimal128(*v) }
    decode(reader) { reader.read_decimal128().map(Value::Decimal128) }
}

leaf_codec! {
    /// Writes strings; reads both strings and the deprecated symbol as
    /// [Value::String].
    StringCodec, String,
    encode(writer) { Value::String(v) => writer.write_string(v) }
    decode(reader) {
        match reader.current_type() {
            Some(BsonType::Symbol) => reader.read_symbol().map(Value::String),
            _ => reader.read_string().map(Value::String),
        }
    }
}

leaf_codec! {
    /// Raw byte sequences, written with the generic binary subtype.
    BytesCodec, Bytes,
    encode(writer) { Value::Bytes(v) => writer.write_binary_data(BinarySubtype::Generic, v) }
    decode(reader) { reader.read_binary_data().map(|binary| Value::Bytes(binary.bytes)) }
}

leaf_codec! {
    BinaryCodec, Binary,
    encode(writer) { Value::Binary(v) => writer.write_binary_data(v.subtype, &v.bytes) }
    decode(reader) { reader.read_binary_data().map(Value::Binary) }
}

leaf_codec! {
    ObjectIdCodec, ObjectId,
    encode(writer) { Value::ObjectId(v) => writer.write_object_id(*v) }
    decode(reader) { reader.read_object_id().map(Value::ObjectId) }
}

leaf_codec! {
    DateTimeCodec, DateTime,
    encode(writer) { Value::DateTime(v) => writer.write_date_time(v.timestamp_millis()) }
    decode(reader) { reader.read_date_time().map(|millis| Value::DateTime(DateTime::from_millis(millis))) }
}

leaf_codec! {
    RegexCodec, Regex,
    encode(writer) { Value::Regex(v) => writer.write_regular_expression(v) }
    decode(reader) { reader.read_regular_expression().map(Value::Regex) }
}

leaf_codec! {
    JavaScriptCodec, JavaScript,
    encode(writer) { Value::JavaScript(v) => writer.write_javascript(v) }
    decode(reader) { reader.read_javascript().map(Value::JavaScript) }
}

leaf_codec! {
    TimestampCodec, Timestamp,
    encode(writer) { Value::Timestamp(v) => writer.write_timestamp(*v) }
    decode(reader) { reader.read_timestamp().map(Value::Timestamp) }
}

leaf_codec! {
    MinKeyCodec, MinKey,
    encode(writer) { Value::MinKey => writer.write_min_key() }
    decode(reader) { reader.read_min_key().map(|_| Value::MinKey) }
}

leaf_codec! {
    MaxKeyCodec, MaxKey,
    encode(writer) { Value::MaxKey => writer.write_max_key() }
    decode(reader) { reader.read_max_key().map(|_| Value::MaxKey) }
}

leaf_codec! {
    /// Writes null; reads null and the deprecated undefined as [Value::Null].
    NullCodec, Null,
    encode(writer) { Value::Null => writer.write_null() }
    decode(reader) {
        match reader.current_type() {
            Some(BsonType::Undefined) => reader.read_undefined().map(|_| Value::Null),
            _ => reader.read_null().map(|_| Value::Null),
        }
    }
}

/// Reads the deprecated DB pointer as a [Value::Reference].
///
/// Encoding is not supported: the document codec writes references itself,
/// as `$ref`/`$id` documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceCodec;

impl CodecProvider for ReferenceCodec {
    fn value_type(&self) -> ValueType {
        ValueType::Reference
    }

    fn encode(
        &self,
        _writer: &mut dyn BsonWriter,
        value: &Value,
        _context: &EncoderContext,
    ) -> DocwireResult<()> {
        log::error!("Cannot write {} as a DB pointer, references are written as $ref documents", value);
        Err(DocwireError::new(
            "References are written as $ref documents, not DB pointers",
            ErrorKind::InvalidOperation,
        ))
    }

    fn decode(&self, reader: &mut dyn BsonReader, _context: &DecoderContext) -> DocwireResult<Value> {
        let (namespace, id) = reader.read_db_pointer()?;
        Ok(Value::Reference(DbRef::new(namespace, id)))
    }
}

/// Writes [Value::Uuid] as a 16-byte binary with the subtype of its
/// [UuidRepresentation]; reads either UUID subtype.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidCodec {
    representation: UuidRepresentation,
}

impl UuidCodec {
    pub fn new(representation: UuidRepresentation) -> Self {
        UuidCodec { representation }
    }

    pub fn representation(&self) -> UuidRepresentation {
        self.representation
    }
}

impl CodecProvider for UuidCodec {
    fn value_type(&self) -> ValueType {
        ValueType::Uuid
    }

    fn encode(
        &self,
        writer: &mut dyn BsonWriter,
        value: &Value,
        _context: &EncoderContext,
    ) -> DocwireResult<()> {
        match value {
            Value::Uuid(uuid) => writer.write_binary_data(self.representation.subtype(), uuid.as_bytes()),
            other => Err(unexpected_value(&self.value_type(), other)),
        }
    }

    fn decode(&self, reader: &mut dyn BsonReader, _context: &DecoderContext) -> DocwireResult<Value> {
        let binary = reader.read_binary_data()?;
        if !binary.subtype.is_uuid() || binary.bytes.len() != UUID_LENGTH {
            log::error!("Binary {:?} is not a UUID", binary);
            return Err(DocwireError::new(
                &format!("Binary {:?} is not a UUID", binary),
                ErrorKind::MalformedInput,
            ));
        }
        uuid::Uuid::from_slice(&binary.bytes)
            .map(Value::Uuid)
            .map_err(|err| {
                log::error!("Invalid UUID payload: {}", err);
                DocwireError::new(&err.to_string(), ErrorKind::MalformedInput)
            })
    }
}

/// Every built-in leaf codec.
pub fn default_codecs(representation: UuidRepresentation) -> Vec<Codec> {
    vec![
        Codec::new(NullCodec),
        Codec::new(BooleanCodec),
        Codec::new(Int32Codec),
        Codec::new(Int64Codec),
        Codec::new(DoubleCodec),
        Codec::new(Decimal128Codec),
        Codec::new(StringCodec),
        Codec::new(BytesCodec),
        Codec::new(BinaryCodec),
        Codec::new(UuidCodec::new(representation)),
        Codec::new(ObjectIdCodec),
        Codec::new(DateTimeCodec),
        Codec::new(RegexCodec),
        Codec::new(JavaScriptCodec),
        Codec::new(TimestampCodec),
        Codec::new(MinKeyCodec),
        Codec::new(MaxKeyCodec),
        Codec::new(ReferenceCodec),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Binary, Decimal128, Regex, Timestamp};
    use crate::document::ObjectId;
    use crate::wire::{BinaryReader, BinaryWriter, ValueWriter};

    fn write_single(codec: &dyn CodecProvider, value: &Value) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("v").unwrap();
        codec
            .encode(&mut writer, value, &EncoderContext::default())
            .unwrap();
        writer.write_end_document().unwrap();
        writer.into_bytes().unwrap()
    }

    fn read_single(codec: &dyn CodecProvider, bytes: &[u8]) -> Value {
        let mut reader = BinaryReader::new(bytes);
        reader.read_start_document().unwrap();
        reader.read_bson_type().unwrap();
        let value = codec.decode(&mut reader, &DecoderContext::default()).unwrap();
        assert_eq!(reader.read_bson_type().unwrap(), BsonType::EndOfDocument);
        value
    }

    #[test]
    fn test_scalar_codecs_read_back_what_they_write() {
        let cases: Vec<(Box<dyn CodecProvider>, Value)> = vec![
            (Box::new(BooleanCodec), Value::Boolean(true)),
            (Box::new(Int32Codec), Value::Int32(-7)),
            (Box::new(Int64Codec), Value::Int64(1 << 40)),
            (Box::new(DoubleCodec), Value::Double(2.5)),
            (
                Box::new(Decimal128Codec),
                Value::Decimal128(Decimal128::from_bytes([
                    0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x40, 0x30,
                ])),
            ),
            (Box::new(StringCodec), Value::from("héllo")),
            (Box::new(BytesCodec), Value::Bytes(vec![1, 2, 3])),
            (
                Box::new(BinaryCodec),
                Value::Binary(Binary {
                    subtype: BinarySubtype::UserDefined(0x80),
                    bytes: vec![9],
                }),
            ),
            (Box::new(ObjectIdCodec), Value::ObjectId(ObjectId::from_bytes([4; 12]))),
            (Box::new(DateTimeCodec), Value::DateTime(DateTime::from_millis(-1))),
            (Box::new(RegexCodec), Value::Regex(Regex::new("^a", "mi"))),
            (Box::new(JavaScriptCodec), Value::JavaScript("1+1".into())),
            (
                Box::new(TimestampCodec),
                Value::Timestamp(Timestamp {
                    time: 5,
                    increment: 6,
                }),
            ),
            (Box::new(MinKeyCodec), Value::MinKey),
            (Box::new(MaxKeyCodec), Value::MaxKey),
            (Box::new(NullCodec), Value::Null),
            (Box::new(UuidCodec::default()), Value::Uuid(uuid::Uuid::new_v4())),
        ];

        for (codec, value) in cases {
            let bytes = write_single(codec.as_ref(), &value);
            assert_eq!(read_single(codec.as_ref(), &bytes), value);
        }
    }

    #[test]
    fn test_wrong_variant_fails_without_output() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("v").unwrap();
        let err = Int32Codec
            .encode(&mut writer, &Value::from("x"), &EncoderContext::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
        writer.write_int32(1).unwrap();
        writer.write_end_document().unwrap();
        assert_eq!(
            writer.into_bytes().unwrap(),
            vec![12, 0, 0, 0, 0x10, b'v', 0, 1, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_string_codec_reads_symbol_as_string() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("v").unwrap();
        writer.write_symbol("sym").unwrap();
        writer.write_end_document().unwrap();
        let bytes = writer.into_bytes().unwrap();
        assert_eq!(read_single(&StringCodec, &bytes), Value::from("sym"));
    }

    #[test]
    fn test_null_codec_reads_undefined_as_null() {
        let mut writer = BinaryWriter::new();
        writer.write_start_document().unwrap();
        writer.write_name("v").unwrap();
        writer.write_undefined().unwrap();
        writer.write_end_document().unwrap();
        let bytes = writer.into_bytes().unwrap();
        assert_eq!(read_single(&NullCodec, &bytes), Value::Null);
    }

    #[test]
    fn test_uuid_representation_selects_subtype() {
        let uuid = uuid::Uuid::new_v4();
        let mut writer = ValueWriter::new();
        UuidCodec::new(UuidRepresentation::Legacy)
            .encode(&mut writer, &Value::Uuid(uuid), &EncoderContext::default())
            .unwrap();
        assert_eq!(
            writer.into_value().unwrap(),
            Value::Binary(Binary {
                subtype: BinarySubtype::UuidOld,
                bytes: uuid.as_bytes().to_vec(),
            })
        );

        let bytes = write_single(&UuidCodec::new(UuidRepresentation::Legacy), &Value::Uuid(uuid));
        assert_eq!(read_single(&UuidCodec::default(), &bytes), Value::Uuid(uuid));
    }

    #[test]
    fn test_reference_codec_reads_db_pointer() {
        // {v: DBPointer("things", 0808..)}
        let mut bytes = vec![0, 0, 0, 0, 0x0C, b'v', 0];
        bytes.extend_from_slice(&7i32.to_le_bytes());
        bytes.extend_from_slice(b"things\0");
        bytes.extend_from_slice(&[8; 12]);
        bytes.push(0);
        let length = bytes.len() as i32;
        bytes[..4].copy_from_slice(&length.to_le_bytes());

        let id = ObjectId::from_bytes([8; 12]);
        assert_eq!(
            read_single(&ReferenceCodec, &bytes),
            Value::Reference(DbRef::new("things", id))
        );
    }

    #[test]
    fn test_reference_codec_does_not_write() {
        let mut writer = ValueWriter::new();
        let reference = Value::Reference(DbRef::new("things", ObjectId::from_bytes([8; 12])));
        let err = ReferenceCodec
            .encode(&mut writer, &reference, &EncoderContext::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert!(writer.into_value().is_err());
    }

    #[test]
    fn test_default_codecs_cover_every_leaf_type() {
        let types: Vec<ValueType> = default_codecs(UuidRepresentation::Standard)
            .iter()
            .map(Codec::value_type)
            .collect();
        assert_eq!(types.len(), 18);
        assert!(types.contains(&ValueType::Uuid));
        assert!(types.contains(&ValueType::Reference));
        assert!(!types.contains(&ValueType::Document));
    }
}
