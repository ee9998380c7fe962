use docwire::codec::{DecoderContext, DocumentCodec, EncoderContext};
use docwire::common::{
    Binary, CodeWithScope, DateTime, DbRef, Decimal128, Regex, Timestamp, Value,
};
use docwire::doc;
use docwire::document::{Document, ObjectId};
use docwire::errors::DocwireResult;
use docwire::wire::BinarySubtype;

/// Encodes with the given context and decodes the bytes back.
pub fn round_trip_with(
    codec: &DocumentCodec,
    document: &Document,
    encoder: &EncoderContext,
    decoder: &DecoderContext,
) -> DocwireResult<Document> {
    let bytes = codec.encode_to_vec(document, encoder)?;
    codec.decode_from_slice(&bytes, decoder)
}

pub fn round_trip(codec: &DocumentCodec, document: &Document) -> DocwireResult<Document> {
    round_trip_with(
        codec,
        document,
        &EncoderContext::default(),
        &DecoderContext::default(),
    )
}

/// Field names of the document in order.
pub fn keys(document: &Document) -> Vec<String> {
    document.keys().cloned().collect()
}

/// A document holding one value of every kind that survives a round trip
/// unchanged.
pub fn sample_document() -> Document {
    doc! {
        _id: (ObjectId::from_bytes([0x5f; 12])),
        nothing: (Value::Null),
        active: true,
        age: 42,
        balance: (9_007_199_254_740_993i64),
        ratio: 0.25,
        name: "Jane Doe",
        avatar: (Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])),
        price: (Decimal128::from_bytes([
            0x2B, 0x04, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x3C, 0x30,
        ])),
        digest: (Binary { subtype: BinarySubtype::Md5, bytes: vec![7; 16] }),
        session: (uuid::Uuid::from_bytes([3; 16])),
        created: (DateTime::from_millis(1_600_000_000_123)),
        matcher: (Regex::new("^j.*e$", "im")),
        script: (Value::JavaScript("return 1;".to_string())),
        scoped: (CodeWithScope::new("return x;", doc! { x: 10 })),
        oplog: (Timestamp { time: 1_700_000_000, increment: 3 }),
        lower: (Value::MinKey),
        upper: (Value::MaxKey),
        address: {
            street: "1 Main St",
            city: "Springfield",
            geo: [1.5, (-2.25)]
        },
        tags: ["a", { nested: [1, 2, 3] }, []],
        friend: (DbRef::new("people", ObjectId::from_bytes([1; 12]))),
    }
}

/// Bytes of a single-field document holding the deprecated DB pointer, which
/// the writers do not produce.
pub fn db_pointer_document(name: &str, namespace: &str, id: ObjectId) -> Vec<u8> {
    let mut bytes = vec![0, 0, 0, 0, 0x0C];
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(&(namespace.len() as i32 + 1).to_le_bytes());
    bytes.extend_from_slice(namespace.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(&id.bytes());
    bytes.push(0);
    let length = bytes.len() as i32;
    bytes[..4].copy_from_slice(&length.to_le_bytes());
    bytes
}
