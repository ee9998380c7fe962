use crate::codec::{DocumentCodec, EncoderContext};
use crate::common::{Value, DOC_ID};
use crate::document::Document;
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::ValueWriter;

impl DocumentCodec {
    /// Returns `true` if the document has an `_id` field.
    pub fn has_identifier(&self, document: &Document) -> bool {
        document.has_id()
    }

    /// Returns the `_id` of the document in its wire form.
    ///
    /// An `_id` that is already in wire form is returned as is. Anything
    /// else (a reference, a UUID, raw bytes, a custom value, or a container
    /// holding one) is run through the encoder into a [ValueWriter], so the
    /// result is exactly what a decoder would read back.
    ///
    /// # Errors
    ///
    /// [ErrorKind::MissingIdentifier] when the document has no `_id`.
    pub fn identifier_of(&self, document: &Document) -> DocwireResult<Value> {
        let id = match document.get(DOC_ID) {
            Some(id) => id,
            None => {
                log::error!("Document has no {} field", DOC_ID);
                return Err(DocwireError::new(
                    &format!("Document has no {} field", DOC_ID),
                    ErrorKind::MissingIdentifier,
                ));
            }
        };

        if id.is_wire_native() {
            return Ok(id.clone());
        }

        let mut writer = ValueWriter::new();
        self.encode_value(&mut writer, id, &EncoderContext::default())?;
        writer.into_value()
    }

    /// Appends a generated object id under `_id` when the document has none.
    /// A document that already has an `_id` is left untouched.
    pub fn ensure_identifier<'a>(&self, document: &'a mut Document) -> &'a mut Document {
        if !document.has_id() {
            let id = self.id_generator().generate();
            log::trace!("Generated identifier {} for document", id);
            document.put(DOC_ID, id);
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Binary, DbRef};
    use crate::doc;
    use crate::document::{IdGenerator, ObjectId};
    use crate::wire::BinarySubtype;

    #[test]
    fn test_has_identifier() {
        let codec = DocumentCodec::default();
        assert!(codec.has_identifier(&doc! { _id: 1 }));
        assert!(!codec.has_identifier(&doc! { id: 1 }));
    }

    #[test]
    fn test_identifier_of_missing_id() {
        let err = DocumentCodec::default()
            .identifier_of(&doc! { a: 1 })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MissingIdentifier);
    }

    #[test]
    fn test_identifier_of_native_value() {
        let id = ObjectId::from_bytes([5; 12]);
        let codec = DocumentCodec::default();
        assert_eq!(codec.identifier_of(&doc! { _id: id }).unwrap(), Value::ObjectId(id));
        assert_eq!(
            codec.identifier_of(&doc! { _id: { a: 1 } }).unwrap(),
            Value::Document(doc! { a: 1 })
        );
    }

    #[test]
    fn test_identifier_of_uuid_is_binary() {
        let uuid = uuid::Uuid::new_v4();
        let id = DocumentCodec::default()
            .identifier_of(&doc! { _id: uuid })
            .unwrap();
        assert_eq!(
            id,
            Value::Binary(Binary {
                subtype: BinarySubtype::Uuid,
                bytes: uuid.as_bytes().to_vec(),
            })
        );
    }

    #[test]
    fn test_identifier_of_reference_is_expanded() {
        let reference = DbRef::new("c", 1);
        let id = DocumentCodec::default()
            .identifier_of(&doc! { _id: (reference.clone()) })
            .unwrap();
        assert_eq!(id, Value::Document(reference.to_document()));
    }

    #[test]
    fn test_ensure_identifier_appends_object_id() {
        let codec = DocumentCodec::default();
        let mut document = doc! { a: 1 };
        codec.ensure_identifier(&mut document);
        let keys: Vec<&str> = document.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "_id"]);
        assert!(document.id().and_then(Value::as_object_id).is_some());
    }

    #[test]
    fn test_ensure_identifier_is_idempotent() {
        let codec = DocumentCodec::default();
        let mut document = doc! { a: 1 };
        let first = codec.ensure_identifier(&mut document).clone();
        let second = codec.ensure_identifier(&mut document).clone();
        assert_eq!(first, second);

        let mut with_id = doc! { _id: "mine" };
        codec.ensure_identifier(&mut with_id);
        assert_eq!(with_id, doc! { _id: "mine" });
    }

    #[test]
    fn test_ensure_identifier_uses_configured_generator() {
        struct Fixed;

        impl IdGenerator for Fixed {
            fn generate(&self) -> ObjectId {
                ObjectId::from_bytes([9; 12])
            }
        }

        let codec = DocumentCodec::builder().id_generator(Fixed).build().unwrap();
        let mut document = Document::new();
        codec.ensure_identifier(&mut document);
        assert_eq!(document.id(), Some(&Value::ObjectId(ObjectId::from_bytes([9; 12]))));
    }
}
