use std::fmt::{Display, Formatter};

use crate::common::{Value, REFERENCE_FIELDS, REF_COLLECTION, REF_DATABASE, REF_ID};
use crate::document::Document;

/// A reference to a document in another collection (and optionally another
/// database).
///
/// On the wire a reference is an ordinary embedded document shaped
/// `{"$ref": <collection>, "$id": <id>[, "$db": <database>]}`.
/// [`DbRef::to_document`] expands a reference into that shape and
/// [`DbRef::from_document`] folds the shape back; the two are exact inverses.
///
/// # Examples
///
/// ```rust,ignore
/// let reference = DbRef::new("authors", ObjectId::new()).with_database("library");
/// let expanded = reference.to_document();
/// assert_eq!(DbRef::from_document(&expanded), Some(reference));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DbRef {
    collection: String,
    id: Box<Value>,
    database: Option<String>,
}

impl DbRef {
    pub fn new(collection: impl Into<String>, id: impl Into<Value>) -> Self {
        DbRef {
            collection: collection.into(),
            id: Box::new(id.into()),
            database: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Expands the reference into its `$ref`/`$id`/`$db` document shape.
    pub fn to_document(&self) -> Document {
        let mut document = Document::with_capacity(3);
        document.put(REF_COLLECTION, self.collection.clone());
        document.put(REF_ID, (*self.id).clone());
        if let Some(database) = &self.database {
            document.put(REF_DATABASE, database.clone());
        }
        document
    }

    /// Folds a document into a reference.
    ///
    /// Matches only when both `$ref` and `$id` are present, `$ref` (and `$db`
    /// when present) is a string and the document has no other keys. Anything
    /// else stays a plain document so that no field is ever lost.
    pub fn from_document(document: &Document) -> Option<DbRef> {
        if !document.contains_key(REF_COLLECTION) || !document.contains_key(REF_ID) {
            return None;
        }

        if document.keys().any(|key| !REFERENCE_FIELDS.contains(&key.as_str())) {
            log::trace!("Document carries $ref/$id next to other keys, keeping it as a document");
            return None;
        }

        let collection = document.get(REF_COLLECTION)?.as_str()?.to_string();
        let database = match document.get(REF_DATABASE) {
            Some(Value::String(database)) => Some(database.clone()),
            Some(_) => {
                log::trace!("Document carries a non-string $db, keeping it as a document");
                return None;
            }
            None => None,
        };
        let id = document.get(REF_ID)?.clone();

        Some(DbRef {
            collection,
            id: Box::new(id),
            database,
        })
    }
}

impl Display for DbRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}
