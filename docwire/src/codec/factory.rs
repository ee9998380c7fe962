use std::sync::Arc;

use crate::codec::FieldPath;
use crate::document::Document;

/// Creates the empty documents the decoder fills.
///
/// The decoder asks the factory for every document it materializes, the root
/// and each embedded one, passing the path at which the document sits. A
/// factory can use the path to pre-size documents or to hand out
/// differently configured instances per location.
///
/// Any `Fn(&FieldPath) -> Document + Send + Sync` closure is a factory.
pub trait DocumentFactory: Send + Sync {
    fn new_document(&self, path: &FieldPath<'_>) -> Document;
}

/// Factory returning a plain empty [Document] for every path.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDocumentFactory;

impl DocumentFactory for DefaultDocumentFactory {
    fn new_document(&self, _path: &FieldPath<'_>) -> Document {
        Document::new()
    }
}

impl<F> DocumentFactory for F
where
    F: Fn(&FieldPath<'_>) -> Document + Send + Sync,
{
    fn new_document(&self, path: &FieldPath<'_>) -> Document {
        self(path)
    }
}

pub type SharedDocumentFactory = Arc<dyn DocumentFactory>;
