use crate::codec::{CodecProvider, CodecRegistry, DocumentCodec, DocumentFactory, UuidRepresentation};
use crate::codec_config::CodecConfig;
use crate::common::ValueType;
use crate::document::IdGenerator;
use crate::errors::{DocwireError, DocwireResult};
use crate::wire::BsonType;

/// Builder for a [DocumentCodec].
///
/// The first configuration error is kept and returned from
/// [DocumentCodecBuilder::build]; setters called after it are ignored.
///
/// # Examples
///
/// ```rust,ignore
/// let codec = DocumentCodec::builder()
///     .uuid_representation(UuidRepresentation::Legacy)
///     .register(MoneyCodec)
///     .type_override(BsonType::Symbol, ValueType::custom("symbol"))
///     .build()?;
/// ```
#[derive(Default)]
pub struct DocumentCodecBuilder {
    error: Option<DocwireError>,
    config: CodecConfig,
}

impl DocumentCodecBuilder {
    pub fn new() -> Self {
        DocumentCodecBuilder {
            error: None,
            config: CodecConfig::new(),
        }
    }

    fn apply(mut self, setting: impl FnOnce(&CodecConfig) -> DocwireResult<()>) -> Self {
        if self.error.is_none() {
            if let Err(e) = setting(&self.config) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets how UUIDs are written by the built-in leaf codecs.
    pub fn uuid_representation(self, representation: UuidRepresentation) -> Self {
        self.apply(|config| config.set_uuid_representation(representation))
    }

    /// Uses the given registry instead of the built-in leaf codecs.
    pub fn registry(self, registry: CodecRegistry) -> Self {
        self.apply(|config| config.set_registry(registry))
    }

    /// Adds a leaf codec on top of the registry in use.
    pub fn register<T: CodecProvider + 'static>(self, provider: T) -> Self {
        self.apply(|config| config.register(provider))
    }

    /// Decodes the wire type as the given value type.
    pub fn type_override(self, bson_type: BsonType, value_type: ValueType) -> Self {
        self.apply(|config| config.add_type_override(bson_type, value_type))
    }

    pub fn document_factory<F: DocumentFactory + 'static>(self, factory: F) -> Self {
        self.apply(|config| config.set_document_factory(factory))
    }

    pub fn id_generator<G: IdGenerator + 'static>(self, generator: G) -> Self {
        self.apply(|config| config.set_id_generator(generator))
    }

    /// Builds the codec, or returns the first error any setter ran into.
    pub fn build(self) -> DocwireResult<DocumentCodec> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(DocumentCodec::new(self.config))
    }
}
