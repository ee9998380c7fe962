//! Configuration of a [DocumentCodec](crate::codec::DocumentCodec).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::codec::{
    BsonTypeClassMap, Codec, CodecProvider, CodecRegistry, DefaultDocumentFactory, DocumentFactory,
    SharedDocumentFactory, UuidRepresentation,
};
use crate::common::{ReadExecutor, ValueType, WriteExecutor};
use crate::document::{IdGenerator, ObjectIdGenerator};
use crate::errors::{DocwireError, DocwireResult, ErrorKind};
use crate::wire::BsonType;
use crate::{atomic, Atomic};

/// Settings a [DocumentCodec](crate::codec::DocumentCodec) is built from.
///
/// Every setting can be changed until the configuration is initialized,
/// which happens when a codec is created from it. After that the setters
/// fail with [ErrorKind::InvalidOperation].
///
/// When no registry is set, the built-in leaf codecs are used with the
/// configured UUID representation. Codecs added with
/// [CodecConfig::register] go into whichever registry ends up in use.
///
/// # Examples
///
/// ```rust,ignore
/// let config = CodecConfig::new();
/// config.set_uuid_representation(UuidRepresentation::Legacy)?;
/// let codec = DocumentCodec::new(config);
/// ```
#[derive(Clone)]
pub struct CodecConfig {
    inner: Arc<CodecConfigInner>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        CodecConfig {
            inner: Arc::new(CodecConfigInner::new()),
        }
    }

    pub fn uuid_representation(&self) -> UuidRepresentation {
        self.inner.uuid_representation()
    }

    /// Sets how UUIDs are laid out by the built-in registry.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn set_uuid_representation(&self, representation: UuidRepresentation) -> DocwireResult<()> {
        self.inner.set_uuid_representation(representation)
    }

    /// Replaces the built-in leaf codecs with the given registry.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn set_registry(&self, registry: CodecRegistry) -> DocwireResult<()> {
        self.inner.set_registry(registry)
    }

    /// Adds a leaf codec, replacing any codec for the same value type.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn register<T: CodecProvider + 'static>(&self, provider: T) -> DocwireResult<()> {
        self.inner.register(Codec::new(provider))
    }

    /// Maps a wire type tag to a different value type on decode.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn add_type_override(&self, bson_type: BsonType, value_type: ValueType) -> DocwireResult<()> {
        self.inner.add_type_override(bson_type, value_type)
    }

    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn set_document_factory<F: DocumentFactory + 'static>(&self, factory: F) -> DocwireResult<()> {
        self.inner.set_document_factory(Arc::new(factory))
    }

    /// # Errors
    ///
    /// Returns error if already initialized.
    pub fn set_id_generator<G: IdGenerator + 'static>(&self, generator: G) -> DocwireResult<()> {
        self.inner.set_id_generator(Arc::new(generator))
    }

    /// The leaf registry in use. Resolving it freezes the registry choice.
    pub fn registry(&self) -> CodecRegistry {
        self.inner.registry()
    }

    /// The type table in use. Resolving it freezes the overrides.
    pub fn type_map(&self) -> BsonTypeClassMap {
        self.inner.type_map()
    }

    pub fn document_factory(&self) -> SharedDocumentFactory {
        self.inner.document_factory()
    }

    pub fn id_generator(&self) -> Arc<dyn IdGenerator> {
        self.inner.id_generator()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    /// Freezes the configuration.
    pub(crate) fn initialize(&self) {
        self.inner.initialize()
    }
}

struct CodecConfigInner {
    configured: AtomicBool,
    uuid_representation: Atomic<UuidRepresentation>,
    registry: Atomic<Option<CodecRegistry>>,
    extra_codecs: Atomic<Vec<Codec>>,
    type_overrides: Atomic<Vec<(BsonType, ValueType)>>,
    document_factory: Atomic<SharedDocumentFactory>,
    id_generator: Atomic<Arc<dyn IdGenerator>>,
    resolved_registry: OnceLock<CodecRegistry>,
    resolved_type_map: OnceLock<BsonTypeClassMap>,
}

impl CodecConfigInner {
    fn new() -> Self {
        let id_generator: Arc<dyn IdGenerator> = Arc::new(ObjectIdGenerator);
        CodecConfigInner {
            configured: AtomicBool::from(false),
            uuid_representation: atomic(UuidRepresentation::default()),
            registry: atomic(None),
            extra_codecs: atomic(Vec::new()),
            type_overrides: atomic(Vec::new()),
            document_factory: atomic(Arc::new(DefaultDocumentFactory)),
            id_generator: atomic(id_generator),
            resolved_registry: OnceLock::new(),
            resolved_type_map: OnceLock::new(),
        }
    }

    fn ensure_not_configured(&self, setting: &str) -> DocwireResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after initialization", setting);
            return Err(DocwireError::new(
                &format!("{} cannot be changed after initialization", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn uuid_representation(&self) -> UuidRepresentation {
        self.uuid_representation.read_with(|it| *it)
    }

    fn set_uuid_representation(&self, representation: UuidRepresentation) -> DocwireResult<()> {
        self.ensure_not_configured("UUID representation")?;
        self.uuid_representation.write_with(|it| *it = representation);
        Ok(())
    }

    fn set_registry(&self, registry: CodecRegistry) -> DocwireResult<()> {
        self.ensure_not_configured("Codec registry")?;
        self.registry.write_with(|it| *it = Some(registry));
        Ok(())
    }

    fn register(&self, codec: Codec) -> DocwireResult<()> {
        self.ensure_not_configured("Codec registry")?;
        self.extra_codecs.write_with(|it| it.push(codec));
        Ok(())
    }

    fn add_type_override(&self, bson_type: BsonType, value_type: ValueType) -> DocwireResult<()> {
        self.ensure_not_configured("Type map")?;
        self.type_overrides.write_with(|it| it.push((bson_type, value_type)));
        Ok(())
    }

    fn set_document_factory(&self, factory: SharedDocumentFactory) -> DocwireResult<()> {
        self.ensure_not_configured("Document factory")?;
        self.document_factory.write_with(|it| *it = factory);
        Ok(())
    }

    fn set_id_generator(&self, generator: Arc<dyn IdGenerator>) -> DocwireResult<()> {
        self.ensure_not_configured("Identifier generator")?;
        self.id_generator.write_with(|it| *it = generator);
        Ok(())
    }

    fn registry(&self) -> CodecRegistry {
        self.resolved_registry
            .get_or_init(|| {
                let registry = self
                    .registry
                    .read_with(|it| it.clone())
                    .unwrap_or_else(|| CodecRegistry::with_defaults(self.uuid_representation()));
                self.extra_codecs.read_with(|codecs| {
                    for codec in codecs {
                        registry.register_codec(codec.clone());
                    }
                });
                registry
            })
            .clone()
    }

    fn type_map(&self) -> BsonTypeClassMap {
        self.resolved_type_map
            .get_or_init(|| {
                self.type_overrides
                    .read_with(|it| BsonTypeClassMap::with_overrides(it.iter().cloned()))
            })
            .clone()
    }

    fn document_factory(&self) -> SharedDocumentFactory {
        self.document_factory.read_with(|it| it.clone())
    }

    fn id_generator(&self) -> Arc<dyn IdGenerator> {
        self.id_generator.read_with(|it| it.clone())
    }

    fn initialize(&self) {
        self.configured.store(true, Ordering::Relaxed);
        // resolve now so later reads agree with what the codec captured
        self.registry();
        self.type_map();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FieldPath, Int32Codec};
    use crate::document::{Document, ObjectId};

    struct Fixed;

    impl IdGenerator for Fixed {
        fn generate(&self) -> ObjectId {
            ObjectId::from_bytes([1; 12])
        }
    }

    #[test]
    fn test_arc_sharing() {
        let config1 = CodecConfig::new();
        let config2 = config1.clone();
        assert!(Arc::ptr_eq(&config1.inner, &config2.inner));
    }

    #[test]
    fn test_defaults() {
        let config = CodecConfig::new();
        assert_eq!(config.uuid_representation(), UuidRepresentation::Standard);
        assert_eq!(config.registry().len(), 18);
        assert_eq!(config.type_map().len(), 19);
        assert!(!config.is_initialized());
    }

    #[test]
    fn test_uuid_representation_reaches_default_registry() {
        let config = CodecConfig::new();
        config.set_uuid_representation(UuidRepresentation::Legacy).unwrap();
        let registry = config.registry();
        assert!(registry.contains(&ValueType::Uuid));
        assert_eq!(config.uuid_representation(), UuidRepresentation::Legacy);
    }

    #[test]
    fn test_registered_codecs_join_explicit_registry() {
        let config = CodecConfig::new();
        config.set_registry(CodecRegistry::empty()).unwrap();
        config.register(Int32Codec).unwrap();
        let registry = config.registry();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&ValueType::Int32));
    }

    #[test]
    fn test_type_override() {
        let config = CodecConfig::new();
        config
            .add_type_override(BsonType::Symbol, ValueType::custom("symbol"))
            .unwrap();
        assert_eq!(
            config.type_map().get(BsonType::Symbol).unwrap(),
            &ValueType::custom("symbol")
        );
    }

    #[test]
    fn test_custom_factory_and_generator() {
        let config = CodecConfig::new();
        config
            .set_document_factory(|_: &FieldPath<'_>| Document::with_capacity(4))
            .unwrap();
        config.set_id_generator(Fixed).unwrap();
        assert_eq!(config.id_generator().generate(), ObjectId::from_bytes([1; 12]));
        assert!(config
            .document_factory()
            .new_document(&FieldPath::root())
            .is_empty());
    }

    #[test]
    fn test_setters_fail_after_initialization() {
        let config = CodecConfig::new();
        config.initialize();
        assert!(config.is_initialized());

        let err = config
            .set_uuid_representation(UuidRepresentation::Legacy)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert!(config.set_registry(CodecRegistry::empty()).is_err());
        assert!(config.register(Int32Codec).is_err());
        assert!(config
            .add_type_override(BsonType::Symbol, ValueType::String)
            .is_err());
        assert!(config.set_id_generator(Fixed).is_err());
        assert!(config.set_document_factory(DefaultDocumentFactory).is_err());
    }

    #[test]
    fn test_resolution_is_stable() {
        let config = CodecConfig::new();
        let first = config.registry();
        first.register(Int32Codec);
        config.initialize();
        assert_eq!(config.registry().len(), first.len());
    }
}
