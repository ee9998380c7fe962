use dashmap::DashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::codec::{default_codecs, Codec, CodecProvider, UuidRepresentation};
use crate::common::ValueType;
use crate::errors::{DocwireError, DocwireResult, ErrorKind};

/// Registry of leaf codecs keyed by [ValueType].
///
/// Cloning is cheap and clones share the same map. Registration replaces any
/// codec previously registered for the same type.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = CodecRegistry::with_defaults(UuidRepresentation::Standard);
/// registry.register(MoneyCodec);
/// let codec = registry.get(&ValueType::custom("money"))?;
/// ```
#[derive(Clone)]
pub struct CodecRegistry {
    inner: Arc<CodecRegistryInner>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        CodecRegistry::with_defaults(UuidRepresentation::default())
    }
}

impl CodecRegistry {
    /// Creates a registry with no codecs.
    pub fn empty() -> Self {
        CodecRegistry {
            inner: Arc::new(CodecRegistryInner {
                codecs: DashMap::new(),
            }),
        }
    }

    /// Creates a registry holding every built-in leaf codec.
    pub fn with_defaults(uuid_representation: UuidRepresentation) -> Self {
        let registry = CodecRegistry::empty();
        for codec in default_codecs(uuid_representation) {
            registry.register_codec(codec);
        }
        registry
    }

    pub fn register<T: CodecProvider + 'static>(&self, provider: T) {
        self.register_codec(Codec::new(provider));
    }

    pub fn register_codec(&self, codec: Codec) {
        let value_type = codec.value_type();
        log::debug!("Registering leaf codec for {}", value_type);
        self.inner.codecs.insert(value_type, codec);
    }

    /// Returns the codec for the value type.
    ///
    /// # Errors
    ///
    /// [ErrorKind::CodecConfigurationError] when no codec is registered.
    pub fn get(&self, value_type: &ValueType) -> DocwireResult<Codec> {
        match self.inner.codecs.get(value_type) {
            Some(codec) => Ok(codec.value().clone()),
            None => {
                log::error!("No codec registered for {}", value_type);
                Err(DocwireError::new(
                    &format!("No codec registered for {}", value_type),
                    ErrorKind::CodecConfigurationError,
                ))
            }
        }
    }

    pub fn contains(&self, value_type: &ValueType) -> bool {
        self.inner.codecs.contains_key(value_type)
    }

    pub fn remove(&self, value_type: &ValueType) -> Option<Codec> {
        self.inner.codecs.remove(value_type).map(|(_, codec)| codec)
    }

    pub fn len(&self) -> usize {
        self.inner.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.codecs.is_empty()
    }
}

impl Debug for CodecRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<String> = self
            .inner
            .codecs
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        types.sort();
        f.debug_struct("CodecRegistry").field("types", &types).finish()
    }
}

struct CodecRegistryInner {
    codecs: DashMap<ValueType, Codec>,
}
