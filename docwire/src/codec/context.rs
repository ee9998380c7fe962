use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::common::Value;

/// A value transformation applied by the document codec.
///
/// The encoding hook runs on every value just before it is written; the
/// decoding hook runs on every value right after it is read.
pub type ValueHook = Arc<dyn Fn(Value) -> Value + Send + Sync>;

fn apply(hook: &Option<ValueHook>, value: Value) -> Value {
    match hook {
        Some(hook) => hook(value),
        None => value,
    }
}

/// Per-call options for encoding.
///
/// A collectible context makes the encoder write the `_id` field first. The
/// flag applies to the top-level document only; [EncoderContext::child]
/// produces the context used for everything nested, which is never
/// collectible but keeps the hook.
#[derive(Clone, Default)]
pub struct EncoderContext {
    collectible: bool,
    encoding_hook: Option<ValueHook>,
}

impl EncoderContext {
    pub fn new() -> Self {
        EncoderContext::default()
    }

    pub fn collectible() -> Self {
        EncoderContext {
            collectible: true,
            encoding_hook: None,
        }
    }

    pub fn with_encoding_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.encoding_hook = Some(Arc::new(hook));
        self
    }

    pub fn is_collectible(&self) -> bool {
        self.collectible
    }

    pub fn child(&self) -> EncoderContext {
        EncoderContext {
            collectible: false,
            encoding_hook: self.encoding_hook.clone(),
        }
    }

    pub fn apply_encoding_hook(&self, value: Value) -> Value {
        apply(&self.encoding_hook, value)
    }

    pub(crate) fn encoding_hook(&self) -> Option<&ValueHook> {
        self.encoding_hook.as_ref()
    }
}

impl Debug for EncoderContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderContext")
            .field("collectible", &self.collectible)
            .field("encoding_hook", &self.encoding_hook.is_some())
            .finish()
    }
}

/// Per-call options for decoding.
#[derive(Clone, Default)]
pub struct DecoderContext {
    decoding_hook: Option<ValueHook>,
}

impl DecoderContext {
    pub fn new() -> Self {
        DecoderContext::default()
    }

    pub fn with_decoding_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.decoding_hook = Some(Arc::new(hook));
        self
    }

    pub fn apply_decoding_hook(&self, value: Value) -> Value {
        apply(&self.decoding_hook, value)
    }
}

impl Debug for DecoderContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderContext")
            .field("decoding_hook", &self.decoding_hook.is_some())
            .finish()
    }
}
