use crate::document::ObjectId;

/// Source of fresh document identifiers.
///
/// Implementations must be safe to call from many threads at once and must
/// never hand out the same id twice.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> ObjectId;
}

/// Generates [ObjectId]s: creation second, a random per-process value and a
/// counter that advances atomically.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectIdGenerator;

impl IdGenerator for ObjectIdGenerator {
    fn generate(&self) -> ObjectId {
        ObjectId::new()
    }
}
