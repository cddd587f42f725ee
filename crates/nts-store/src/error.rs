use crate::value::TypeTag;

/// Errors from storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The value's type differs from the type fixed by the store's entries.
    /// The store is left unchanged.
    #[error("mismatched value type: store holds {expected}, got {found}")]
    TypeMismatch { expected: TypeTag, found: TypeTag },

    /// The identifier counter reached `i64::MAX`; no further entries can be
    /// added until the store is cleared.
    #[error("identifier space exhausted")]
    IdsExhausted,

    /// A backend name that does not name any storage backend.
    #[error("unknown storage backend: {0:?} (expected \"hashed\" or \"linked\")")]
    UnknownBackend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
