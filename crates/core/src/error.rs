use thiserror::Error;

/// Errors raised while validating or mutating lock state.
///
/// These are the "kinds" the Lock Manager and HTTP layer reason about; they
/// are intentionally thin wrappers carrying just enough context to render a
/// `{kind,value}` wire response without leaking backend internals.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Received empty id, can't reserve a slot without an id")]
    EmptyId,

    #[error("Unsupported storage type \"{0}\" selected")]
    UnknownStorageType(String),

    #[error("At least one group has not enough slots, need at least 1")]
    GroupSlotsOutOfRange,

    #[error("backend error: {0}")]
    Backend(#[from] crate::StorageError),
}

/// Errors surfaced by a [`crate::storage::StorageBackend`] implementation.
///
/// Kept separate from [`LockError`] so storage crates don't need to depend
/// on the Lock Manager's validation vocabulary, only on this narrower
/// backend-facing taxonomy.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend operation failed: {0}")]
    Backend(String),

    #[error("operation not implemented by this backend")]
    NotImplemented,
}
