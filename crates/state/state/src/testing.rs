//! Conformance suite shared by every `StorageBackend` implementation.
//!
//! Call [`run_backend_conformance_tests`] from a backend crate's own test
//! module with a fresh, empty instance pre-populated with a `"default"`
//! group of 1 slot and a `"multi"` group of 3 slots.

use fleetlock_core::StorageError;

use crate::backend::StorageBackend;

/// Run the full storage backend conformance test suite.
///
/// Expects the backend to have been constructed with (at least) a
/// `"default"` group (1 slot) and a `"multi"` group (3 slots) already
/// declared, and to be otherwise empty.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_backend_conformance_tests(
    backend: &dyn StorageBackend,
) -> Result<(), StorageError> {
    test_reserve_and_has_lock(backend).await?;
    test_reserve_is_idempotent(backend).await?;
    test_release_is_idempotent(backend).await?;
    test_get_locks_reflects_reservations(backend).await?;
    test_multi_group_independent(backend).await?;
    Ok(())
}

async fn test_reserve_and_has_lock(backend: &dyn StorageBackend) -> Result<(), StorageError> {
    assert!(!backend.has_lock("default", "u1").await?);
    backend.reserve("default", "u1").await?;
    assert!(backend.has_lock("default", "u1").await?);
    backend.release("default", "u1").await?;
    assert!(!backend.has_lock("default", "u1").await?);
    Ok(())
}

async fn test_reserve_is_idempotent(backend: &dyn StorageBackend) -> Result<(), StorageError> {
    backend.reserve("default", "idem").await?;
    backend.reserve("default", "idem").await?;
    let count = backend.get_locks("default").await?;
    assert_eq!(count, 1, "reserving the same id twice must not duplicate");
    backend.release("default", "idem").await?;
    Ok(())
}

async fn test_release_is_idempotent(backend: &dyn StorageBackend) -> Result<(), StorageError> {
    // Releasing an id that never held a lock must not error or disturb state.
    let before = backend.get_locks("multi").await?;
    backend.release("multi", "never-reserved").await?;
    let after = backend.get_locks("multi").await?;
    assert_eq!(before, after);
    Ok(())
}

async fn test_get_locks_reflects_reservations(
    backend: &dyn StorageBackend,
) -> Result<(), StorageError> {
    backend.reserve("multi", "a").await?;
    backend.reserve("multi", "b").await?;
    assert_eq!(backend.get_locks("multi").await?, 2);
    backend.release("multi", "a").await?;
    assert_eq!(backend.get_locks("multi").await?, 1);
    backend.release("multi", "b").await?;
    assert_eq!(backend.get_locks("multi").await?, 0);
    Ok(())
}

async fn test_multi_group_independent(backend: &dyn StorageBackend) -> Result<(), StorageError> {
    backend.reserve("default", "shared-id").await?;
    backend.reserve("multi", "shared-id").await?;
    assert!(backend.has_lock("default", "shared-id").await?);
    assert!(backend.has_lock("multi", "shared-id").await?);
    backend.release("default", "shared-id").await?;
    assert!(!backend.has_lock("default", "shared-id").await?);
    assert!(
        backend.has_lock("multi", "shared-id").await?,
        "releasing in one group must not affect another"
    );
    backend.release("multi", "shared-id").await?;
    Ok(())
}
