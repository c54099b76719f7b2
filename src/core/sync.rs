//! Lock poisoning helpers
//!
//! A lock is poisoned when a thread panics while holding it. The queue, the
//! source registry and the output sink all map that condition into their own
//! error types through these helpers instead of unwrapping.

use std::sync::{LockResult, RwLockReadGuard, RwLockWriteGuard};

/// Convert a poisoned lock (or condition wait) result into an application error
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use msgbroker::core::sync::handle_mutex_poison;
/// use msgbroker::queue::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(mutex.lock(), |message| QueueError::Poisoned { message })
///     .unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "mutex poisoned by a panicking holder ({:?})",
            poison_err
        ))
    })
}

/// Read-side variant for `RwLock`
pub fn handle_rwlock_read<T, E>(
    result: LockResult<RwLockReadGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "rwlock poisoned by a panicking writer ({:?})",
            poison_err
        ))
    })
}

/// Write-side variant for `RwLock`
pub fn handle_rwlock_write<T, E>(
    result: LockResult<RwLockWriteGuard<T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<T>, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "rwlock poisoned by a panicking holder ({:?})",
            poison_err
        ))
    })
}
