// SPDX-License-Identifier: MIT

//! The process-wide handle inheritance lock.
//!
//! Process creation with handle inheritance turned on copies *every*
//! inheritable handle of this process into the child.  Between duplicating
//! the child's standard handles and the creation call, no other thread may
//! create an inheritable handle, or that handle leaks into an unrelated
//! child.  The launcher holds this lock across that window.
//!
//! This is a contract for the whole process: any code that creates an
//! inheritable handle (pipes for a child, `DuplicateHandle` with inherit,
//! `SECURITY_ATTRIBUTES` with `bInheritHandle`) must hold the lock while it
//! does so.  The lock lives for the life of the process.

use std::sync::{Mutex, MutexGuard};

static INHERITABLE_HANDLE_LOCK: Mutex<()> = Mutex::new(());

/// Held while inheritable handles may exist that are destined for one specific child.
pub struct InheritanceGuard {
    _guard: MutexGuard<'static, ()>,
}

/// Block until no other thread is creating inheritable handles.
pub fn lock_handle_inheritance() -> InheritanceGuard {
    // The lock guards no data, so a panic while it was held leaves nothing
    // inconsistent behind.
    let guard = INHERITABLE_HANDLE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    InheritanceGuard { _guard: guard }
}

#[cfg(test)]
pub(crate) fn is_locked() -> bool {
    matches!(
        INHERITABLE_HANDLE_LOCK.try_lock(),
        Err(std::sync::TryLockError::WouldBlock)
    )
}
