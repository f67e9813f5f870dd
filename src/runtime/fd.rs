// SPDX-License-Identifier: MIT

//! Hand the caller's standard I/O handles to the child.
//!
//! The caller's handles are not inheritable, and must not be made so: another
//! launch could be racing with this one.  Instead each one is duplicated as an
//! inheritable handle, which the child picks up at creation.  The duplicates
//! are closed once the creation call returns, since the child holds its own
//! copies by then.

use crate::runtime::{
    error::LaunchError,
    inherit_lock::InheritanceGuard,
    platform::{Platform, StartupInfo},
    spawn::{RawHandle, STD_HANDLE_COUNT},
};

/// Inheritable duplicates of stdin, stdout and stderr.
///
/// A null entry means that stream is not redirected.  Every non-null entry is
/// closed exactly once, by `close` or on drop.
pub struct DuplicatedHandles<P: Platform> {
    platform: P,
    handles: [RawHandle; STD_HANDLE_COUNT],
}

impl<P: Platform> DuplicatedHandles<P> {
    /// Duplicate the three standard handles.
    ///
    /// Requires the inheritance lock: the duplicates are inheritable, so they
    /// must not exist while some other child is being created.  If any
    /// duplication fails, the ones made so far are closed before returning.
    pub fn duplicate(
        platform: P,
        io: &[RawHandle],
        _lock: &InheritanceGuard,
    ) -> Result<Self, LaunchError> {
        if io.len() != STD_HANDLE_COUNT {
            return Err(LaunchError::InvalidArgument(format!(
                "expected {} standard handles, found {}",
                STD_HANDLE_COUNT,
                io.len()
            )));
        }
        let mut ret = DuplicatedHandles {
            platform,
            handles: [RawHandle::NULL; STD_HANDLE_COUNT],
        };
        for (i, h) in io.iter().enumerate() {
            if h.is_null() {
                continue;
            }
            // On error, dropping `ret` closes the earlier duplicates.
            ret.handles[i] = ret.platform.duplicate_inheritable(*h)?;
        }
        log::debug!("duplicated standard handles {:?} -> {:?}", io, ret.handles);
        Ok(ret)
    }

    pub fn stdin(&self) -> RawHandle {
        self.handles[0]
    }

    pub fn stdout(&self) -> RawHandle {
        self.handles[1]
    }

    pub fn stderr(&self) -> RawHandle {
        self.handles[2]
    }

    /// The startup descriptor that redirects the child's streams to these handles.
    pub fn startup_info(&self, hide_window: bool) -> StartupInfo {
        StartupInfo {
            stdin: self.stdin(),
            stdout: self.stdout(),
            stderr: self.stderr(),
            use_std_handles: true,
            hide_window,
        }
    }

    /// Close every duplicate.  All are attempted; the first failure is returned.
    pub fn close(mut self) -> Result<(), LaunchError> {
        self.close_all()
    }

    fn close_all(&mut self) -> Result<(), LaunchError> {
        let mut ret = Ok(());
        for h in self.handles.iter_mut() {
            if h.is_null() {
                continue;
            }
            let handle = std::mem::take(h);
            if let Err(e) = self.platform.close_handle(handle) {
                if ret.is_ok() {
                    ret = Err(e);
                }
            }
        }
        ret
    }
}

impl<P: Platform> Drop for DuplicatedHandles<P> {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            log::warn!("could not close duplicated standard handle: {}", e);
        }
    }
}
