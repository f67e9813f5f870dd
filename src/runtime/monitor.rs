// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::runtime::{error::LaunchError, platform::Platform, spawn::RawHandle};

/// A process started as another user.
///
/// Owns the process handle.  Dropping it closes the handle but leaves the
/// process running; a published application outlives whoever launched it.
pub struct LaunchedProcess<P: Platform> {
    platform: P,
    pid: u32,
    handle: Option<RawHandle>,
}

impl<P: Platform> LaunchedProcess<P> {
    pub(crate) fn new(platform: P, pid: u32, handle: RawHandle) -> Self {
        LaunchedProcess {
            platform,
            pid,
            handle: Some(handle),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn handle(&self) -> RawHandle {
        self.handle.unwrap_or_default()
    }

    /// Give up ownership of the process handle.  The caller must close it.
    pub fn into_raw(mut self) -> RawHandle {
        self.handle.take().unwrap_or_default()
    }

    /// Get the exit code for the process, or None if it hasn't exited yet.
    pub fn exit_code(&self) -> Result<Option<u32>, LaunchError> {
        self.platform.exit_code(self.handle())
    }

    /// Wait for the process to exit, up to `timeout` (forever if None).
    /// Returns the exit code, or None if the process is still running.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<Option<u32>, LaunchError> {
        if self.platform.wait_for_exit(self.handle(), timeout)? {
            self.exit_code()
        } else {
            Ok(None)
        }
    }

    /// Request a hard termination of the process.
    pub fn terminate(&self, exit_code: u32) -> Result<(), LaunchError> {
        self.platform.terminate_process(self.handle(), exit_code)
    }
}

impl<P: Platform> std::fmt::Debug for LaunchedProcess<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchedProcess")
            .field("pid", &self.pid)
            .field("handle", &self.handle)
            .finish()
    }
}

impl<P: Platform> Drop for LaunchedProcess<P> {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            if let Err(e) = self.platform.close_handle(h) {
                log::warn!("could not close handle for process {}: {}", self.pid, e);
            }
        }
    }
}
