// SPDX-License-Identifier: MIT

//! The native primitives the launch pipeline is built on.
//!
//! Every method is a blocking call into the operating system.  Implementations
//! report failures as `LaunchError::Platform` tagged with the matching
//! `Operation`.  Handles returned by `logon_user`, `duplicate_inheritable` and
//! `create_process_as_user` are owned by the caller and must be released with
//! `close_handle` exactly once.

use std::time::Duration;

use crate::runtime::{error::LaunchError, spawn::RawHandle};

/// The startup descriptor handed to process creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupInfo {
    pub stdin: RawHandle,
    pub stdout: RawHandle,
    pub stderr: RawHandle,
    /// The three handles above replace the child's standard streams.
    pub use_std_handles: bool,
    pub hide_window: bool,
}

/// Arguments to the "create process as user" primitive.
#[derive(Debug)]
pub struct CreateProcessRequest<'a> {
    pub token: RawHandle,
    pub application: &'a str,
    /// An empty command line is passed as a null pointer.
    pub command_line: &'a str,
    /// NUL-separated, double-NUL-terminated UTF-16 environment block.
    pub environment: &'a [u16],
    pub current_directory: &'a str,
    pub startup: &'a StartupInfo,
    pub creation_flags: u32,
}

/// What process creation hands back.  Both handles are owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessInformation {
    pub process: RawHandle,
    pub thread: RawHandle,
    pub pid: u32,
}

pub trait Platform {
    /// Resolve `path` to an absolute, normalized path.
    fn full_path(&self, path: &str) -> Result<String, LaunchError>;

    /// Interactive logon with the default provider; returns the token.
    fn logon_user(&self, username: &str, domain: &str, password: &str) -> Result<RawHandle, LaunchError>;

    /// Apply the token's security context to the calling thread.
    fn impersonate(&self, token: RawHandle) -> Result<(), LaunchError>;

    /// Drop any impersonation on the calling thread.
    fn revert_to_self(&self) -> Result<(), LaunchError>;

    /// Duplicate a handle within this process as inheritable, with the same access.
    fn duplicate_inheritable(&self, handle: RawHandle) -> Result<RawHandle, LaunchError>;

    fn close_handle(&self, handle: RawHandle) -> Result<(), LaunchError>;

    /// The root of the token user's profile, e.g. `C:\Users\alice`.
    fn user_profile_directory(&self, token: RawHandle) -> Result<String, LaunchError>;

    /// The token user's default environment, as a double-NUL-terminated UTF-16 block.
    fn create_environment_block(&self, token: RawHandle) -> Result<Vec<u16>, LaunchError>;

    fn create_process_as_user(&self, request: &CreateProcessRequest) -> Result<ProcessInformation, LaunchError>;

    /// Wait for the process to exit.  Returns false if the timeout elapsed first.
    /// `None` waits forever.
    fn wait_for_exit(&self, process: RawHandle, timeout: Option<Duration>) -> Result<bool, LaunchError>;

    /// The exit code, or None if the process is still running.
    fn exit_code(&self, process: RawHandle) -> Result<Option<u32>, LaunchError>;

    fn terminate_process(&self, process: RawHandle, exit_code: u32) -> Result<(), LaunchError>;
}

impl<T: Platform + ?Sized> Platform for &T {
    fn full_path(&self, path: &str) -> Result<String, LaunchError> {
        (**self).full_path(path)
    }

    fn logon_user(&self, username: &str, domain: &str, password: &str) -> Result<RawHandle, LaunchError> {
        (**self).logon_user(username, domain, password)
    }

    fn impersonate(&self, token: RawHandle) -> Result<(), LaunchError> {
        (**self).impersonate(token)
    }

    fn revert_to_self(&self) -> Result<(), LaunchError> {
        (**self).revert_to_self()
    }

    fn duplicate_inheritable(&self, handle: RawHandle) -> Result<RawHandle, LaunchError> {
        (**self).duplicate_inheritable(handle)
    }

    fn close_handle(&self, handle: RawHandle) -> Result<(), LaunchError> {
        (**self).close_handle(handle)
    }

    fn user_profile_directory(&self, token: RawHandle) -> Result<String, LaunchError> {
        (**self).user_profile_directory(token)
    }

    fn create_environment_block(&self, token: RawHandle) -> Result<Vec<u16>, LaunchError> {
        (**self).create_environment_block(token)
    }

    fn create_process_as_user(&self, request: &CreateProcessRequest) -> Result<ProcessInformation, LaunchError> {
        (**self).create_process_as_user(request)
    }

    fn wait_for_exit(&self, process: RawHandle, timeout: Option<Duration>) -> Result<bool, LaunchError> {
        (**self).wait_for_exit(process, timeout)
    }

    fn exit_code(&self, process: RawHandle) -> Result<Option<u32>, LaunchError> {
        (**self).exit_code(process)
    }

    fn terminate_process(&self, process: RawHandle, exit_code: u32) -> Result<(), LaunchError> {
        (**self).terminate_process(process, exit_code)
    }
}
