// SPDX-License-Identifier: MIT

//! Common error type.
//!

use std::fmt::Display;

/// The native operation that failed, reported with every platform error so that
/// bad credentials, a missing directory, and a process limit can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PathNormalize,
    Logon,
    Impersonate,
    RevertToSelf,
    DuplicateHandle,
    CloseHandle,
    UserProfileDirectory,
    CreateEnvironmentBlock,
    CreateProcess,
    Wait,
    ExitCode,
    Terminate,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PathNormalize => "path-normalize",
            Self::Logon => "logon",
            Self::Impersonate => "impersonate",
            Self::RevertToSelf => "revert-to-self",
            Self::DuplicateHandle => "duplicate-handle",
            Self::CloseHandle => "close-handle",
            Self::UserProfileDirectory => "user-profile-directory",
            Self::CreateEnvironmentBlock => "create-environment-block",
            Self::CreateProcess => "create-process",
            Self::Wait => "wait",
            Self::ExitCode => "exit-code",
            Self::Terminate => "terminate",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Caller bug: malformed executable reference, wrong handle count, bad path form.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A native primitive failed.  `code` is the Win32 error code when the
    /// failure carries one, otherwise the raw HRESULT bits.
    #[error("{operation} failed: os error {code}")]
    Platform { operation: Operation, code: u32 },
}

impl LaunchError {
    pub fn invalid(reason: &str) -> Self {
        LaunchError::InvalidArgument(reason.to_string())
    }

    pub fn platform(operation: Operation, code: u32) -> Self {
        LaunchError::Platform { operation, code }
    }

    /// The failing native operation, if this is a platform error.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::InvalidArgument(_) => None,
            Self::Platform { operation, .. } => Some(*operation),
        }
    }
}

impl From<LaunchError> for std::io::Error {
    fn from(e: LaunchError) -> Self {
        match e {
            LaunchError::InvalidArgument(_) => std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            LaunchError::Platform { operation, code } => match operation {
                Operation::Logon | Operation::Impersonate => {
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, e)
                }
                Operation::PathNormalize | Operation::UserProfileDirectory => {
                    std::io::Error::new(std::io::ErrorKind::NotFound, e)
                }
                _ => match i32::try_from(code) {
                    Ok(raw) => std::io::Error::from_raw_os_error(raw),
                    Err(_) => std::io::Error::other(e),
                },
            },
        }
    }
}
