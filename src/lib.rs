//! # plazaspawn
//!
//! The library that starts published applications inside a specific user's session.

pub mod runtime;

pub use runtime::{
    Credentials, LaunchError, LaunchRequest, LaunchedProcess, Operation, Platform, ProcessAttributes,
    ProcessLauncher, RawHandle, lock_handle_inheritance,
};

#[cfg(target_os = "windows")]
pub use runtime::{StdHandles, WindowsPlatform, launch_as_user};
