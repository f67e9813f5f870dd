// SPDX-License-Identifier: MIT

//! Launches a native process as another, logged-on user.
//!
//! The `ProcessLauncher` runs one launch as a straight pipeline on the
//! calling thread: resolve the executable against the working directory,
//! quote the command line, duplicate the standard handles under the
//! process-wide inheritance lock, log the user on, find the user's profile
//! directory and environment, impersonate, create the process, and release
//! everything.  Either a `LaunchedProcess` comes back, or nothing was created
//! and nothing is left open.
//!
//! All native calls go through the `Platform` trait.  `WindowsPlatform` is the
//! real one; `launch_as_user` is the shortcut that uses it.

pub mod error;
pub mod fd;
pub mod inherit_lock;
pub mod launch;
pub mod launch_quote;
pub mod monitor;
pub mod path;
pub mod platform;
pub mod session;
pub mod spawn;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{LaunchError, Operation};
pub use inherit_lock::{InheritanceGuard, lock_handle_inheritance};
pub use launch::ProcessLauncher;
pub use monitor::LaunchedProcess;
pub use platform::Platform;
pub use session::{Impersonation, ImpersonationSession};
pub use spawn::{Credentials, LaunchRequest, ProcessAttributes, RawHandle};

#[cfg(target_os = "windows")]
mod spawn_windows;

#[cfg(target_os = "windows")]
pub use spawn_windows::{StdHandles, WindowsPlatform};

/// Launch `exe` with `args` as `domain\username`.
///
/// Blocks until the process is created.  The returned process owns its handle.
#[cfg(target_os = "windows")]
pub fn launch_as_user(
    exe: &str,
    args: &[String],
    username: &str,
    domain: &str,
    password: String,
    attributes: ProcessAttributes,
) -> Result<LaunchedProcess<WindowsPlatform>, LaunchError> {
    ProcessLauncher::new(WindowsPlatform).launch(LaunchRequest {
        exe: exe.to_string(),
        args: args.to_vec(),
        credentials: Credentials::new(username, domain, password),
        attributes,
    })
}
