// SPDX-License-Identifier: MIT

//! General model for launching a process as another user.

use std::collections::BTreeMap;

/// A platform handle value, as passed across the native boundary.
///
/// The null value means "no redirection" when used as a standard I/O handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawHandle(pub usize);

impl RawHandle {
    pub const NULL: RawHandle = RawHandle(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Always set on process creation, because the environment block is UTF-16.
pub const CREATE_UNICODE_ENVIRONMENT: u32 = 0x0000_0400;

/// Number of standard I/O handles: stdin, stdout, stderr.
pub const STD_HANDLE_COUNT: usize = 3;

/// User credentials, used exactly once to obtain a logon token.
///
/// The password bytes are overwritten with zeros when the value is dropped.
pub struct Credentials {
    pub username: String,
    pub domain: String,
    password: String,
}

impl Credentials {
    pub fn new(username: &str, domain: &str, password: String) -> Self {
        Credentials {
            username: username.to_string(),
            domain: domain.to_string(),
            password,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("domain", &self.domain)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        // SAFETY: zeros are valid UTF-8, and the string is never read again.
        wipe(unsafe { self.password.as_bytes_mut() });
    }
}

/// Overwrite a buffer holding secret material so the write is not elided.
pub(crate) fn wipe<T: Copy + Default>(buf: &mut [T]) {
    for v in buf.iter_mut() {
        // SAFETY: `v` is a valid, aligned, exclusive reference.
        unsafe { std::ptr::write_volatile(v, T::default()) };
    }
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
}

/// Describes how the child process is set up.
#[derive(Debug, Clone)]
pub struct ProcessAttributes {
    /// Working directory.  When absent, the user's profile directory is used.
    pub dir: Option<String>,
    /// Explicit environment.  When absent, the user's profile environment is used.
    pub env: Option<BTreeMap<String, String>>,
    /// stdin, stdout, stderr, in that order.  Must be exactly three.
    pub io_handles: Vec<RawHandle>,
    /// Literal command line, used verbatim instead of quoting the arguments.
    pub command_line: Option<String>,
    pub creation_flags: u32,
    pub hide_window: bool,
}

impl Default for ProcessAttributes {
    fn default() -> Self {
        ProcessAttributes {
            dir: None,
            env: None,
            io_handles: vec![RawHandle::NULL; STD_HANDLE_COUNT],
            command_line: None,
            creation_flags: 0,
            hide_window: false,
        }
    }
}

impl ProcessAttributes {
    pub fn working_dir(mut self, dir: &str) -> Self {
        self.dir = Some(dir.to_string());
        self
    }

    pub fn environment(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Use the launching process's own environment as the explicit environment.
    /// Variables that are not valid unicode are skipped.
    pub fn with_current_environment(mut self) -> Self {
        self.env = Some(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        );
        self
    }

    pub fn io_handles(mut self, handles: &[RawHandle]) -> Self {
        self.io_handles = handles.to_vec();
        self
    }

    pub fn command_line(mut self, cmdline: &str) -> Self {
        self.command_line = Some(cmdline.to_string());
        self
    }

    pub fn creation_flags(mut self, flags: u32) -> Self {
        self.creation_flags = flags;
        self
    }

    pub fn hide_window(mut self, hide: bool) -> Self {
        self.hide_window = hide;
        self
    }
}

/// Everything needed for one launch.
#[derive(Debug)]
pub struct LaunchRequest {
    /// The executable to run, possibly relative to the working directory.
    pub exe: String,
    /// The full argument vector, including any program name the child expects as arg 0.
    pub args: Vec<String>,
    pub credentials: Credentials,
    pub attributes: ProcessAttributes,
}
