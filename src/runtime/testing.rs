// SPDX-License-Identifier: MIT

//! A recording primitive layer for unit tests.
//!
//! Handles are plain counters.  Every handle the fake hands out is tracked
//! until it is closed, so a test can assert that a launch left nothing open,
//! and that nothing was closed twice.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    time::Duration,
};

use crate::runtime::{
    error::{LaunchError, Operation},
    platform::{CreateProcessRequest, Platform, ProcessInformation, StartupInfo},
    spawn::RawHandle,
};

pub(crate) const ERROR_LOGON_FAILURE: u32 = 1326;
pub(crate) const ERROR_INVALID_NAME: u32 = 123;
pub(crate) const ERROR_INVALID_HANDLE: u32 = 6;
pub(crate) const ERROR_ACCESS_DENIED: u32 = 5;

/// What the fake saw when asked to create a process.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCreate {
    pub token: RawHandle,
    pub application: String,
    pub command_line: String,
    pub environment: Vec<u16>,
    pub current_directory: String,
    pub startup: StartupInfo,
    pub creation_flags: u32,
    pub impersonating: bool,
    pub lock_held: bool,
}

pub(crate) struct FakePlatform {
    pub cwd: String,
    pub profile_dir: String,
    pub profile_env: Vec<u16>,
    next_handle: Cell<usize>,
    open: RefCell<HashSet<usize>>,
    closed: RefCell<HashSet<usize>>,
    opened_count: Cell<usize>,
    closed_count: Cell<usize>,
    double_closes: Cell<usize>,
    foreign_closes: Cell<usize>,
    impersonating: Cell<bool>,
    // operation -> number of successful calls left before it fails.
    failures: RefCell<HashMap<Operation, usize>>,
    calls: RefCell<Vec<Operation>>,
    created: RefCell<Option<RecordedCreate>>,
    exited: RefCell<HashMap<usize, u32>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        let profile_env: Vec<u16> = "USERNAME=alice\0USERPROFILE=C:\\Users\\alice\0\0".encode_utf16().collect();
        FakePlatform {
            cwd: r"C:\cwd".to_string(),
            profile_dir: r"C:\Users\alice".to_string(),
            profile_env,
            next_handle: Cell::new(0x1000),
            open: RefCell::new(HashSet::new()),
            closed: RefCell::new(HashSet::new()),
            opened_count: Cell::new(0),
            closed_count: Cell::new(0),
            double_closes: Cell::new(0),
            foreign_closes: Cell::new(0),
            impersonating: Cell::new(false),
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(vec![]),
            created: RefCell::new(None),
            exited: RefCell::new(HashMap::new()),
        }
    }

    /// Make the next call to `op` fail.
    pub fn fail_on(self, op: Operation) -> Self {
        self.fail_after(op, 0)
    }

    /// Let `successes` calls to `op` succeed, then fail the one after.
    pub fn fail_after(self, op: Operation, successes: usize) -> Self {
        self.failures.borrow_mut().insert(op, successes);
        self
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, op: Operation) -> usize {
        self.calls.borrow().iter().filter(|c| **c == op).count()
    }

    pub fn open_handles(&self) -> usize {
        self.open.borrow().len()
    }

    pub fn opened(&self) -> usize {
        self.opened_count.get()
    }

    pub fn closed(&self) -> usize {
        self.closed_count.get()
    }

    pub fn double_closes(&self) -> usize {
        self.double_closes.get()
    }

    pub fn foreign_closes(&self) -> usize {
        self.foreign_closes.get()
    }

    pub fn is_impersonating(&self) -> bool {
        self.impersonating.get()
    }

    pub fn is_open(&self, h: RawHandle) -> bool {
        self.open.borrow().contains(&h.0)
    }

    pub fn created(&self) -> Option<RecordedCreate> {
        self.created.borrow().clone()
    }

    /// Simulate the child process exiting.
    pub fn exit_process(&self, process: RawHandle, code: u32) {
        self.exited.borrow_mut().insert(process.0, code);
    }

    /// Hand out a handle value that the fake does not own, like a caller's pipe.
    pub fn foreign_handle(n: usize) -> RawHandle {
        RawHandle(0x10 + n)
    }

    fn enter(&self, op: Operation) -> Result<(), LaunchError> {
        self.calls.borrow_mut().push(op);
        let mut failures = self.failures.borrow_mut();
        match failures.get_mut(&op) {
            None => Ok(()),
            Some(0) => {
                failures.remove(&op);
                let code = match op {
                    Operation::Logon => ERROR_LOGON_FAILURE,
                    Operation::PathNormalize => ERROR_INVALID_NAME,
                    _ => ERROR_ACCESS_DENIED,
                };
                Err(LaunchError::platform(op, code))
            }
            Some(n) => {
                *n -= 1;
                Ok(())
            }
        }
    }

    fn alloc(&self) -> RawHandle {
        let h = self.next_handle.get();
        self.next_handle.set(h + 4);
        self.open.borrow_mut().insert(h);
        self.opened_count.set(self.opened_count.get() + 1);
        RawHandle(h)
    }

    fn require_open(&self, h: RawHandle) -> Result<(), LaunchError> {
        if self.is_open(h) {
            Ok(())
        } else {
            Err(LaunchError::platform(Operation::CloseHandle, ERROR_INVALID_HANDLE))
        }
    }

    /// Windows full-path rules, applied lexically against `cwd`.
    /// Drives other than the current one resolve against their root.
    fn normalize(&self, path: &str) -> Result<String, LaunchError> {
        if path.is_empty() || path.contains(&['<', '>', '|', '\0'][..]) {
            return Err(LaunchError::platform(Operation::PathNormalize, ERROR_INVALID_NAME));
        }
        let p = path.replace('/', "\\");
        let cwd_drive = &self.cwd[..2];
        let cwd_rest = &self.cwd[2..];
        let (prefix, rest) = if let Some(unc) = p.strip_prefix(r"\\") {
            let mut parts = unc.splitn(3, '\\');
            let server = parts.next().unwrap_or("");
            let share = parts.next().unwrap_or("");
            let rest = parts.next().unwrap_or("");
            (format!(r"\\{}\{}", server, share), format!(r"\{}", rest))
        } else if p.len() >= 2 && p.as_bytes()[1] == b':' {
            let drive = &p[..2];
            let tail = &p[2..];
            if tail.starts_with('\\') {
                (drive.to_string(), tail.to_string())
            } else if drive.eq_ignore_ascii_case(cwd_drive) {
                (cwd_drive.to_string(), format!(r"{}\{}", cwd_rest, tail))
            } else {
                (drive.to_string(), format!(r"\{}", tail))
            }
        } else if p.starts_with('\\') {
            (cwd_drive.to_string(), p.clone())
        } else {
            (cwd_drive.to_string(), format!(r"{}\{}", cwd_rest, p))
        };

        let mut parts: Vec<&str> = vec![];
        for c in rest.split('\\') {
            match c {
                "" | "." => (),
                ".." => {
                    parts.pop();
                }
                c => parts.push(c),
            }
        }
        Ok(format!(r"{}\{}", prefix, parts.join("\\")))
    }
}

impl Platform for FakePlatform {
    fn full_path(&self, path: &str) -> Result<String, LaunchError> {
        self.enter(Operation::PathNormalize)?;
        self.normalize(path)
    }

    fn logon_user(&self, username: &str, _domain: &str, password: &str) -> Result<RawHandle, LaunchError> {
        self.enter(Operation::Logon)?;
        if username.is_empty() || password == "wrong" {
            return Err(LaunchError::platform(Operation::Logon, ERROR_LOGON_FAILURE));
        }
        Ok(self.alloc())
    }

    fn impersonate(&self, token: RawHandle) -> Result<(), LaunchError> {
        self.enter(Operation::Impersonate)?;
        self.require_open(token)?;
        self.impersonating.set(true);
        Ok(())
    }

    fn revert_to_self(&self) -> Result<(), LaunchError> {
        self.enter(Operation::RevertToSelf)?;
        self.impersonating.set(false);
        Ok(())
    }

    fn duplicate_inheritable(&self, handle: RawHandle) -> Result<RawHandle, LaunchError> {
        self.enter(Operation::DuplicateHandle)?;
        if handle.is_null() {
            return Err(LaunchError::platform(Operation::DuplicateHandle, ERROR_INVALID_HANDLE));
        }
        Ok(self.alloc())
    }

    fn close_handle(&self, handle: RawHandle) -> Result<(), LaunchError> {
        self.enter(Operation::CloseHandle)?;
        if self.open.borrow_mut().remove(&handle.0) {
            self.closed.borrow_mut().insert(handle.0);
            self.closed_count.set(self.closed_count.get() + 1);
            Ok(())
        } else {
            if self.closed.borrow().contains(&handle.0) {
                self.double_closes.set(self.double_closes.get() + 1);
            } else {
                self.foreign_closes.set(self.foreign_closes.get() + 1);
            }
            Err(LaunchError::platform(Operation::CloseHandle, ERROR_INVALID_HANDLE))
        }
    }

    fn user_profile_directory(&self, token: RawHandle) -> Result<String, LaunchError> {
        self.enter(Operation::UserProfileDirectory)?;
        self.require_open(token)?;
        Ok(self.profile_dir.clone())
    }

    fn create_environment_block(&self, token: RawHandle) -> Result<Vec<u16>, LaunchError> {
        self.enter(Operation::CreateEnvironmentBlock)?;
        self.require_open(token)?;
        Ok(self.profile_env.clone())
    }

    fn create_process_as_user(&self, request: &CreateProcessRequest) -> Result<ProcessInformation, LaunchError> {
        self.enter(Operation::CreateProcess)?;
        self.require_open(request.token)?;
        *self.created.borrow_mut() = Some(RecordedCreate {
            token: request.token,
            application: request.application.to_string(),
            command_line: request.command_line.to_string(),
            environment: request.environment.to_vec(),
            current_directory: request.current_directory.to_string(),
            startup: request.startup.clone(),
            creation_flags: request.creation_flags,
            impersonating: self.impersonating.get(),
            lock_held: crate::runtime::inherit_lock::is_locked(),
        });
        let process = self.alloc();
        let thread = self.alloc();
        Ok(ProcessInformation { process, thread, pid: 4242 })
    }

    fn wait_for_exit(&self, process: RawHandle, _timeout: Option<Duration>) -> Result<bool, LaunchError> {
        self.enter(Operation::Wait)?;
        self.require_open(process)?;
        Ok(self.exited.borrow().contains_key(&process.0))
    }

    fn exit_code(&self, process: RawHandle) -> Result<Option<u32>, LaunchError> {
        self.enter(Operation::ExitCode)?;
        self.require_open(process)?;
        Ok(self.exited.borrow().get(&process.0).copied())
    }

    fn terminate_process(&self, process: RawHandle, exit_code: u32) -> Result<(), LaunchError> {
        self.enter(Operation::Terminate)?;
        self.require_open(process)?;
        self.exited.borrow_mut().entry(process.0).or_insert(exit_code);
        Ok(())
    }
}
