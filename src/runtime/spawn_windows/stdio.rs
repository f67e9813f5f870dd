// SPDX-License-Identifier: MIT

//! The launching process's own standard handles.

use windows_sys::Win32::{Foundation::INVALID_HANDLE_VALUE, System::Console};

use crate::runtime::spawn::{RawHandle, STD_HANDLE_COUNT};

/// stdin, stdout and stderr of this process, for a child that should share them.
///
/// Some environments (services, GUI processes) don't have a console; a
/// missing stream comes back null, meaning "not redirected".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdHandles {
    pub stdin: RawHandle,
    pub stdout: RawHandle,
    pub stderr: RawHandle,
}

impl StdHandles {
    pub fn current() -> Self {
        StdHandles {
            stdin: std_handle(Console::STD_INPUT_HANDLE),
            stdout: std_handle(Console::STD_OUTPUT_HANDLE),
            stderr: std_handle(Console::STD_ERROR_HANDLE),
        }
    }

    /// In the order `ProcessAttributes::io_handles` expects.
    pub fn as_array(&self) -> [RawHandle; STD_HANDLE_COUNT] {
        [self.stdin, self.stdout, self.stderr]
    }
}

fn std_handle(which: Console::STD_HANDLE) -> RawHandle {
    let h = unsafe { Console::GetStdHandle(which) };
    if h.is_null() || h == INVALID_HANDLE_VALUE {
        RawHandle::NULL
    } else {
        RawHandle(h as usize)
    }
}
