// SPDX-License-Identifier: MIT

//! Various type conversion routines.

use windows::Win32::Foundation::HANDLE;

use crate::runtime::spawn::RawHandle;

/// Convert the string into a null-terminated wide (16-bit) C string.
pub fn as_c_str_w(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Read a wide C string out of a buffer, stopping at the first NUL.
pub fn from_c_str_w(buf: &[u16]) -> String {
    let len = buf.iter().position(|c| *c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

pub fn to_handle(h: RawHandle) -> HANDLE {
    HANDLE(h.0 as *mut core::ffi::c_void)
}

pub fn from_handle(h: HANDLE) -> RawHandle {
    RawHandle(h.0 as usize)
}
