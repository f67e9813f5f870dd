// SPDX-License-Identifier: MIT

//! Windows based errors.

use crate::runtime::error::{LaunchError, Operation};

/// HRESULT_FROM_WIN32 wraps a Win32 error code in this facility.
const FACILITY_WIN32_MASK: u32 = 0xFFFF_0000;
const FACILITY_WIN32_BITS: u32 = 0x8007_0000;

/// The Win32 error code inside an HRESULT, or the raw HRESULT bits if it carries none.
pub fn win32_code(e: &windows_result::Error) -> u32 {
    let hr = e.code().0 as u32;
    if hr & FACILITY_WIN32_MASK == FACILITY_WIN32_BITS {
        hr & !FACILITY_WIN32_MASK
    } else {
        hr
    }
}

/// Tag a Windows error with the operation that produced it.
pub fn platform_error(operation: Operation, e: windows_result::Error) -> LaunchError {
    let code = win32_code(&e);
    log::debug!("{} failed: {:?}", operation, e);
    LaunchError::platform(operation, code)
}

/// Adapter for `map_err`.
pub fn op(operation: Operation) -> impl FnOnce(windows_result::Error) -> LaunchError {
    move |e| platform_error(operation, e)
}
