// SPDX-License-Identifier: MIT

//! The native primitives, on Windows.
//!
//! Each primitive is a thin wrapper over one Win32 call.  Ownership and
//! cleanup ordering live in the launcher, not here.

mod conv;
mod error;
mod platform;
mod stdio;

pub use platform::WindowsPlatform;
pub use stdio::StdHandles;
