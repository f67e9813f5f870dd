// SPDX-License-Identifier: MIT

//! Executable path resolution.
//!
//! The process creation call looks for the executable relative to the
//! *launcher's* current directory, and only changes into the working directory
//! once the child starts.  Callers expect the opposite, so a relative
//! executable is made absolute against the working directory first.

use crate::runtime::{error::LaunchError, platform::Platform};

fn is_slash(c: u8) -> bool {
    c == b'\\' || c == b'/'
}

fn is_unc(p: &[u8]) -> bool {
    p.len() > 2 && is_slash(p[0]) && is_slash(p[1])
}

fn has_drive(p: &[u8]) -> bool {
    p.len() > 1 && p[1] == b':'
}

/// Normalize the working directory.  It must be a drive path, not a network share.
pub fn normalize_dir<P: Platform>(platform: &P, dir: &str) -> Result<String, LaunchError> {
    let ndir = platform.full_path(dir)?;
    if is_unc(ndir.as_bytes()) {
        return Err(LaunchError::invalid("working directory cannot be a network share path"));
    }
    if !has_drive(ndir.as_bytes()) {
        return Err(LaunchError::InvalidArgument(format!("working directory has no drive: {}", ndir)));
    }
    Ok(ndir)
}

/// Resolve `exe` against the working directory `dir`, returning an absolute path.
pub fn resolve<P: Platform>(platform: &P, dir: &str, exe: &str) -> Result<String, LaunchError> {
    let p = exe.as_bytes();
    if p.is_empty() {
        return Err(LaunchError::invalid("empty executable path"));
    }
    if is_unc(p) {
        // \\server\share\path
        return Ok(exe.to_string());
    }
    if has_drive(p) {
        if p.len() == 2 {
            return Err(LaunchError::InvalidArgument(format!("drive without a path: {}", exe)));
        }
        if is_slash(p[2]) {
            return Ok(exe.to_string());
        }
        // Drive relative, "X:path".
        let d = normalize_dir(platform, dir)?;
        if p[0].eq_ignore_ascii_case(&d.as_bytes()[0]) {
            return platform.full_path(&format!("{}\\{}", d, &exe[2..]));
        }
        return platform.full_path(exe);
    }
    let d = normalize_dir(platform, dir)?;
    if is_slash(p[0]) {
        // Rooted on the working directory's drive.
        return platform.full_path(&format!("{}{}", &d[..2], exe));
    }
    platform.full_path(&format!("{}\\{}", d, exe))
}
