// SPDX-License-Identifier: MIT

//! Windows Argument Quoting Rules, and the environment block.
//!
//! See "Everyone quotes command line arguments the wrong way":
//!   https://learn.microsoft.com/en-us/archive/blogs/twistylittlepassagesallalike/everyone-quotes-command-line-arguments-the-wrong-way
//! and
//!   https://docs.microsoft.com/en-us/archive/blogs/larryosterman/the-windows-command-line-is-just-a-string
//!
//! Unlike the C runtime convention, the argument vector is taken as-is: if
//! the child expects its own name as arg 0, the caller puts it there.

use std::collections::BTreeMap;

use crate::runtime::error::LaunchError;

/// Build the command line.  A non-empty `explicit` command line is used
/// verbatim; the caller is responsible for its quoting.
pub fn build_command_line(args: &[String], explicit: Option<&str>) -> Result<String, LaunchError> {
    match explicit {
        Some(cmdline) if !cmdline.is_empty() => {
            enforce_no_zero(cmdline)?;
            Ok(cmdline.to_string())
        }
        _ => quote_arguments(args),
    }
}

/// Quote each argument and join them with single spaces.
pub fn quote_arguments(args: &[String]) -> Result<String, LaunchError> {
    let mut ret = String::new();
    for arg in args {
        if !ret.is_empty() {
            ret.push(' ');
        }
        append_arg(&mut ret, arg)?;
    }
    Ok(ret)
}

fn append_arg(cmd: &mut String, arg: &str) -> Result<(), LaunchError> {
    enforce_no_zero(arg)?;
    if !requires_quoting(arg) {
        cmd.push_str(arg);
        return Ok(());
    }

    // Perform quoting.
    cmd.push('"');
    let mut backslash_count = 0;
    for c in arg.chars() {
        if c == '\\' {
            backslash_count += 1;
            continue;
        }
        if c == '"' {
            // Escape all the backslashes, and add one for the escaped '"'.
            push_backslashes(cmd, backslash_count * 2 + 1);
        } else {
            // Backslashes aren't special.
            push_backslashes(cmd, backslash_count);
        }
        cmd.push(c);
        backslash_count = 0;
    }

    // Escape all the trailing backslashes.
    // Let the final '"' be still considered a meta-character.
    push_backslashes(cmd, backslash_count * 2);

    cmd.push('"');
    Ok(())
}

fn push_backslashes(cmd: &mut String, count: usize) {
    for _ in 0..count {
        cmd.push('\\');
    }
}

fn requires_quoting(val: &str) -> bool {
    val.is_empty() || val.chars().any(char_requires_quoting)
}

// Backslashes force quoting too, so a path ending in one reads unambiguously.
fn char_requires_quoting(c: char) -> bool {
    c == ' '
        || c == '\t'
        || c == '\n'
        || c == '\x0b' // vertical tab (\v in c)
        || c == '"'
        || c == '\\'
}

/// Turn an explicit environment into the block format that process creation
/// expects: each `key=value` NUL terminated, then one extra NUL.
///
/// Entries are sorted by key, case-insensitive, as Windows expects.
/// Keys may start with '=' (the per-drive `=C:` variables) but may not be empty.
pub fn encode_env_strings(env: &BTreeMap<String, String>) -> Result<Vec<u16>, LaunchError> {
    let mut pairs: Vec<(&String, &String)> = env.iter().collect();
    pairs.sort_by_cached_key(|(k, _)| k.to_lowercase());

    let mut entries = Vec::with_capacity(pairs.len());
    for (k, v) in pairs {
        if k.is_empty() {
            return Err(LaunchError::invalid("empty environment variable name"));
        }
        enforce_no_zero(k)?;
        enforce_no_zero(v)?;
        entries.push(format!("{}={}", k, v));
    }
    Ok(encode_env_block(&entries))
}

/// Encode already formatted `key=value` entries as a UTF-16 environment block.
///
/// An empty entry would end the block early, so empty entries are skipped.
/// With no entries left the block is two NULs: a valid, empty environment.
pub fn encode_env_block<S: AsRef<str>>(entries: &[S]) -> Vec<u16> {
    let mut block: Vec<u16> = Vec::new();
    for entry in entries.iter().map(|e| e.as_ref()).filter(|e| !e.is_empty()) {
        block.extend(entry.encode_utf16());
        block.push(0); // NUL terminator for this entry
    }
    if block.is_empty() {
        // An empty environment block is double-NUL terminated.
        return vec![0, 0];
    }
    block.push(0); // extra NUL terminator ends the block
    block
}

/// Length of a native environment block in u16 units, including both final NULs.
pub fn env_block_len(block: &[u16]) -> Option<usize> {
    // An empty block is just the two terminators.
    if block.len() >= 2 && block[0] == 0 && block[1] == 0 {
        return Some(2);
    }
    block.windows(2).position(|w| w == [0, 0]).map(|i| i + 2)
}

fn enforce_no_zero(val: &str) -> Result<&str, LaunchError> {
    if val.contains('\0') {
        Err(LaunchError::invalid("nul byte found in value"))
    } else {
        Ok(val)
    }
}
