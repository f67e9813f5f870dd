// SPDX-License-Identifier: MIT

//! The Win32 calls behind each primitive.

use std::{ffi, mem, time::Duration};

use windows::{
    Win32::{
        Foundation::{
            CloseHandle, DUPLICATE_SAME_ACCESS, DuplicateHandle, HANDLE, STILL_ACTIVE, WAIT_FAILED, WAIT_OBJECT_0,
            WAIT_TIMEOUT,
        },
        Security,
        Storage::FileSystem::GetFullPathNameW,
        System::{Environment, Threading},
        UI::{Shell::GetUserProfileDirectoryW, WindowsAndMessaging::SW_HIDE},
    },
    core::{PCWSTR, PWSTR},
};

use crate::runtime::{
    error::{LaunchError, Operation},
    launch_quote::env_block_len,
    platform::{CreateProcessRequest, Platform, ProcessInformation},
    spawn::{RawHandle, wipe},
};

use super::{
    conv::{as_c_str_w, from_c_str_w, from_handle, to_handle},
    error::{op, platform_error},
};

/// The real primitives.  Stateless; copy it freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    fn full_path(&self, path: &str) -> Result<String, LaunchError> {
        let name = as_c_str_w(path);
        // First call: get the expected size, including the NUL.
        let mut size = unsafe { GetFullPathNameW(PCWSTR(name.as_ptr()), None, None) };
        loop {
            if size == 0 {
                return Err(platform_error(Operation::PathNormalize, windows::core::Error::from_thread()));
            }
            let mut buf = vec![0u16; size as usize];
            let len = unsafe { GetFullPathNameW(PCWSTR(name.as_ptr()), Some(buf.as_mut_slice()), None) };
            if len == 0 {
                return Err(platform_error(Operation::PathNormalize, windows::core::Error::from_thread()));
            }
            if (len as usize) < buf.len() {
                return Ok(String::from_utf16_lossy(&buf[..len as usize]));
            }
            // The current directory changed between the calls; try again with the new size.
            size = len;
        }
    }

    fn logon_user(&self, username: &str, domain: &str, password: &str) -> Result<RawHandle, LaunchError> {
        let username = as_c_str_w(username);
        let domain = as_c_str_w(domain);
        let mut password = as_c_str_w(password);
        let mut token = HANDLE::default();
        let res = unsafe {
            Security::LogonUserW(
                PCWSTR(username.as_ptr()),
                PCWSTR(domain.as_ptr()),
                PCWSTR(password.as_ptr()),
                Security::LOGON32_LOGON_INTERACTIVE,
                Security::LOGON32_PROVIDER_DEFAULT,
                &mut token,
            )
        };
        wipe(password.as_mut_slice());
        res.map_err(op(Operation::Logon))?;
        Ok(from_handle(token))
    }

    fn impersonate(&self, token: RawHandle) -> Result<(), LaunchError> {
        unsafe { Security::ImpersonateLoggedOnUser(to_handle(token)) }.map_err(op(Operation::Impersonate))
    }

    fn revert_to_self(&self) -> Result<(), LaunchError> {
        unsafe { Security::RevertToSelf() }.map_err(op(Operation::RevertToSelf))
    }

    fn duplicate_inheritable(&self, handle: RawHandle) -> Result<RawHandle, LaunchError> {
        let mut child = HANDLE::default();
        unsafe {
            DuplicateHandle(
                Threading::GetCurrentProcess(), // source process
                to_handle(handle),              // source handle
                Threading::GetCurrentProcess(), // target process (still this process, inheritance copies it over)
                &mut child,                     // target handle
                0,                              // desired access: ignored with DUPLICATE_SAME_ACCESS
                true,                           // inherit-handle: the child picks it up at creation.
                DUPLICATE_SAME_ACCESS,
            )
        }
        .map_err(op(Operation::DuplicateHandle))?;
        Ok(from_handle(child))
    }

    fn close_handle(&self, handle: RawHandle) -> Result<(), LaunchError> {
        unsafe { CloseHandle(to_handle(handle)) }.map_err(op(Operation::CloseHandle))
    }

    fn user_profile_directory(&self, token: RawHandle) -> Result<String, LaunchError> {
        // First call: get the expected size.  This fails with an insufficient
        // buffer error, which is the point.
        let mut size: u32 = 0;
        let _ = unsafe { GetUserProfileDirectoryW(to_handle(token), None, &mut size) };
        if size == 0 {
            return Err(platform_error(Operation::UserProfileDirectory, windows::core::Error::from_thread()));
        }
        let mut buf = vec![0u16; size as usize];
        unsafe { GetUserProfileDirectoryW(to_handle(token), Some(PWSTR(buf.as_mut_ptr())), &mut size) }
            .map_err(op(Operation::UserProfileDirectory))?;
        Ok(from_c_str_w(&buf))
    }

    fn create_environment_block(&self, token: RawHandle) -> Result<Vec<u16>, LaunchError> {
        let mut env: *mut ffi::c_void = std::ptr::null_mut();
        unsafe { Environment::CreateEnvironmentBlock(&mut env, Some(to_handle(token)), true) }
            .map_err(op(Operation::CreateEnvironmentBlock))?;
        if env.is_null() {
            return Err(LaunchError::platform(Operation::CreateEnvironmentBlock, 0));
        }
        // Copy it out, so the system block can be freed right away.
        let block = unsafe { copy_env_block(env as *const u16) };
        if let Err(e) = unsafe { Environment::DestroyEnvironmentBlock(env) } {
            log::warn!("could not free environment block: {:?}", e);
        }
        Ok(block)
    }

    fn create_process_as_user(&self, request: &CreateProcessRequest) -> Result<ProcessInformation, LaunchError> {
        let startup = request.startup;
        let mut si = Threading::STARTUPINFOW {
            cb: mem::size_of::<Threading::STARTUPINFOW>() as u32,
            ..Default::default()
        };
        if startup.use_std_handles {
            si.dwFlags |= Threading::STARTF_USESTDHANDLES;
            si.hStdInput = to_handle(startup.stdin);
            si.hStdOutput = to_handle(startup.stdout);
            si.hStdError = to_handle(startup.stderr);
        }
        if startup.hide_window {
            si.dwFlags |= Threading::STARTF_USESHOWWINDOW;
            si.wShowWindow = SW_HIDE.0 as u16;
        }

        let app = as_c_str_w(request.application);
        // CreateProcess may write to the command line buffer, so it must be a private copy.
        let mut cmdline = as_c_str_w(request.command_line);
        let cmdline = if request.command_line.is_empty() {
            None
        } else {
            Some(PWSTR(cmdline.as_mut_ptr()))
        };
        let cwd = as_c_str_w(request.current_directory);
        if env_block_len(request.environment).is_none() {
            return Err(LaunchError::invalid("environment block is not terminated"));
        }

        let mut pi = Threading::PROCESS_INFORMATION::default();
        unsafe {
            Threading::CreateProcessAsUserW(
                Some(to_handle(request.token)), // the logged-on user
                PCWSTR(app.as_ptr()),           // application name
                cmdline,                        // command line
                None,                           // process attributes
                None,                           // thread attributes
                true,                           // inherit the duplicated standard handles.
                Threading::PROCESS_CREATION_FLAGS(request.creation_flags),
                Some(request.environment.as_ptr() as *const ffi::c_void),
                PCWSTR(cwd.as_ptr()),
                &si,
                &mut pi,
            )
        }
        .map_err(op(Operation::CreateProcess))?;

        Ok(ProcessInformation {
            process: from_handle(pi.hProcess),
            thread: from_handle(pi.hThread),
            pid: pi.dwProcessId,
        })
    }

    fn wait_for_exit(&self, process: RawHandle, timeout: Option<Duration>) -> Result<bool, LaunchError> {
        let ms = match timeout {
            None => Threading::INFINITE,
            // Stay below INFINITE, which would wait forever.
            Some(t) => t.as_millis().min((Threading::INFINITE - 1) as u128) as u32,
        };
        let res = unsafe { Threading::WaitForSingleObject(to_handle(process), ms) };
        if res == WAIT_OBJECT_0 {
            Ok(true)
        } else if res == WAIT_TIMEOUT {
            Ok(false)
        } else if res == WAIT_FAILED {
            Err(platform_error(Operation::Wait, windows::core::Error::from_thread()))
        } else {
            Err(LaunchError::platform(Operation::Wait, res.0))
        }
    }

    fn exit_code(&self, process: RawHandle) -> Result<Option<u32>, LaunchError> {
        let mut code = 0u32;
        unsafe { Threading::GetExitCodeProcess(to_handle(process), &mut code) }.map_err(op(Operation::ExitCode))?;
        if code == STILL_ACTIVE.0 as u32 {
            Ok(None)
        } else {
            Ok(Some(code))
        }
    }

    fn terminate_process(&self, process: RawHandle, exit_code: u32) -> Result<(), LaunchError> {
        unsafe { Threading::TerminateProcess(to_handle(process), exit_code) }.map_err(op(Operation::Terminate))
    }
}

/// Copy a system environment block, up to and including its double NUL.
///
/// # Safety
/// `env` must point to a double-NUL-terminated UTF-16 block.
unsafe fn copy_env_block(env: *const u16) -> Vec<u16> {
    let mut len = 0usize;
    loop {
        // SAFETY: the block is double-NUL terminated, so reads stop inside it.
        let (a, b) = unsafe { (*env.add(len), *env.add(len + 1)) };
        if a == 0 && b == 0 {
            break;
        }
        len += 1;
    }
    // SAFETY: `len + 2` units were just read.
    unsafe { std::slice::from_raw_parts(env, len + 2) }.to_vec()
}
