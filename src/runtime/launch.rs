// SPDX-License-Identifier: MIT

//! Run the process as another user.

use crate::runtime::{
    error::LaunchError,
    fd::DuplicatedHandles,
    inherit_lock::lock_handle_inheritance,
    launch_quote::{build_command_line, encode_env_strings},
    monitor::LaunchedProcess,
    path,
    platform::{CreateProcessRequest, Platform, ProcessInformation},
    session::ImpersonationSession,
    spawn::{CREATE_UNICODE_ENVIRONMENT, LaunchRequest, STD_HANDLE_COUNT},
};

/// Launches processes through a set of native primitives.
///
/// Each launch runs start to finish on the calling thread, and blocks in the
/// native calls.  Launches on different threads may run at the same time;
/// they serialize only on the inheritance lock.
pub struct ProcessLauncher<P: Platform + Clone> {
    platform: P,
}

impl<P: Platform + Clone> ProcessLauncher<P> {
    pub fn new(platform: P) -> Self {
        ProcessLauncher { platform }
    }

    /// Launch the request's executable as the request's user.
    ///
    /// Either the whole process is returned, or nothing was created: every
    /// handle, the logon token and the inheritance lock are released on every
    /// path, and the calling thread is never left impersonating.
    pub fn launch(&self, request: LaunchRequest) -> Result<LaunchedProcess<P>, LaunchError> {
        let LaunchRequest { exe, args, credentials, attributes } = request;

        if exe.is_empty() {
            return Err(LaunchError::invalid("empty executable path"));
        }
        if attributes.io_handles.len() != STD_HANDLE_COUNT {
            return Err(LaunchError::InvalidArgument(format!(
                "expected {} standard handles, found {}",
                STD_HANDLE_COUNT,
                attributes.io_handles.len()
            )));
        }
        let dir = attributes.dir.filter(|d| !d.is_empty());

        // The process creation call looks for the executable relative to this
        // process's directory, not the child's.
        let exe = match &dir {
            Some(d) => path::resolve(&self.platform, d, &exe)?,
            None => exe,
        };
        let cmdline = build_command_line(&args, attributes.command_line.as_deref())?;
        let explicit_env = attributes.env.as_ref().map(encode_env_strings).transpose()?;

        log::debug!("launching [{}] [{}] as {}\\{}", exe, cmdline, credentials.domain, credentials.username);
        let username = credentials.username.clone();

        // Held until the creation call returns, so the inheritable duplicates
        // only ever reach this child.
        let lock = lock_handle_inheritance();
        let handles = DuplicatedHandles::duplicate(self.platform.clone(), &attributes.io_handles, &lock)?;
        let startup = handles.startup_info(attributes.hide_window);

        let session = ImpersonationSession::authenticate(self.platform.clone(), credentials)?;
        let cwd = match dir {
            Some(d) => d,
            None => session.profile_directory()?,
        };
        let env = match explicit_env {
            Some(block) => block,
            None => session.environment_block()?,
        };

        let request = CreateProcessRequest {
            token: session.token()?,
            application: &exe,
            command_line: &cmdline,
            environment: &env,
            current_directory: &cwd,
            startup: &startup,
            creation_flags: attributes.creation_flags | CREATE_UNICODE_ENVIRONMENT,
        };
        let impersonation = session.impersonate()?;
        let created = self.platform.create_process_as_user(&request);
        let reverted = impersonation.revert();
        let info = match (created, reverted) {
            (Ok(info), Ok(())) => info,
            (Err(e), Ok(())) => return Err(e),
            (created, Err(e)) => {
                // The thread is still running as the user; that outranks the launch.
                match created {
                    Ok(info) => self.abandon(info),
                    Err(create_err) => log::error!("process creation failed: {}", create_err),
                }
                return Err(e);
            }
        };

        if let Err(e) = handles.close() {
            log::warn!("could not close duplicated standard handles: {}", e);
        }
        if let Err(e) = self.platform.close_handle(info.thread) {
            log::warn!("could not close thread handle for process {}: {}", info.pid, e);
        }
        if let Err(e) = session.close() {
            log::warn!("could not close logon token: {}", e);
        }
        drop(lock);

        log::info!("launched [{}] as {} with pid {}", exe, username, info.pid);
        Ok(LaunchedProcess::new(self.platform.clone(), info.pid, info.process))
    }

    /// Kill a process that was created but cannot be handed out, and release its handles.
    fn abandon(&self, info: ProcessInformation) {
        log::error!("terminating process {} after failed launch", info.pid);
        if let Err(e) = self.platform.terminate_process(info.process, 1) {
            log::error!("could not terminate process {}: {}", info.pid, e);
        }
        for h in [info.thread, info.process] {
            if let Err(e) = self.platform.close_handle(h) {
                log::warn!("could not close handle for process {}: {}", info.pid, e);
            }
        }
    }
}
