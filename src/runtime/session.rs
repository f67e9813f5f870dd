// SPDX-License-Identifier: MIT

//! Logon and impersonation.
//!
//! A session only exists after a successful logon, and owns the logon token
//! until it is closed or dropped.  Impersonation is a guard that borrows the
//! session, so the token cannot be closed while the thread still wears it,
//! and dropping the guard reverts the thread.
//!
//! Impersonation belongs to the calling thread, so neither type can be sent
//! to, or shared with, another thread.

use std::marker::PhantomData;

use crate::runtime::{
    error::LaunchError,
    platform::Platform,
    spawn::{Credentials, RawHandle},
};

// Not Send, not Sync.
type ThreadBound = PhantomData<*const ()>;

/// An authenticated user: the logon token, closed exactly once.
pub struct ImpersonationSession<P: Platform> {
    platform: P,
    token: Option<RawHandle>,
    _thread: ThreadBound,
}

impl<P: Platform> ImpersonationSession<P> {
    /// Interactive logon with the default provider.  The credentials are
    /// consumed, and their password wiped, whatever the outcome.
    pub fn authenticate(platform: P, credentials: Credentials) -> Result<Self, LaunchError> {
        log::debug!("logon for {}\\{}", credentials.domain, credentials.username);
        let token = platform.logon_user(&credentials.username, &credentials.domain, credentials.password())?;
        drop(credentials);
        Ok(ImpersonationSession {
            platform,
            token: Some(token),
            _thread: PhantomData,
        })
    }

    /// The logon token.  Still owned by the session.
    pub fn token(&self) -> Result<RawHandle, LaunchError> {
        self.token.ok_or_else(|| LaunchError::invalid("logon token already closed"))
    }

    /// The root of the user's profile directory.
    pub fn profile_directory(&self) -> Result<String, LaunchError> {
        self.platform.user_profile_directory(self.token()?)
    }

    /// The user's default environment, as a UTF-16 block.
    pub fn environment_block(&self) -> Result<Vec<u16>, LaunchError> {
        self.platform.create_environment_block(self.token()?)
    }

    /// Apply the token to the calling thread until the returned guard is
    /// reverted or dropped.  On failure the thread is not impersonating,
    /// and the session still owns the token.
    pub fn impersonate(&self) -> Result<Impersonation<'_, P>, LaunchError> {
        self.platform.impersonate(self.token()?)?;
        Ok(Impersonation {
            session: self,
            active: true,
            _thread: PhantomData,
        })
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Release the token.
    pub fn close(mut self) -> Result<(), LaunchError> {
        self.close_token()
    }

    fn close_token(&mut self) -> Result<(), LaunchError> {
        match self.token.take() {
            None => Ok(()),
            Some(h) => self.platform.close_handle(h),
        }
    }
}

impl<P: Platform> Drop for ImpersonationSession<P> {
    fn drop(&mut self) {
        if let Err(e) = self.close_token() {
            log::warn!("could not close logon token: {}", e);
        }
    }
}

/// The calling thread is running as the session's user.
pub struct Impersonation<'s, P: Platform> {
    session: &'s ImpersonationSession<P>,
    active: bool,
    _thread: ThreadBound,
}

impl<P: Platform> Impersonation<'_, P> {
    /// Return the thread to its own security context.
    pub fn revert(mut self) -> Result<(), LaunchError> {
        self.revert_inner()
    }

    fn revert_inner(&mut self) -> Result<(), LaunchError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.session.platform.revert_to_self()
    }
}

impl<P: Platform> Drop for Impersonation<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.revert_inner() {
            log::warn!("could not revert impersonation: {}", e);
        }
    }
}
