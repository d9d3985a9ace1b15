//! Session slot reader/writer backing the authentication guard.
//!
//! # Responsibility
//! - Persist the signed-in user in the `user` slot.
//! - Answer `is_authenticated` from that slot on every call.
//!
//! # Invariants
//! - Absent, unreadable or malformed session data means "not authenticated".
//! - Sign-out clears the slot rather than writing a negative flag.

use crate::access::guard::AccessGuard;
use crate::repo::slot_repo::{RepoError, SlotRepository};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Durable slot key holding the session object.
pub const SESSION_SLOT_KEY: &str = "user";

/// Stored session object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub is_authenticated: bool,
}

/// Session write failures.
#[derive(Debug)]
pub enum SessionError {
    EmptyUsername,
    Encode(serde_json::Error),
    Repo(RepoError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::Encode(err) => write!(f, "failed to encode session: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyUsername => None,
            Self::Encode(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Authentication guard derived from the session slot.
pub struct SessionGuard<S: SlotRepository> {
    slots: S,
}

impl<S: SlotRepository> SessionGuard<S> {
    pub fn new(slots: S) -> Self {
        Self { slots }
    }

    /// Returns the stored session, if one is readable.
    pub fn current(&self) -> Option<SessionState> {
        let raw = match self.slots.read_slot(SESSION_SLOT_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(
                    "event=session_read module=access status=error error_code=slot_read_failed error={}",
                    err
                );
                return None;
            }
        };

        match serde_json::from_str::<SessionState>(raw.as_str()) {
            Ok(state) => Some(state),
            Err(_) => {
                warn!(
                    "event=session_read module=access status=error error_code=session_corrupt bytes={}",
                    raw.len()
                );
                None
            }
        }
    }

    /// Stores an authenticated session for `username`.
    pub fn sign_in(&self, username: &str) -> Result<SessionState, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }

        let state = SessionState {
            username: username.to_string(),
            is_authenticated: true,
        };
        let encoded = serde_json::to_string(&state).map_err(SessionError::Encode)?;
        self.slots.write_slot(SESSION_SLOT_KEY, encoded.as_str())?;
        info!("event=session_sign_in module=access status=ok");
        Ok(state)
    }

    /// Clears the session slot.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.slots.clear_slot(SESSION_SLOT_KEY)?;
        info!("event=session_sign_out module=access status=ok");
        Ok(())
    }
}

impl<S: SlotRepository> AccessGuard for SessionGuard<S> {
    fn is_authenticated(&self) -> bool {
        self.current().is_some_and(|state| state.is_authenticated)
    }
}
