//! Error types for the `presence` crate.
//!
//! Follows the same shape as the other layers: a root `Error` struct holding an
//! `error_kind` and an optional boxed `source` for chaining.

use crate::connection::SessionId;
use crate::session::SessionState;
use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the presence layer.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Kinds of failures the presence layer can report.
///
/// Most of these are recovered locally (a malformed handshake still connects,
/// a stale recipient is skipped) and only surface to callers that ask for them.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// Handshake coordinates were missing, non-numeric or out of range.
    MalformedHandshake(String),
    /// Coordinates supplied after connect were not a valid location.
    InvalidCoordinates(String),
    /// A session with this id is already registered.
    DuplicateSessionId(SessionId),
    /// The session's transport closed before the event could be delivered.
    StaleSessionDispatch(SessionId),
    /// No session with this id is registered.
    UnknownSession(SessionId),
    /// A lifecycle transition that the session state machine does not allow.
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
    /// An event payload could not be encoded as JSON.
    Serialization,
}

impl Error {
    pub fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub fn with_source(
        error_kind: ErrorKind,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            error_kind,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedHandshake(reason) => write!(f, "malformed handshake: {reason}"),
            ErrorKind::InvalidCoordinates(reason) => write!(f, "invalid coordinates: {reason}"),
            ErrorKind::DuplicateSessionId(id) => write!(f, "duplicate session id {id}"),
            ErrorKind::StaleSessionDispatch(id) => {
                write!(f, "session {id} closed before delivery")
            }
            ErrorKind::UnknownSession(id) => write!(f, "unknown session {id}"),
            ErrorKind::InvalidTransition { from, to } => {
                write!(f, "invalid session transition {from:?} -> {to:?}")
            }
            ErrorKind::Serialization => write!(f, "failed to serialize event payload"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Presence Error: {}", self.error_kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Serialization, err)
    }
}
