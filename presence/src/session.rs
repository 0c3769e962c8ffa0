//! Per-connection lifecycle: handshake parsing and the session state machine.

use crate::connection::{ConnectionRegistry, SessionId};
use crate::error::{Error, ErrorKind};
use events::Coordinates;
use log::*;
use serde::Deserialize;
use std::sync::Arc;

/// Lifecycle of one realtime connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

impl SessionState {
    /// Returns the next state, or an error if `self -> to` is not allowed.
    pub fn transition(self, to: SessionState) -> Result<SessionState, Error> {
        use SessionState::*;
        match (self, to) {
            (Connecting, Active) | (Connecting, Closed) | (Active, Closed) => Ok(to),
            (from, to) => Err(Error::new(ErrorKind::InvalidTransition { from, to })),
        }
    }
}

/// Query parameters supplied when a client opens its realtime connection.
///
/// Kept as raw strings so a bad value never rejects the connection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandshakeParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl HandshakeParams {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
        }
    }

    /// Parses both parameters into a valid coordinate pair.
    pub fn coordinates(&self) -> Result<Coordinates, Error> {
        let latitude = parse_component("latitude", self.latitude.as_deref())?;
        let longitude = parse_component("longitude", self.longitude.as_deref())?;
        let coordinates = Coordinates::new(latitude, longitude);

        if !coordinates.is_valid() {
            return Err(Error::new(ErrorKind::MalformedHandshake(format!(
                "coordinates {coordinates} are out of range"
            ))));
        }

        Ok(coordinates)
    }
}

fn parse_component(name: &str, raw: Option<&str>) -> Result<f64, Error> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(Error::new(ErrorKind::MalformedHandshake(format!(
            "{name} is missing"
        ))));
    }

    raw.parse::<f64>().map_err(|e| {
        Error::with_source(
            ErrorKind::MalformedHandshake(format!("{name} {raw:?} is not a number")),
            e,
        )
    })
}

/// Owns one registered session on behalf of its transport.
///
/// Dropping the handle closes the session and removes it from the registry, so
/// tying the handle to the transport stream guarantees cleanup on hang-up.
pub struct SessionHandle {
    id: SessionId,
    state: SessionState,
    registry: Arc<ConnectionRegistry>,
}

impl SessionHandle {
    pub(crate) fn new(id: SessionId, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
            registry,
        }
    }

    pub(crate) fn activate(&mut self) -> Result<(), Error> {
        self.state = self.state.transition(SessionState::Active)?;
        Ok(())
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Close the session. Only an active session is removed from the registry;
    /// closing twice is a no-op. Returns true if this call removed the entry.
    pub fn close(&mut self) -> bool {
        let was_active = self.state == SessionState::Active;
        match self.state.transition(SessionState::Closed) {
            Ok(next) => self.state = next,
            Err(_) => return false,
        }

        if !was_active {
            return false;
        }

        let removed = self.registry.remove(&self.id);
        if removed {
            info!(
                "Session {} closed ({} remaining)",
                self.id,
                self.registry.len()
            );
        } else {
            debug!("Session {} was already removed", self.id);
        }
        removed
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn allowed_transitions() {
        use SessionState::*;
        assert_eq!(Connecting.transition(Active).unwrap(), Active);
        assert_eq!(Connecting.transition(Closed).unwrap(), Closed);
        assert_eq!(Active.transition(Closed).unwrap(), Closed);
    }

    #[test]
    fn closed_is_terminal() {
        use SessionState::*;
        for to in [Connecting, Active, Closed] {
            let err = Closed.transition(to).unwrap_err();
            assert_eq!(
                err.error_kind,
                ErrorKind::InvalidTransition { from: Closed, to }
            );
        }
        assert!(Active.transition(Connecting).is_err());
    }

    #[test]
    fn parses_numeric_handshake() {
        let params = HandshakeParams::new("-23.5505", " -46.6333 ");
        assert_eq!(
            params.coordinates().unwrap(),
            Coordinates::new(-23.5505, -46.6333)
        );
    }

    #[test]
    fn rejects_non_numeric_handshake() {
        let err = HandshakeParams::new("abc", "20").coordinates().unwrap_err();
        assert!(matches!(err.error_kind, ErrorKind::MalformedHandshake(_)));
    }

    #[test]
    fn rejects_missing_handshake_parameters() {
        let params = HandshakeParams {
            latitude: Some("10".to_string()),
            longitude: None,
        };
        let err = params.coordinates().unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::MalformedHandshake("longitude is missing".to_string())
        );

        assert!(HandshakeParams::default().coordinates().is_err());
    }

    #[test]
    fn rejects_out_of_range_and_non_finite_handshake() {
        assert!(HandshakeParams::new("91", "0").coordinates().is_err());
        assert!(HandshakeParams::new("0", "181").coordinates().is_err());
        assert!(HandshakeParams::new("NaN", "0").coordinates().is_err());
        assert!(HandshakeParams::new("inf", "0").coordinates().is_err());
    }

    #[test]
    fn dropping_an_active_handle_removes_the_session() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = SessionId::new();
        registry.add(id.clone(), None, tx).unwrap();

        let mut handle = SessionHandle::new(id.clone(), registry.clone());
        handle.activate().unwrap();
        assert!(registry.contains(&id));

        drop(handle);

        assert!(!registry.contains(&id));
    }

    #[test]
    fn closing_twice_is_a_noop() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = SessionId::new();
        registry.add(id.clone(), None, tx).unwrap();

        let mut handle = SessionHandle::new(id, registry.clone());
        handle.activate().unwrap();

        assert!(handle.close());
        assert!(!handle.close());
        assert_eq!(handle.state(), SessionState::Closed);
        assert!(registry.is_empty());
    }

    #[test]
    fn dropping_a_handle_that_never_activated_leaves_registry_alone() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = SessionId::from("shared");
        registry.add(id.clone(), None, tx).unwrap();

        drop(SessionHandle::new(id.clone(), registry.clone()));

        assert!(registry.contains(&id));
    }
}
