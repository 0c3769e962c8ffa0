use crate::error::{Error, ErrorKind};
use crate::message::Envelope;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use events::Coordinates;
use log::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Sending half of a session's outbound channel.
pub type SessionSender = UnboundedSender<Envelope>;

/// Unique identifier for a session (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Read-only view of a registered session, safe to hold without any lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub coordinates: Option<Coordinates>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ConnectionInfo {
    coordinates: Option<Coordinates>,
    connected_at: DateTime<Utc>,
    sender: SessionSender,
}

/// Registry of live sessions keyed by session id.
///
/// Every operation is atomic per entry; snapshots are copies so callers never
/// hold a shard lock while sending.
pub struct ConnectionRegistry {
    connections: DashMap<SessionId, ConnectionInfo>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a session. Rejects an id that is already present and leaves
    /// the existing entry untouched.
    pub fn add(
        &self,
        id: SessionId,
        coordinates: Option<Coordinates>,
        sender: SessionSender,
    ) -> Result<(), Error> {
        match self.connections.entry(id) {
            Entry::Occupied(entry) => {
                warn!("Rejecting duplicate session id {}", entry.key());
                Err(Error::new(ErrorKind::DuplicateSessionId(entry.key().clone())))
            }
            Entry::Vacant(entry) => {
                entry.insert(ConnectionInfo {
                    coordinates,
                    connected_at: Utc::now(),
                    sender,
                });
                Ok(())
            }
        }
    }

    /// Remove a session. Returns false if it was already gone.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Replace the coordinates of a registered session.
    pub fn update_coordinates(
        &self,
        id: &SessionId,
        coordinates: Option<Coordinates>,
    ) -> Result<(), Error> {
        match self.connections.get_mut(id) {
            Some(mut info) => {
                info.coordinates = coordinates;
                Ok(())
            }
            None => Err(Error::new(ErrorKind::UnknownSession(id.clone()))),
        }
    }

    /// Snapshot of every registered session.
    pub fn all(&self) -> Vec<SessionSummary> {
        self.connections
            .iter()
            .map(|entry| SessionSummary {
                id: entry.key().clone(),
                coordinates: entry.value().coordinates,
                connected_at: entry.value().connected_at,
            })
            .collect()
    }

    /// Ids of every registered session.
    pub fn ids(&self) -> Vec<SessionId> {
        self.connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionSummary> {
        self.connections.get(id).map(|info| SessionSummary {
            id: id.clone(),
            coordinates: info.coordinates,
            connected_at: info.connected_at,
        })
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queue an envelope on one session's channel - O(1), never blocks.
    ///
    /// A closed channel means the transport is gone: the entry is removed
    /// before the error is returned.
    pub fn send_to(&self, id: &SessionId, envelope: Envelope) -> Result<(), Error> {
        // The shard guard must be released before a removal on the same key.
        let result = match self.connections.get(id) {
            Some(info) => info.sender.send(envelope),
            None => return Err(Error::new(ErrorKind::UnknownSession(id.clone()))),
        };

        if let Err(e) = result {
            warn!(
                "Failed to send event to session {}: {}. Removing stale session.",
                id, e
            );
            self.connections.remove(id);
            return Err(Error::with_source(
                ErrorKind::StaleSessionDispatch(id.clone()),
                e,
            ));
        }

        Ok(())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn envelope() -> Envelope {
        Envelope::new("new-dev", &json!({"id": "x"})).unwrap()
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn add_rejects_duplicate_ids_and_keeps_original() {
        let registry = ConnectionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let id = SessionId::from("dup");

        registry
            .add(id.clone(), Some(Coordinates::new(1.0, 1.0)), tx1)
            .unwrap();
        let err = registry.add(id.clone(), None, tx2).unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::DuplicateSessionId(id.clone()));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&id).unwrap().coordinates,
            Some(Coordinates::new(1.0, 1.0))
        );

        registry.send_to(&id, envelope()).unwrap();
        assert_eq!(rx1.try_recv().unwrap(), envelope());
    }

    #[test]
    fn remove_is_a_noop_for_absent_ids() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = SessionId::new();
        registry.add(id.clone(), None, tx).unwrap();

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_later_mutations() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = SessionId::new();
        registry
            .add(id.clone(), Some(Coordinates::new(10.0, 20.0)), tx)
            .unwrap();

        let snapshot = registry.all();
        registry.remove(&id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        assert!(registry.all().is_empty());
    }

    #[test]
    fn update_coordinates_replaces_location() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = SessionId::new();
        registry.add(id.clone(), None, tx).unwrap();

        registry
            .update_coordinates(&id, Some(Coordinates::new(-3.7, -38.5)))
            .unwrap();

        assert_eq!(
            registry.get(&id).unwrap().coordinates,
            Some(Coordinates::new(-3.7, -38.5))
        );
    }

    #[test]
    fn update_coordinates_for_unknown_session_fails() {
        let registry = ConnectionRegistry::new();
        let id = SessionId::from("ghost");

        let err = registry
            .update_coordinates(&id, Some(Coordinates::new(0.0, 0.0)))
            .unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::UnknownSession(id));
    }

    #[test]
    fn send_to_closed_channel_removes_stale_session() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SessionId::new();
        registry.add(id.clone(), None, tx).unwrap();
        drop(rx);

        let err = registry.send_to(&id, envelope()).unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::StaleSessionDispatch(id.clone()));
        assert!(!registry.contains(&id));
    }

    #[test]
    fn send_to_unknown_session_reports_it() {
        let registry = ConnectionRegistry::new();
        let id = SessionId::from("nobody");

        let err = registry.send_to(&id, envelope()).unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::UnknownSession(id));
    }
}
