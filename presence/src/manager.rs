use crate::connection::{ConnectionRegistry, SessionId, SessionSender, SessionSummary};
use crate::error::{Error, ErrorKind};
use crate::message::{Envelope, Event, Message, MessageScope};
use crate::proximity::ProximityPolicy;
use crate::session::{HandshakeParams, SessionHandle};
use events::Coordinates;
use log::*;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Recipients whose channel accepted the event.
    pub delivered: usize,
    /// Recipients whose transport had closed; they were removed.
    pub stale: Vec<SessionId>,
    /// Target ids that were not registered.
    pub missing: Vec<SessionId>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.stale.is_empty() && self.missing.is_empty()
    }
}

/// Owns the session registry and every operation on it.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
    policy: ProximityPolicy,
}

impl Manager {
    pub fn new() -> Self {
        Self::with_policy(ProximityPolicy::default())
    }

    pub fn with_policy(policy: ProximityPolicy) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            policy,
        }
    }

    pub fn policy(&self) -> ProximityPolicy {
        self.policy
    }

    /// Open a session from handshake parameters.
    ///
    /// Malformed coordinates are logged and the session is registered without a
    /// location. The first frame on the returned receiver is `connected`.
    pub fn connect(
        &self,
        params: &HandshakeParams,
    ) -> Result<(SessionHandle, UnboundedReceiver<Envelope>), Error> {
        let coordinates = match params.coordinates() {
            Ok(coordinates) => Some(coordinates),
            Err(e) => {
                warn!("Accepting realtime connection without location: {}", e);
                None
            }
        };

        let id = SessionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Envelope::from_event(&Event::Connected {
            session_id: id.clone(),
            coordinates,
        })?)
        .map_err(|e| Error::with_source(ErrorKind::StaleSessionDispatch(id.clone()), e))?;

        let mut handle = SessionHandle::new(id.clone(), Arc::clone(&self.registry));
        self.register_connection(id, coordinates, tx)?;
        handle.activate()?;

        Ok((handle, rx))
    }

    /// Register a session under a caller-chosen id.
    pub fn register_connection(
        &self,
        id: SessionId,
        coordinates: Option<Coordinates>,
        sender: SessionSender,
    ) -> Result<(), Error> {
        self.registry.add(id.clone(), coordinates, sender)?;
        info!(
            "Registered realtime session {} at {} ({} connected)",
            id,
            coordinates.map_or_else(|| "unknown location".to_string(), |c| c.to_string()),
            self.registry.len()
        );
        Ok(())
    }

    /// Remove a session. Absent ids are ignored.
    pub fn remove_connection(&self, id: &SessionId) -> bool {
        let removed = self.registry.remove(id);
        if removed {
            info!("Unregistered realtime session {}", id);
        }
        removed
    }

    /// Replace a session's coordinates after a region change on the client.
    pub fn update_coordinates(&self, id: &SessionId, coordinates: Coordinates) -> Result<(), Error> {
        if !coordinates.is_valid() {
            return Err(Error::new(ErrorKind::InvalidCoordinates(format!(
                "{coordinates} is out of range"
            ))));
        }
        self.registry.update_coordinates(id, Some(coordinates))?;
        debug!("Session {} moved to {}", id, coordinates);
        Ok(())
    }

    pub fn list_connections(&self) -> Vec<SessionSummary> {
        self.registry.all()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Sessions the configured policy considers relevant to an event at `target`.
    pub fn relevant_sessions(&self, target: Option<Coordinates>) -> HashSet<SessionId> {
        self.policy.select(&self.registry.all(), target)
    }

    /// Deliver `payload` tagged `event_type` to each target session.
    ///
    /// Unknown and stale recipients are skipped and reported; they never stop
    /// delivery to the rest.
    pub fn notify(
        &self,
        target_ids: &HashSet<SessionId>,
        event_type: &str,
        payload: &Value,
    ) -> Result<DispatchReport, Error> {
        let envelope = Envelope::new(event_type, payload)?;
        Ok(self.dispatch(target_ids.iter(), envelope))
    }

    /// Send a typed message based on its scope
    pub fn send_message(&self, message: Message) -> Result<DispatchReport, Error> {
        let envelope = Envelope::from_event(&message.event).map_err(|e| {
            error!("Failed to serialize realtime event: {e}");
            e
        })?;

        let report = match message.scope {
            MessageScope::Sessions { session_ids } => self.dispatch(session_ids.iter(), envelope),
            MessageScope::Broadcast => self.dispatch(self.registry.ids().iter(), envelope),
        };
        Ok(report)
    }

    fn dispatch<'a>(
        &self,
        targets: impl Iterator<Item = &'a SessionId>,
        envelope: Envelope,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for id in targets {
            match self.registry.send_to(id, envelope.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => match e.error_kind {
                    ErrorKind::StaleSessionDispatch(id) => report.stale.push(id),
                    ErrorKind::UnknownSession(id) => {
                        debug!("Skipping {} event for unknown session {}", envelope.event_type, id);
                        report.missing.push(id)
                    }
                    other => warn!("Unexpected dispatch failure: {}", other),
                },
            }
        }

        debug!(
            "Dispatched {} to {} session(s), {} stale, {} missing",
            envelope.event_type,
            report.delivered,
            report.stale.len(),
            report.missing.len()
        );
        report
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
