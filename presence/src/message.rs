use crate::connection::SessionId;
use crate::error::Error;
use events::Coordinates;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Trait for getting the wire event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Events the presence layer pushes on its own behalf.
///
/// Serialized untagged: the event type travels as the SSE `event:` name, so
/// `data:` carries only the payload. A `NewDev` payload is the dev record exactly
/// as the collaborator supplied it.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Event {
    /// First frame on every connection, tells the client its session id.
    Connected {
        session_id: SessionId,
        coordinates: Option<Coordinates>,
    },
    /// A new dev registered.
    NewDev(Value),
}

pub const CONNECTED: &str = "connected";
pub const NEW_DEV: &str = "new-dev";

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Connected { .. } => CONNECTED,
            Event::NewDev(_) => NEW_DEV,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to each listed session's own connection
    Sessions { session_ids: HashSet<SessionId> },
    /// Send to every session registered at dispatch time
    Broadcast,
}

/// One outbound frame queued on a session's channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event_type: String,
    /// JSON text of the payload.
    pub data: String,
}

impl Envelope {
    pub fn new(event_type: impl Into<String>, payload: &Value) -> Result<Self, Error> {
        Ok(Self {
            event_type: event_type.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    pub fn from_event(event: &Event) -> Result<Self, Error> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: serde_json::to_string(event)?,
        })
    }

    /// Parses `data` back into JSON.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

impl From<Envelope> for axum::response::sse::Event {
    fn from(envelope: Envelope) -> Self {
        axum::response::sse::Event::default()
            .event(envelope.event_type)
            .data(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_dev_payload_is_passed_through_unchanged() {
        let dev = json!({
            "github_username": "octocat",
            "name": "The Octocat",
            "bio": null,
            "techs": ["Rust", "React Native"],
            "location": {"type": "Point", "coordinates": [-46.63, -23.55]},
            "avatar_url": "https://avatars.example/octocat.png"
        });

        let envelope = Envelope::from_event(&Event::NewDev(dev.clone())).unwrap();

        assert_eq!(envelope.event_type, "new-dev");
        assert_eq!(envelope.payload().unwrap(), dev);
    }

    #[test]
    fn connected_event_carries_session_id_and_coordinates() {
        let event = Event::Connected {
            session_id: SessionId::from("s-1"),
            coordinates: Some(Coordinates::new(10.0, 20.0)),
        };

        let envelope = Envelope::from_event(&event).unwrap();

        assert_eq!(envelope.event_type, "connected");
        assert_eq!(
            envelope.payload().unwrap(),
            json!({"session_id": "s-1", "coordinates": {"latitude": 10.0, "longitude": 20.0}})
        );
    }

    #[test]
    fn connected_event_without_coordinates_serializes_null() {
        let event = Event::Connected {
            session_id: SessionId::from("s-2"),
            coordinates: None,
        };

        let envelope = Envelope::from_event(&event).unwrap();

        assert_eq!(
            envelope.payload().unwrap(),
            json!({"session_id": "s-2", "coordinates": null})
        );
    }

    #[test]
    fn envelope_with_arbitrary_type_keeps_payload() {
        let envelope = Envelope::new("dev-updated", &json!({"id": "x"})).unwrap();
        assert_eq!(envelope.event_type, "dev-updated");
        assert_eq!(envelope.data, r#"{"id":"x"}"#);
    }
}
