use anyhow::Result;
use colored::Color;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub data: Value,
    pub timestamp: Instant,
}

/// One client holding a single realtime subscription for its whole lifetime.
///
/// Incoming `new-dev` events are appended to `known_devs`, the way the mobile
/// map appends markers, without ever re-subscribing. The underlying client
/// reconnects on stream errors, and the server then opens a new session, so
/// `session_id` follows the latest `connected` event.
pub struct Connection {
    pub label: String,
    pub color: Color,
    pub session_id: String,
    pub known_devs: Vec<Value>,
    event_rx: mpsc::UnboundedReceiver<Event>,
    handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Opens `/realtime` at the given location and waits for the `connected`
    /// event that carries the session id.
    pub async fn establish(
        base_url: &str,
        label: String,
        color: Color,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self> {
        let url = format!(
            "{}/realtime?latitude={}&longitude={}",
            base_url, latitude, longitude
        );
        let (tx, rx) = mpsc::unbounded_channel();

        let client = es::ClientBuilder::for_url(&url)?.build();

        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        if let Ok(data) = serde_json::from_str(&event.data) {
                            let event = Event {
                                event_type: event.event_type,
                                data,
                                timestamp: Instant::now(),
                            };

                            if tx.send(event).is_err() {
                                debug!("Event receiver dropped for {}", task_label);
                                break;
                            }
                        }
                    }
                    Some(Ok(es::SSE::Comment(_))) => {
                        // Ignore comments (keep-alive)
                    }
                    Some(Err(e)) => {
                        warn!(
                            "Realtime stream error for {}: {}, the client will reconnect",
                            task_label, e
                        );
                    }
                    None => {
                        debug!("Realtime stream ended for {}", task_label);
                        break;
                    }
                }
            }
        });

        let mut connection = Self {
            label,
            color,
            session_id: String::new(),
            known_devs: Vec::new(),
            event_rx: rx,
            handle,
        };

        connection
            .wait_for_event("connected", Duration::from_secs(5))
            .await?;

        Ok(connection)
    }

    pub async fn wait_for_event(&mut self, event_type: &str, timeout: Duration) -> Result<Event> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for event: {}", event_type);
            }

            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) => {
                    self.record(&event);
                    if event.event_type == event_type {
                        return Ok(event);
                    }
                }
                Ok(None) => {
                    anyhow::bail!("Realtime connection closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for event: {}", event_type);
                }
            }
        }
    }

    fn record(&mut self, event: &Event) {
        match event.event_type.as_str() {
            "new-dev" => self.known_devs.push(event.data.clone()),
            "connected" => {
                if let Some(id) = event.data["session_id"].as_str() {
                    if !self.session_id.is_empty() && self.session_id != id {
                        warn!(
                            "{} reconnected: session {} replaced {}",
                            self.label, id, self.session_id
                        );
                    }
                    self.session_id = id.to_string();
                }
            }
            _ => {}
        }
    }

    /// Hangs up by dropping the underlying HTTP stream.
    pub fn close(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_connection() -> (Connection, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Connection {
            label: "Client A".to_string(),
            color: Color::BrightBlue,
            session_id: String::new(),
            known_devs: Vec::new(),
            event_rx: rx,
            handle: tokio::spawn(async {}),
        };
        (connection, tx)
    }

    fn event(event_type: &str, data: Value) -> Event {
        Event {
            event_type: event_type.to_string(),
            data,
            timestamp: Instant::now(),
        }
    }

    #[tokio::test]
    async fn later_connected_event_replaces_session_id() {
        let (mut connection, tx) = offline_connection();
        tx.send(event("connected", json!({"session_id": "first"}))).unwrap();
        tx.send(event("connected", json!({"session_id": "second"}))).unwrap();
        tx.send(event("new-dev", json!({"id": "x"}))).unwrap();

        connection
            .wait_for_event("connected", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(connection.session_id, "first");

        connection
            .wait_for_event("new-dev", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(connection.session_id, "second");
        assert_eq!(connection.known_devs, vec![json!({"id": "x"})]);
    }
}
