use crate::message::{Event as PresenceEvent, Message, MessageScope};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by pushing realtime notifications to the sessions the
/// manager's proximity policy considers relevant.
///
/// Unlike user-scoped notifications, the emitter does not choose recipients:
/// whoever is connected at the time of the event (and, with a radius policy,
/// close enough to it) is notified.
pub struct PresenceEventHandler {
    manager: Arc<Manager>,
}

impl PresenceEventHandler {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl EventHandler for PresenceEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::DevCreated { dev, coordinates } => {
                let session_ids = self.manager.relevant_sessions(*coordinates);
                if session_ids.is_empty() {
                    debug!(
                        "No realtime sessions relevant to new dev ({})",
                        self.manager.policy()
                    );
                    return;
                }

                let message = Message {
                    event: PresenceEvent::NewDev(dev.clone()),
                    scope: MessageScope::Sessions { session_ids },
                };

                match self.manager.send_message(message) {
                    Ok(report) => debug!(
                        "Notified {} session(s) of new dev, {} stale",
                        report.delivered,
                        report.stale.len()
                    ),
                    Err(e) => error!("Failed to notify sessions of new dev: {e}"),
                }
            }
        }
    }
}
