use config::Config;
use events::EventPublisher;
use log::info;
use presence::{Manager, PresenceEventHandler};
use std::sync::Arc;

pub mod config;
pub mod logging;

// Service-level state shared by every request handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub presence_manager: Arc<Manager>,
    pub event_publisher: EventPublisher,
}

impl AppState {
    /// Builds the presence manager from `config` and wires it to the event
    /// publisher so that published domain events reach connected clients.
    pub fn new(app_config: Config) -> Self {
        let policy = app_config.proximity_policy();
        info!("Realtime push policy: {policy}");

        let presence_manager = Arc::new(Manager::with_policy(policy));
        let event_publisher = EventPublisher::new().with_handler(Arc::new(
            PresenceEventHandler::new(Arc::clone(&presence_manager)),
        ));

        Self {
            config: app_config,
            presence_manager,
            event_publisher,
        }
    }

    pub fn presence(&self) -> &Manager {
        self.presence_manager.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use presence::ProximityPolicy;

    #[test]
    fn app_state_applies_configured_policy_and_registers_handler() {
        let config = Config::parse_from(["devradar", "--push-radius-km", "25"]);

        let state = AppState::new(config);

        assert_eq!(
            state.presence().policy(),
            ProximityPolicy::WithinRadius { km: 25.0 }
        );
        assert_eq!(state.event_publisher.handler_count(), 1);
    }

    #[test]
    fn clones_share_one_registry() {
        let state = AppState::new(Config::parse_from(["devradar"]));
        let clone = state.clone();

        assert!(Arc::ptr_eq(&state.presence_manager, &clone.presence_manager));
    }
}
