//! Realtime presence and proximity notifications.
//!
//! This crate keeps track of every connected client and its last known
//! location, and pushes events to the clients an event is relevant to.
//!
//! # Architecture
//!
//! - **Session registry**: `ConnectionRegistry` maps server-generated session
//!   ids to coordinates and an outbound channel, backed by a `DashMap`.
//! - **Lifecycle**: `Manager::connect` parses handshake coordinates and returns
//!   a `SessionHandle`. The handle is owned by the transport stream, and dropping
//!   it removes the session, so a hang-up can never leave a stale entry behind.
//! - **Proximity**: `ProximityPolicy` picks recipients. The default sends new-dev
//!   events to everyone connected; a radius policy is available as an opt-in.
//! - **Dispatch**: events are queued per session on unbounded channels, so a
//!   slow client never blocks the others and each client sees events in the
//!   order they were dispatched to it.
//! - **Ephemeral messages**: clients that are offline miss events and catch up
//!   through the regular search endpoint.
//!
//! # Message Flow
//!
//! 1. Client opens `/realtime?latitude=..&longitude=..`
//! 2. `Manager::connect` registers the session and queues a `connected` frame
//! 3. A new dev is created and `DomainEvent::DevCreated` is published
//! 4. `PresenceEventHandler` asks the manager for relevant sessions
//! 5. The manager sends a `new-dev` frame to each of them by id
//!
//! # Example: notifying sessions directly
//!
//! ```rust,ignore
//! let targets = app_state.presence_manager.relevant_sessions(Some(dev_location));
//! app_state
//!     .presence_manager
//!     .notify(&targets, presence::message::NEW_DEV, &dev_json)?;
//! ```
//!
//! # Modules
//!
//! - `connection`: session registry and type-safe `SessionId`
//! - `session`: handshake parsing, `SessionState` and `SessionHandle`
//! - `proximity`: recipient selection and haversine distance
//! - `manager`: lifecycle operations and dispatch
//! - `message`: event types and the wire `Envelope`
//! - `domain_event_handler`: bridge from `events::DomainEvent`

pub mod connection;
pub mod domain_event_handler;
pub mod error;
pub mod manager;
pub mod message;
pub mod proximity;
pub mod session;

pub use connection::{SessionId, SessionSummary};
pub use domain_event_handler::PresenceEventHandler;
pub use error::{Error, ErrorKind};
pub use events::Coordinates;
pub use manager::{DispatchReport, Manager};
pub use proximity::ProximityPolicy;
pub use session::{HandshakeParams, SessionHandle, SessionState};
