//! Selection of the sessions an event is relevant to.
//!
//! New-dev pushes go to every connected session by default. Only pull search
//! (owned by the search collaborator) filters by radius and techs.
//! `WithinRadius` is an opt-in extension for bounded pushes.

use crate::connection::{SessionId, SessionSummary};
use events::Coordinates;
use std::collections::HashSet;
use std::fmt;

/// Mean Earth radius in kilometers (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProximityPolicy {
    /// Every registered session, with or without coordinates.
    #[default]
    BroadcastAll,
    /// Sessions whose coordinates lie within `km` of the event's location.
    WithinRadius { km: f64 },
}

impl ProximityPolicy {
    /// `None` keeps the broadcast-all behavior.
    pub fn from_radius_km(radius_km: Option<f64>) -> Self {
        match radius_km {
            Some(km) => ProximityPolicy::WithinRadius { km },
            None => ProximityPolicy::BroadcastAll,
        }
    }

    /// Whether a session at `session` should hear about an event at `target`.
    pub fn is_relevant(&self, session: Option<Coordinates>, target: Option<Coordinates>) -> bool {
        match self {
            ProximityPolicy::BroadcastAll => true,
            ProximityPolicy::WithinRadius { km } => match (session, target) {
                (Some(session), Some(target)) => haversine_km(session, target) <= *km,
                _ => false,
            },
        }
    }

    pub fn select(
        &self,
        snapshot: &[SessionSummary],
        target: Option<Coordinates>,
    ) -> HashSet<SessionId> {
        snapshot
            .iter()
            .filter(|session| self.is_relevant(session.coordinates, target))
            .map(|session| session.id.clone())
            .collect()
    }
}

impl fmt::Display for ProximityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProximityPolicy::BroadcastAll => write!(f, "broadcast-all"),
            ProximityPolicy::WithinRadius { km } => write!(f, "within {km} km"),
        }
    }
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
