use chrono::{DateTime, Utc};
use presence::SessionSummary;
use serde::Serialize;
use utoipa::ToSchema;

/// Location part of a session listing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub(crate) struct CoordinatesView {
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

/// One connected realtime session
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub(crate) struct SessionView {
    #[schema(example = "3f1c7a52-5f0e-4d8e-9b87-0d0d0a3b7e11")]
    pub(crate) id: String,
    /// Absent when the client connected without a usable location
    pub(crate) coordinates: Option<CoordinatesView>,
    pub(crate) connected_at: DateTime<Utc>,
}

impl From<SessionSummary> for SessionView {
    fn from(summary: SessionSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            coordinates: summary.coordinates.map(|c| CoordinatesView {
                latitude: c.latitude,
                longitude: c.longitude,
            }),
            connected_at: summary.connected_at,
        }
    }
}
