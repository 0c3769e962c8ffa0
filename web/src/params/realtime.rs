use presence::Coordinates;
use serde::Deserialize;
use utoipa::ToSchema;

/// A location reported by a client after its map region changed.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub(crate) struct CoordinatesParams {
    #[schema(example = -23.5505)]
    pub(crate) latitude: f64,
    #[schema(example = -46.6333)]
    pub(crate) longitude: f64,
}

impl From<CoordinatesParams> for Coordinates {
    fn from(params: CoordinatesParams) -> Self {
        Coordinates::new(params.latitude, params.longitude)
    }
}
