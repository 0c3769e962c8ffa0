use super::realtime::CoordinatesParams;
use log::*;
use presence::{Coordinates, Error, ErrorKind};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

/// A dev record that was just created by the search/persistence collaborator.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct NewDevParams {
    /// The dev record, forwarded to clients unchanged.
    #[schema(value_type = Object, example = json!({
        "github_username": "octocat",
        "name": "The Octocat",
        "bio": "Loves maps",
        "techs": ["Rust", "React Native"],
        "avatar_url": "https://avatars.example/octocat.png",
        "location": {"type": "Point", "coordinates": [-46.6333, -23.5505]}
    }))]
    pub(crate) dev: Value,
    /// Where the dev is. Defaults to the dev's GeoJSON `location` point.
    pub(crate) coordinates: Option<CoordinatesParams>,
}

impl NewDevParams {
    /// The dev's location, used as the target of proximity filtering.
    ///
    /// Explicit `coordinates` win and must be in range. Otherwise the GeoJSON
    /// point at `dev.location.coordinates` (`[longitude, latitude, ..]`) is used
    /// when it is usable; the dev record itself is never grounds for rejection.
    pub(crate) fn location(&self) -> Result<Option<Coordinates>, Error> {
        if let Some(params) = self.coordinates {
            let coordinates = Coordinates::from(params);
            if !coordinates.is_valid() {
                return Err(Error::new(ErrorKind::InvalidCoordinates(format!(
                    "dev location {coordinates} is out of range"
                ))));
            }
            return Ok(Some(coordinates));
        }

        match geojson_point(&self.dev) {
            Some(c) if !c.is_valid() => {
                warn!("Ignoring out of range location {c} in new dev record");
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

fn geojson_point(dev: &Value) -> Option<Coordinates> {
    let point = dev.get("location")?.get("coordinates")?.as_array()?;
    match point.as_slice() {
        [longitude, latitude, ..] => {
            Some(Coordinates::new(latitude.as_f64()?, longitude.as_f64()?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(body: Value) -> NewDevParams {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn explicit_coordinates_take_precedence() {
        let params = params(json!({
            "dev": {"location": {"type": "Point", "coordinates": [1.0, 2.0]}},
            "coordinates": {"latitude": 10.0, "longitude": 20.0}
        }));

        assert_eq!(params.location().unwrap(), Some(Coordinates::new(10.0, 20.0)));
    }

    #[test]
    fn geojson_location_is_longitude_first() {
        let params = params(json!({
            "dev": {"location": {"type": "Point", "coordinates": [-46.6333, -23.5505]}}
        }));

        assert_eq!(
            params.location().unwrap(),
            Some(Coordinates::new(-23.5505, -46.6333))
        );
    }

    #[test]
    fn dev_without_location_has_no_target() {
        let no_location = params(json!({"dev": {"id": "x"}}));
        assert_eq!(no_location.location().unwrap(), None);

        let bad_point = params(json!({"dev": {"location": {"coordinates": ["a", "b", "c"]}}}));
        assert_eq!(bad_point.location().unwrap(), None);
    }

    #[test]
    fn out_of_range_location_is_rejected() {
        let params = params(json!({
            "dev": {},
            "coordinates": {"latitude": 95.0, "longitude": 0.0}
        }));

        let err = params.location().unwrap_err();
        assert!(matches!(err.error_kind, ErrorKind::InvalidCoordinates(_)));
    }

    #[test]
    fn out_of_range_dev_location_means_no_target() {
        let params = params(json!({
            "dev": {"id": "x", "location": {"type": "Point", "coordinates": [200.0, 10.0]}}
        }));

        assert_eq!(params.location().unwrap(), None);
    }

    #[test]
    fn geojson_position_with_altitude_is_accepted() {
        let params = params(json!({
            "dev": {"location": {"type": "Point", "coordinates": [-38.52, -3.73, 21.0]}}
        }));

        assert_eq!(
            params.location().unwrap(),
            Some(Coordinates::new(-3.73, -38.52))
        );
    }
}
