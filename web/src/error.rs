use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;

use presence::{Error as PresenceError, ErrorKind as PresenceErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(PresenceError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            PresenceErrorKind::UnknownSession(_) => StatusCode::NOT_FOUND,
            PresenceErrorKind::MalformedHandshake(_) | PresenceErrorKind::InvalidCoordinates(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PresenceErrorKind::DuplicateSessionId(_) => StatusCode::CONFLICT,
            PresenceErrorKind::StaleSessionDispatch(_) => StatusCode::GONE,
            PresenceErrorKind::InvalidTransition { .. } | PresenceErrorKind::Serialization => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self.0);
        } else {
            debug!("{}", self.0);
        }

        let reason = status.canonical_reason().unwrap_or("ERROR").to_uppercase();
        (status, reason).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<PresenceError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence::SessionId;

    fn status_of(kind: PresenceErrorKind) -> StatusCode {
        Error::from(PresenceError::new(kind)).into_response().status()
    }

    #[test]
    fn presence_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(PresenceErrorKind::UnknownSession(SessionId::from("a"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(PresenceErrorKind::InvalidCoordinates("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(PresenceErrorKind::DuplicateSessionId(SessionId::from("a"))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(PresenceErrorKind::StaleSessionDispatch(SessionId::from("a"))),
            StatusCode::GONE
        );
        assert_eq!(
            status_of(PresenceErrorKind::Serialization),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
