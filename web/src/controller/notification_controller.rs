use crate::controller::ApiResponse;
use crate::params::notification::NewDevParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use events::DomainEvent;

use log::*;

/// POST a newly registered dev so that connected clients are notified
#[utoipa::path(
    post,
    path = "/notifications/new-dev",
    request_body = NewDevParams,
    responses(
        (status = 202, description = "Notification accepted for delivery to connected clients"),
        (status = 422, description = "Unprocessable Entity"),
    )
)]
pub async fn create_new_dev(
    State(app_state): State<AppState>,
    Json(params): Json<NewDevParams>,
) -> Result<impl IntoResponse, Error> {
    let coordinates = params.location()?;
    debug!(
        "POST new dev notification at {}",
        coordinates.map_or_else(|| "unknown location".to_string(), |c| c.to_string())
    );

    app_state
        .event_publisher
        .publish(DomainEvent::DevCreated {
            dev: params.dev,
            coordinates,
        })
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::<()>::no_content(StatusCode::ACCEPTED.into())),
    ))
}
