use crate::controller::ApiResponse;
use crate::params::realtime::CoordinatesParams;
use crate::response::realtime::SessionView;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use presence::SessionId;

use log::*;

/// GET every realtime session currently connected
#[utoipa::path(
    get,
    path = "/realtime/connections",
    responses(
        (status = 200, description = "Successfully listed connected realtime sessions", body = [SessionView]),
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let sessions: Vec<SessionView> = app_state
        .presence()
        .list_connections()
        .into_iter()
        .map(SessionView::from)
        .collect();

    debug!("Found {} connected realtime sessions", sessions.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), sessions)))
}

/// PUT the new location of a connected session after its map region changed
#[utoipa::path(
    put,
    path = "/realtime/{session_id}/coordinates",
    params(
        ("session_id" = String, Path, description = "Session id from the stream's connected event")
    ),
    request_body = CoordinatesParams,
    responses(
        (status = 204, description = "Successfully updated the session's coordinates"),
        (status = 404, description = "Session not connected"),
        (status = 422, description = "Coordinates out of range"),
    )
)]
pub async fn update_coordinates(
    State(app_state): State<AppState>,
    Path(session_id): Path<String>,
    Json(params): Json<CoordinatesParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT coordinates for session {session_id}: {params:?}");

    app_state
        .presence()
        .update_coordinates(&SessionId::from(session_id), params.into())?;

    Ok(StatusCode::NO_CONTENT)
}
