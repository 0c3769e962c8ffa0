use crate::controller::{health_check_controller, notification_controller, realtime_controller};
use crate::{params, realtime, response, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "DevRadar Realtime API"
        ),
        paths(
            health_check_controller::health_check,
            notification_controller::create_new_dev,
            realtime::handler::realtime_handler,
            realtime_controller::index,
            realtime_controller::update_coordinates,
        ),
        components(
            schemas(
                params::notification::NewDevParams,
                params::realtime::CoordinatesParams,
                response::realtime::CoordinatesView,
                response::realtime::SessionView,
            )
        ),
        tags(
            (name = "devradar", description = "Realtime presence and new-dev notifications")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(realtime_routes(app_state.clone()))
        .merge(notification_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn realtime_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/realtime", get(realtime::handler::realtime_handler))
        .route("/realtime/connections", get(realtime_controller::index))
        .route(
            "/realtime/{session_id}/coordinates",
            put(realtime_controller::update_coordinates),
        )
        .with_state(app_state)
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/notifications/new-dev",
            post(notification_controller::create_new_dev),
        )
        .with_state(app_state)
}
