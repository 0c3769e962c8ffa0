//! HTTP surface of DevRadar: the realtime stream clients hold open, plus the
//! thin endpoints collaborators use to list sessions, move them and publish
//! new-dev notifications.

use axum::http::{header, HeaderValue, Method};
use log::*;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub(crate) use service::AppState;

mod controller;
mod error;
mod params;
mod realtime;
mod response;
pub mod router;

pub use error::{Error, Result};

/// Binds the configured address and serves the router until Ctrl-C.
///
/// On shutdown every open realtime stream is dropped, which unregisters its
/// session.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let address = app_state.config.listen_address();
    let cors = cors_layer(&app_state.config.allowed_origins);

    let listener = TcpListener::bind(&address).await?;
    info!("Server starting... listening for connections on http://{address}");

    axum::serve(listener, router::define_routes(app_state.clone()).layer(cors))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        "Server stopped, {} realtime session(s) still registered",
        app_state.presence().connection_count()
    );
    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }
}
