use crate::{AppState, Error};
use async_stream::stream;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use presence::HandshakeParams;
use std::convert::Infallible;

/// GET a long-lived realtime stream of events for a client at a location.
///
/// The handshake coordinates are optional: a client without location
/// permission, or one sending garbage, still connects and simply has no
/// location on record. The first event on the stream is `connected`, carrying
/// the session id the client needs to report region changes.
#[utoipa::path(
    get,
    path = "/realtime",
    params(
        ("latitude" = Option<String>, Query, description = "Client latitude in decimal degrees"),
        ("longitude" = Option<String>, Query, description = "Client longitude in decimal degrees"),
    ),
    responses(
        (status = 200, description = "Event stream opened (text/event-stream)"),
        (status = 409, description = "Session id collision"),
    )
)]
pub(crate) async fn realtime_handler(
    State(app_state): State<AppState>,
    params: Result<Query<HandshakeParams>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!("Unreadable realtime handshake ({rejection}), connecting without location");
            HandshakeParams::default()
        }
    };

    let (session, mut rx) = app_state.presence_manager.connect(&params)?;
    debug!("Establishing realtime stream for session {}", session.id());

    // The stream owns the session handle: when the client goes away the
    // response body is dropped, and with it the handle, which unregisters it.
    let stream = stream! {
        let session = session;
        while let Some(envelope) = rx.recv().await {
            yield Ok::<_, Infallible>(Event::from(envelope));
        }
        debug!("Realtime channel for session {} closed", session.id());
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new().interval(app_state.config.realtime_keep_alive()),
    ))
}
