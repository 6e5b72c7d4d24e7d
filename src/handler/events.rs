// handler/events.rs
use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::Query,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Extension, Json, Router,
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use validator::Validate;

use crate::{
    dtos::marketdtos::{ApiResponse, EventQueryDto},
    error::HttpError,
    AppState,
};

pub fn events_handler() -> Router {
    Router::new()
        .route("/", get(list_events))
        .route("/stream", get(stream_events))
}

/// Durable log, read forward from a sequence cursor.
pub async fn list_events(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<EventQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let events = app_state
        .event_service
        .events_since(params.after.unwrap_or(0), params.limit.unwrap_or(100))
        .await?;

    Ok(Json(ApiResponse::success("Events retrieved successfully", events)))
}

/// Live feed of committed events. Subscribers that fall behind skip ahead and
/// can backfill from the durable log.
pub async fn stream_events(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = app_state.event_stream.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(record) => {
                    let event = Event::default()
                        .event(record.event.kind())
                        .id(record.sequence.to_string())
                        .json_data(&record)
                        .unwrap_or_else(|_| Event::default().comment("unencodable event"));
                    return Some((Ok::<_, Infallible>(event), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
