//! Per-incident SSE streams
//!
//! Each connection gets its own bounded channel from the registry; the
//! stream owns the subscription guard, so closing the connection (or
//! being dropped for lagging) unregisters the viewer.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, warn};

use crate::state::AppContext;

/// GET /api/incidents/:id/events - Live event stream for one incident
pub async fn incident_events(
    State(ctx): State<AppContext>,
    Path(incident_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE viewer for incident {}", incident_id);

    let (guard, mut rx) = ctx.registry.subscribe(&incident_id);

    let stream = async_stream::stream! {
        // Holds the registration for as long as the client reads.
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            match Event::default().event(event.event_type()).json_data(&event) {
                Ok(sse_event) => yield Ok(sse_event),
                Err(e) => warn!("Failed to serialize event: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
