use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{
    error::AppError,
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

/// Query parameters of the host stream. EventSource clients cannot set
/// headers, so the host key travels as a query parameter here.
#[derive(Debug, Deserialize, IntoParams)]
pub struct HostStreamQuery {
    /// Host key of the room.
    pub host_key: String,
}

#[utoipa::path(
    get,
    path = "/rooms/{code}/sse",
    tag = "sse",
    params(("code" = String, Path, description = "Join code of the room")),
    responses((status = 200, description = "Room event stream", content_type = "text/event-stream", body = String))
)]
/// Stream room snapshots and phase changes to any client of the room.
pub async fn public_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let code = code.to_uppercase();
    let receiver = sse_service::subscribe_public(&state, &code);
    info!(room_code = %code, "new public SSE connection");
    sse_service::to_sse_stream(receiver, StreamKind::Public)
}

#[utoipa::path(
    get,
    path = "/rooms/{code}/sse/host",
    tag = "sse",
    params(
        ("code" = String, Path, description = "Join code of the room"),
        HostStreamQuery
    ),
    responses(
        (status = 200, description = "Host event stream", content_type = "text/event-stream", body = String),
        (status = 403, description = "Host key mismatch"),
        (status = 409, description = "Another host stream is already attached")
    )
)]
/// Stream host-only events. Attaching claims the room's single host slot
/// and spawns the auto-advance coordinator for the life of the stream.
pub async fn host_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<HostStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let code = code.to_uppercase();
    let (receiver, token) = sse_service::subscribe_host(&state, &code, &query.host_key).await?;
    info!(room_code = %code, "new host SSE connection");
    sse_service::broadcast_host_handshake(&state, &code, &token);
    Ok(sse_service::to_sse_stream(
        receiver,
        StreamKind::Host {
            state,
            room_code: code,
            token,
        },
    ))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rooms/{code}/sse", get(public_stream))
        .route("/rooms/{code}/sse/host", get(host_stream))
}
