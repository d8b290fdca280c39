use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    dto::sse::{HostHandshake, ServerEvent},
    error::ServiceError,
    services::{coordinator, game_service, room_service},
    state::{HostSession, SharedState},
};

/// Subscribe to a room's public stream.
pub fn subscribe_public(state: &SharedState, room_code: &str) -> broadcast::Receiver<ServerEvent> {
    state.hubs().channels(room_code).public().subscribe()
}

/// Subscribe to a room's host stream.
///
/// The host key is verified against the room, a single attachment slot is
/// claimed, and the auto-advance coordinator is spawned for the lifetime of
/// this stream. A second host connection is refused while the slot is held.
pub async fn subscribe_host(
    state: &SharedState,
    room_code: &str,
    host_key: &str,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let room = room_service::find_room(state, room_code).await?;
    game_service::verify_host(&room, host_key)?;

    let channels = state.hubs().channels(&room.room_code);
    let mut slot = channels.host().session().lock().await;
    if slot.is_some() {
        return Err(ServiceError::Conflict(
            "another host stream is already attached to this room".into(),
        ));
    }

    let token = Uuid::new_v4().simple().to_string();
    let coordinator = tokio::spawn(coordinator::run(
        state.clone(),
        room.room_code.clone(),
        host_key.to_string(),
    ));
    slot.replace(HostSession {
        token: token.clone(),
        coordinator,
    });
    drop(slot);

    let receiver = channels.host().hub().subscribe();
    Ok((receiver, token))
}

/// Identifies the target SSE stream so stream teardown can release
/// per-stream resources.
#[derive(Clone)]
pub enum StreamKind {
    /// A player-facing stream; nothing to release.
    Public,
    /// A host stream; teardown frees the attachment slot (which aborts the
    /// coordinator) once the spawned forwarder finishes.
    Host {
        /// Shared state used to find the slot again at teardown.
        state: SharedState,
        /// Room whose slot was claimed.
        room_code: String,
        /// Token proving this stream owns the slot.
        token: String,
    },
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive;
                            // the next room snapshot resynchronizes the client.
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Public => tracing::info!("public SSE stream disconnected"),
            StreamKind::Host {
                state,
                room_code,
                token,
            } => {
                release_host_session(state, &room_code, &token).await;
                tracing::info!(room_code = %room_code, "host SSE stream disconnected");
            }
        }
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Send the attachment token to the freshly connected host stream.
pub fn broadcast_host_handshake(state: &SharedState, room_code: &str, token: &str) {
    let Some(channels) = state.hubs().existing(room_code) else {
        return;
    };
    if let Ok(event) = ServerEvent::json(
        Some("host_token".to_string()),
        &HostHandshake {
            token: token.to_string(),
        },
    ) {
        channels.host().hub().broadcast(event);
    }
}

/// Free the host slot if this stream still owns it. Dropping the session
/// aborts the coordinator task bound to it.
async fn release_host_session(state: SharedState, room_code: &str, token: &str) {
    let Some(channels) = state.hubs().existing(room_code) else {
        return;
    };
    let mut slot = channels.host().session().lock().await;
    if slot.as_ref().is_some_and(|session| session.token == token) {
        slot.take();
    }
}
