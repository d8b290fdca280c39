use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        common::RoomSnapshot,
        play::ScavengerSummary,
        sse::{
            AnswerReceivedEvent, HostWaitingEvent, PhaseChangedEvent, RoomChangedEvent,
            ScavengerChangedEvent, ServerEvent,
        },
    },
    state::SharedState,
};

const EVENT_ROOM_CHANGED: &str = "room_changed";
const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_ANSWER_RECEIVED: &str = "answer_received";
const EVENT_SCAVENGER_CHANGED: &str = "scavenger_changed";
const EVENT_HOST_WAITING: &str = "host_waiting";

/// Broadcast a fresh room snapshot to every subscriber of the room.
///
/// The payload is the same snapshot the REST poll returns; clients apply it
/// through one idempotent path regardless of which channel delivered it.
pub fn broadcast_room_changed(state: &SharedState, snapshot: &RoomSnapshot) {
    let payload = RoomChangedEvent(snapshot.clone());
    send_public_event(state, &snapshot.room_code, EVENT_ROOM_CHANGED, &payload);
}

/// Broadcast a committed phase transition to players and host alike.
pub fn broadcast_phase_changed(state: &SharedState, snapshot: &RoomSnapshot) {
    let payload = PhaseChangedEvent {
        status: snapshot.game_state.status,
        room: snapshot.clone(),
    };
    send_public_event(state, &snapshot.room_code, EVENT_PHASE_CHANGED, &payload);
    send_host_event(state, &snapshot.room_code, EVENT_PHASE_CHANGED, &payload);
}

/// Tell the host a trivia answer arrived, with the running count.
pub fn broadcast_answer_received(
    state: &SharedState,
    room_code: &str,
    question_id: Uuid,
    answered_count: usize,
) {
    let payload = AnswerReceivedEvent {
        question_id,
        answered_count,
    };
    send_host_event(state, room_code, EVENT_ANSWER_RECEIVED, &payload);
}

/// Tell the host a scavenger submission arrived or changed.
pub fn broadcast_scavenger_changed(
    state: &SharedState,
    room_code: &str,
    question_id: Uuid,
    submission: &ScavengerSummary,
) {
    let payload = ScavengerChangedEvent {
        question_id,
        submission: submission.clone(),
    };
    send_host_event(state, room_code, EVENT_SCAVENGER_CHANGED, &payload);
}

/// Tell the host the coordinator is withholding an automatic advance.
pub fn broadcast_host_waiting(state: &SharedState, room_code: &str, reason: &str) {
    let payload = HostWaitingEvent {
        reason: reason.to_string(),
    };
    send_host_event(state, room_code, EVENT_HOST_WAITING, &payload);
}

fn send_public_event(state: &SharedState, room_code: &str, event: &str, payload: &impl Serialize) {
    let Some(channels) = state.hubs().existing(room_code) else {
        return;
    };
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => channels.public().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_host_event(state: &SharedState, room_code: &str, event: &str, payload: &impl Serialize) {
    let Some(channels) = state.hubs().existing(room_code) else {
        return;
    };
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => channels.host().hub().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize host SSE payload"),
    }
}
