use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{common::RoomSnapshot, phase::GameStatus, play::ScavengerSummary};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized data line.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build a plain-text event.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Token handed to the single active host stream when it connects.
pub struct HostHandshake {
    /// Attachment token; a second host stream is refused while this one lives.
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the room record or its players change. Carries the
/// same snapshot the REST poll returns, so either channel is sufficient.
pub struct RoomChangedEvent(pub RoomSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a phase transition commits.
pub struct PhaseChangedEvent {
    /// The phase just entered.
    pub status: GameStatus,
    /// Snapshot after the transition.
    pub room: RoomSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast to the host when a trivia answer arrives.
pub struct AnswerReceivedEvent {
    /// Question the answer belongs to.
    pub question_id: Uuid,
    /// Total answers recorded for the question so far.
    pub answered_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a scavenger submission arrives or is reviewed.
pub struct ScavengerChangedEvent {
    /// Question the submission belongs to.
    pub question_id: Uuid,
    /// Current form of the submission.
    pub submission: ScavengerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Host-only signal that the coordinator is withholding an automatic
/// advance and defers to a manual host action.
pub struct HostWaitingEvent {
    /// Why the advance is withheld.
    pub reason: String,
}
