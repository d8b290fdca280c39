use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::{
    common::{GameStateSnapshot, PlayerSummary, RoomSnapshot},
    play::ScavengerSummary,
};

/// Response to a successful phase transition: the room as it now stands.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    /// Snapshot after the transition committed.
    pub room: RoomSnapshot,
    /// The new state-machine record, duplicated for convenience.
    pub game_state: GameStateSnapshot,
}

/// Host verdict on a scavenger submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewScavengerRequest {
    /// `true` approves, `false` rejects. Pending is not a settable state.
    pub approved: bool,
}

/// Result of reviewing a scavenger submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewScavengerResponse {
    /// The reviewed submission with its verdict and award.
    pub submission: ScavengerSummary,
    /// The submitter with their updated total.
    pub player: PlayerSummary,
}

/// Scavenger submissions of one question, in arrival order.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScavengerListResponse {
    /// The submissions awaiting or past review.
    pub submissions: Vec<ScavengerSummary>,
}

/// Acknowledgement of a host presence ping.
#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    /// Always true; failures surface as error responses.
    pub success: bool,
}

/// Result of an expired-room sweep.
#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    /// Rooms removed, dependents included.
    pub deleted_rooms: usize,
}
