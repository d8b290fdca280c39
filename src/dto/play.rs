use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::ScavengerEntity;
use crate::dto::format_system_time;

/// Payload for submitting a trivia answer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    /// The answering player.
    pub player_id: Uuid,
    /// The question being answered.
    pub question_id: Uuid,
    /// The chosen answer.
    pub answer_choice_id: String,
    /// Milliseconds from question presentation to submission.
    pub answer_time_ms: u64,
}

/// Result of a trivia answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    /// Id of the recorded submission.
    pub submission_id: Uuid,
    /// Whether the answer matched the correct choice.
    pub is_correct: bool,
    /// Points credited for this answer.
    pub points_awarded: u32,
    /// The player's running total after the credit.
    pub total_points: u32,
}

/// Payload for submitting scavenger-hunt proof.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitScavengerRequest {
    /// The submitting player.
    pub player_id: Uuid,
    /// The question whose challenge was completed.
    pub question_id: Uuid,
}

/// Result of a scavenger submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitScavengerResponse {
    /// Id of the recorded submission.
    pub submission_id: Uuid,
    /// 1-based arrival order for this question.
    pub submission_order: u32,
}

/// Aggregate participation counts for the current question, used by the
/// auto-advance decision and by host UIs.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipationCounts {
    /// Trivia answers recorded for the question.
    pub answered_count: usize,
    /// Scavenger submissions recorded for the question.
    pub submitted_count: usize,
    /// Players currently marked connected.
    pub connected_players: usize,
    /// True once every connected player has answered.
    pub all_answered: bool,
    /// True once every connected player has submitted.
    pub all_submitted: bool,
}

/// Public projection of a scavenger submission for the host's review list.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ScavengerSummary {
    /// Submission id.
    pub id: Uuid,
    /// Submitting player.
    pub player_id: Uuid,
    /// Display name of the submitting player.
    pub display_name: String,
    /// 1-based arrival order.
    pub submission_order: u32,
    /// Host verdict, absent while pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    /// Points credited at review time (zero while pending).
    pub points_awarded: u32,
    /// When the submission arrived.
    pub submitted_at: String,
}

impl ScavengerSummary {
    /// Combine the stored row with the submitter's display name.
    pub fn from_entity(entity: ScavengerEntity, display_name: String) -> Self {
        Self {
            id: entity.id,
            player_id: entity.player_id,
            display_name,
            submission_order: entity.submission_order,
            approved: entity.approved,
            points_awarded: entity.points_awarded,
            submitted_at: format_system_time(entity.submitted_at),
        }
    }
}

/// Player heartbeat / explicit disconnect payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayerPresenceRequest {
    /// Whether the player's session is live.
    pub connected: bool,
}

/// What a reconnecting player already submitted for a question; backs the
/// client-side duplicate-submission check.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSubmissionStatus {
    /// A trivia answer is on record for this player and question.
    pub answered: bool,
    /// A scavenger submission is on record for this player and question.
    pub scavenger_submitted: bool,
}
