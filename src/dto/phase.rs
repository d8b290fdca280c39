use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::PhaseKey;

/// Game status exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Waiting for players; game not started.
    Lobby,
    /// A trivia question is open for answers.
    Trivia,
    /// The correct choice is being revealed.
    TriviaReview,
    /// The scavenger challenge is open for submissions.
    Scavenger,
    /// Host is approving or rejecting scavenger submissions.
    Review,
    /// End-of-round standings are displayed.
    RoundSummary,
    /// Final standings.
    Finished,
    /// Reserved status, never entered by the current transition table.
    Paused,
}

impl From<PhaseKey> for GameStatus {
    fn from(value: PhaseKey) -> Self {
        match value {
            PhaseKey::Lobby => GameStatus::Lobby,
            PhaseKey::Trivia => GameStatus::Trivia,
            PhaseKey::TriviaReview => GameStatus::TriviaReview,
            PhaseKey::Scavenger => GameStatus::Scavenger,
            PhaseKey::Review => GameStatus::Review,
            PhaseKey::RoundSummary => GameStatus::RoundSummary,
            PhaseKey::Finished => GameStatus::Finished,
            PhaseKey::Paused => GameStatus::Paused,
        }
    }
}
