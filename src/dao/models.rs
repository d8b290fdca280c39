use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage-level tag identifying a room's current phase.
///
/// This is the value a compare-and-swap state write is keyed on: a transition
/// computed against one tag is rejected when the persisted tag has moved on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKey {
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
    /// Final standings; only a restart leaves this state.
    Finished,
    /// Reserved: no transition currently enters or leaves this state.
    Paused,
}

impl PhaseKey {
    /// Wire representation of the tag (`snake_case`, matches the JSON form).
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKey::Lobby => "lobby",
            PhaseKey::Trivia => "trivia",
            PhaseKey::TriviaReview => "trivia_review",
            PhaseKey::Scavenger => "scavenger",
            PhaseKey::Review => "review",
            PhaseKey::RoundSummary => "round_summary",
            PhaseKey::Finished => "finished",
            PhaseKey::Paused => "paused",
        }
    }

    /// True for phases where gameplay is underway (not lobby or finished).
    pub fn is_active(&self) -> bool {
        !matches!(self, PhaseKey::Lobby | PhaseKey::Finished)
    }
}

impl std::fmt::Display for PhaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-room configuration fixed at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSettingsEntity {
    /// Total number of rounds in a game.
    pub number_of_rounds: u32,
    /// Questions played per round.
    pub questions_per_round: u32,
    /// Time limit for a trivia question, in seconds.
    pub time_per_trivia_question: u64,
    /// Time limit for a scavenger challenge, in seconds.
    pub time_per_scavenger: u64,
    /// Points awarded for a correct answer before time scaling.
    pub trivia_base_point: u32,
    /// Whether faster answers earn more points.
    pub trivia_time_scaling: bool,
    /// Points for the first approved scavenger submission of a question.
    pub points_for_first_scavenger: u32,
    /// Points for later approved scavenger submissions.
    pub points_for_other_approved_scavengers: u32,
    /// Consolation points for rejected scavenger submissions.
    pub points_for_rejected_scavengers: u32,
}

impl Default for GameSettingsEntity {
    fn default() -> Self {
        Self {
            number_of_rounds: 3,
            questions_per_round: 3,
            time_per_trivia_question: 30,
            time_per_scavenger: 60,
            trivia_base_point: 100,
            trivia_time_scaling: true,
            points_for_first_scavenger: 10,
            points_for_other_approved_scavengers: 5,
            points_for_rejected_scavengers: 2,
        }
    }
}

/// Flat persisted form of a room's game state.
///
/// `current_round`/`current_question` are 1-based and meaningless (zero) in
/// `lobby` and `finished`; the timer anchors are absolute wall-clock
/// timestamps so every client derives remaining time locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateEntity {
    /// Current phase tag.
    pub status: PhaseKey,
    /// 1-based round counter.
    pub current_round: u32,
    /// 1-based question counter within the round.
    pub current_question: u32,
    /// Wall-clock anchor of the current trivia question (includes the
    /// pre-question countdown offset).
    pub question_start_time: Option<SystemTime>,
    /// Wall-clock anchor of the current scavenger challenge.
    pub scavenger_start_time: Option<SystemTime>,
}

impl GameStateEntity {
    /// Fresh state for a newly created or restarted room.
    pub fn lobby() -> Self {
        Self {
            status: PhaseKey::Lobby,
            current_round: 0,
            current_question: 0,
            question_start_time: None,
            scavenger_start_time: None,
        }
    }
}

/// One game session, identified by a human-shareable code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Primary key of the room.
    pub id: Uuid,
    /// 6-character join code, uppercase, ambiguity-free alphabet.
    pub room_code: String,
    /// Capability secret authorizing host-privileged writes.
    pub host_key: String,
    /// Display title chosen by the host.
    pub title: String,
    /// Immutable game configuration.
    pub settings: GameSettingsEntity,
    /// Mutable state-machine record.
    pub game_state: GameStateEntity,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time any host-privileged mutation touched the room.
    pub last_activity_at: SystemTime,
    /// Last host liveness ping, if any was received.
    pub last_host_ping: Option<SystemTime>,
    /// When the room becomes eligible for cleanup.
    pub expires_at: SystemTime,
}

/// One player row per (room, client) pairing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key of the player.
    pub id: Uuid,
    /// Room the player belongs to.
    pub room_id: Uuid,
    /// Device-stable identity; rejoining with the same value updates the
    /// existing row instead of creating a duplicate.
    pub client_uuid: String,
    /// Display name, unique within the room.
    pub display_name: String,
    /// Whether the player currently has a live session.
    pub connected: bool,
    /// Last heartbeat from the player's device.
    pub last_seen_at: SystemTime,
    /// Running score; only ever adjusted through atomic increments.
    pub points: u32,
    /// When the player first joined the room.
    pub joined_at: SystemTime,
}

/// A single answer choice of a trivia question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceEntity {
    /// Stable identifier referenced by submissions (e.g. "a").
    pub id: String,
    /// Text shown to players.
    pub label: String,
    /// Exactly one choice per question carries `true`.
    pub is_correct: bool,
}

/// One question per (room, round, question number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Room the question belongs to.
    pub room_id: Uuid,
    /// 1-based round this question is played in.
    pub round_number: u32,
    /// 1-based position within the round.
    pub question_number: u32,
    /// Question text.
    pub stem: String,
    /// Ordered answer choices.
    pub choices: Vec<ChoiceEntity>,
    /// Free-text physical challenge tied to this question.
    pub scavenger_instruction: String,
}

impl QuestionEntity {
    /// The choice marked correct, if the question is well-formed.
    pub fn correct_choice(&self) -> Option<&ChoiceEntity> {
        self.choices.iter().find(|choice| choice.is_correct)
    }
}

/// One trivia answer per (player, question).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionEntity {
    /// Primary key of the submission.
    pub id: Uuid,
    /// Room the submission belongs to.
    pub room_id: Uuid,
    /// Answering player.
    pub player_id: Uuid,
    /// Question being answered.
    pub question_id: Uuid,
    /// Choice the player picked.
    pub answer_choice_id: String,
    /// Milliseconds from question presentation to submission.
    pub answer_time_ms: u64,
    /// Correctness re-derived server-side from the authoritative choices.
    pub is_correct: bool,
    /// Points computed at write time; immutable thereafter.
    pub points_awarded: u32,
    /// When the answer arrived.
    pub answered_at: SystemTime,
}

/// One scavenger-hunt submission per (player, question).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScavengerEntity {
    /// Primary key of the submission.
    pub id: Uuid,
    /// Room the submission belongs to.
    pub room_id: Uuid,
    /// Submitting player.
    pub player_id: Uuid,
    /// Question whose challenge this answers.
    pub question_id: Uuid,
    /// 1-based arrival order, assigned atomically by the store.
    pub submission_order: u32,
    /// `None` while pending host review, then the verdict.
    pub approved: Option<bool>,
    /// When the host reviewed the submission.
    pub approved_by_host_at: Option<SystemTime>,
    /// Zero while pending; set at review time.
    pub points_awarded: u32,
    /// When the submission arrived.
    pub submitted_at: SystemTime,
}
