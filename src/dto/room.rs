use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{GameSettingsEntity, QuestionEntity},
    dto::{
        common::{PlayerSummary, RoomSnapshot},
        validation::validate_display_name,
    },
};

/// Payload used to create a brand-new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display title of the game night.
    #[validate(length(min = 1, max = 80))]
    pub title: String,
    /// Optional settings overrides; omitted fields use the defaults.
    #[serde(default)]
    #[validate(nested)]
    pub settings: GameSettingsInput,
    /// Custom question deck; when omitted the room is seeded from the
    /// configured default deck.
    #[serde(default)]
    #[validate(nested)]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Incoming settings overrides, range-checked against the supported bounds.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct GameSettingsInput {
    /// Rounds per game (1-10).
    #[validate(range(min = 1, max = 10))]
    pub number_of_rounds: Option<u32>,
    /// Questions per round (1-20).
    #[validate(range(min = 1, max = 20))]
    pub questions_per_round: Option<u32>,
    /// Trivia time limit in seconds (10-120).
    #[validate(range(min = 10, max = 120))]
    pub time_per_trivia_question: Option<u64>,
    /// Scavenger time limit in seconds (30-300).
    #[validate(range(min = 30, max = 300))]
    pub time_per_scavenger: Option<u64>,
    /// Base points for a correct answer (1-10000).
    #[validate(range(min = 1, max = 10_000))]
    pub trivia_base_point: Option<u32>,
    /// Whether faster answers earn more points.
    pub trivia_time_scaling: Option<bool>,
    /// Points for the first approved scavenger submission.
    #[validate(range(max = 10_000))]
    pub points_for_first_scavenger: Option<u32>,
    /// Points for later approved submissions.
    #[validate(range(max = 10_000))]
    pub points_for_other_approved_scavengers: Option<u32>,
    /// Consolation points for rejected submissions.
    #[validate(range(max = 10_000))]
    pub points_for_rejected_scavengers: Option<u32>,
}

impl GameSettingsInput {
    /// Apply the overrides on top of the default settings.
    pub fn into_settings(self) -> GameSettingsEntity {
        let defaults = GameSettingsEntity::default();
        GameSettingsEntity {
            number_of_rounds: self.number_of_rounds.unwrap_or(defaults.number_of_rounds),
            questions_per_round: self
                .questions_per_round
                .unwrap_or(defaults.questions_per_round),
            time_per_trivia_question: self
                .time_per_trivia_question
                .unwrap_or(defaults.time_per_trivia_question),
            time_per_scavenger: self.time_per_scavenger.unwrap_or(defaults.time_per_scavenger),
            trivia_base_point: self.trivia_base_point.unwrap_or(defaults.trivia_base_point),
            trivia_time_scaling: self
                .trivia_time_scaling
                .unwrap_or(defaults.trivia_time_scaling),
            points_for_first_scavenger: self
                .points_for_first_scavenger
                .unwrap_or(defaults.points_for_first_scavenger),
            points_for_other_approved_scavengers: self
                .points_for_other_approved_scavengers
                .unwrap_or(defaults.points_for_other_approved_scavengers),
            points_for_rejected_scavengers: self
                .points_for_rejected_scavengers
                .unwrap_or(defaults.points_for_rejected_scavengers),
        }
    }
}

/// Incoming custom question definition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionInput {
    /// 1-based round this question belongs to.
    pub round_number: u32,
    /// 1-based position within the round.
    pub question_number: u32,
    /// Question text.
    pub stem: String,
    /// Answer choices; exactly one must be marked correct.
    pub choices: Vec<ChoiceInput>,
    /// Physical challenge tied to this question.
    pub scavenger_instruction: String,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.stem.trim().is_empty() {
            errors.add("stem", ValidationError::new("question_stem_empty"));
        }

        if self.round_number == 0 || self.question_number == 0 {
            errors.add("round_number", ValidationError::new("question_position_zero"));
        }

        if !(2..=6).contains(&self.choices.len()) {
            let mut err = ValidationError::new("question_choice_count");
            err.message = Some("A question needs between 2 and 6 choices".into());
            errors.add("choices", err);
        }

        let correct = self
            .choices
            .iter()
            .filter(|choice| choice.is_correct)
            .count();
        if correct != 1 {
            let mut err = ValidationError::new("question_correct_count");
            err.message =
                Some(format!("Exactly one choice must be correct (got {correct})").into());
            errors.add("choices", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Incoming answer choice definition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChoiceInput {
    /// Stable identifier referenced by submissions (e.g. "a").
    pub id: String,
    /// Text shown to players.
    pub label: String,
    /// Whether this is the correct choice.
    #[serde(default)]
    pub is_correct: bool,
}

/// Response to a successful room creation. The host key is only ever
/// returned here; the creating device must hold on to it.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    /// Snapshot of the new room.
    pub room: RoomSnapshot,
    /// Capability secret for host-privileged operations.
    pub host_key: String,
}

/// Payload used to join (or rejoin) a room as a player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRoomRequest {
    /// Requested display name; suffixed with a number on collision.
    pub display_name: String,
    /// Device-stable identity used to recognize rejoins.
    pub client_uuid: String,
}

impl Validate for JoinRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_display_name(&self.display_name) {
            errors.add("display_name", err);
        }

        if self.client_uuid.trim().is_empty() || self.client_uuid.len() > 64 {
            errors.add("client_uuid", ValidationError::new("client_uuid_invalid"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response to a join request.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    /// The caller's player row (name may carry a collision suffix).
    pub player: PlayerSummary,
    /// Snapshot of the joined room.
    pub room: RoomSnapshot,
}

/// A question as shown to clients.
///
/// `correct_choice_id` is only present for host-keyed fetches or once the
/// phase has reached the reveal; the plain player view never exposes it.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    /// Question id.
    pub id: Uuid,
    /// 1-based round.
    pub round_number: u32,
    /// 1-based position within the round.
    pub question_number: u32,
    /// Question text.
    pub stem: String,
    /// Choices in presentation order.
    pub choices: Vec<ChoiceView>,
    /// Physical challenge tied to the question.
    pub scavenger_instruction: String,
    /// Identifier of the correct choice, when the caller may see it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_choice_id: Option<String>,
}

/// An answer choice without the correctness flag.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChoiceView {
    /// Choice id.
    pub id: String,
    /// Text shown to players.
    pub label: String,
}

impl QuestionView {
    /// Project a question entity, revealing the correct choice only when
    /// `reveal` is set.
    pub fn from_entity(question: QuestionEntity, reveal: bool) -> Self {
        let correct_choice_id = reveal
            .then(|| question.correct_choice().map(|choice| choice.id.clone()))
            .flatten();
        Self {
            id: question.id,
            round_number: question.round_number,
            question_number: question.question_number,
            stem: question.stem,
            choices: question
                .choices
                .into_iter()
                .map(|choice| ChoiceView {
                    id: choice.id,
                    label: choice.label,
                })
                .collect(),
            scavenger_instruction: question.scavenger_instruction,
            correct_choice_id,
        }
    }
}
