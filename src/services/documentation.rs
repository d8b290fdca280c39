use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the party-game coordinator.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::join_room,
        crate::routes::room::get_room,
        crate::routes::room::get_question,
        crate::routes::room::get_leaderboard,
        crate::routes::play::submit_answer,
        crate::routes::play::submit_scavenger,
        crate::routes::play::participation_counts,
        crate::routes::play::player_submission_status,
        crate::routes::play::player_presence,
        crate::routes::host::start_game,
        crate::routes::host::advance,
        crate::routes::host::restart,
        crate::routes::host::ping,
        crate::routes::host::review_scavenger,
        crate::routes::host::list_scavengers,
        crate::routes::sse::public_stream,
        crate::routes::sse::host_stream,
        crate::routes::maintenance::cleanup,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::GameStatus,
            crate::dto::common::GameStateSnapshot,
            crate::dto::common::GameSettingsSnapshot,
            crate::dto::common::PlayerSummary,
            crate::dto::common::RoomSnapshot,
            crate::dto::common::LeaderboardEntry,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::GameSettingsInput,
            crate::dto::room::QuestionInput,
            crate::dto::room::ChoiceInput,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::JoinRoomResponse,
            crate::dto::room::QuestionView,
            crate::dto::room::ChoiceView,
            crate::dto::play::SubmitAnswerRequest,
            crate::dto::play::SubmitAnswerResponse,
            crate::dto::play::SubmitScavengerRequest,
            crate::dto::play::SubmitScavengerResponse,
            crate::dto::play::ParticipationCounts,
            crate::dto::play::PlayerSubmissionStatus,
            crate::dto::play::PlayerPresenceRequest,
            crate::dto::play::ScavengerSummary,
            crate::dto::host::TransitionResponse,
            crate::dto::host::ReviewScavengerRequest,
            crate::dto::host::ReviewScavengerResponse,
            crate::dto::host::ScavengerListResponse,
            crate::dto::host::PingResponse,
            crate::dto::host::CleanupResponse,
            crate::dto::sse::HostHandshake,
            crate::dto::sse::HostWaitingEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Room creation, joining, and lookups"),
        (name = "play", description = "Player gameplay operations"),
        (name = "host", description = "Host-privileged game control"),
        (name = "sse", description = "Server-sent event streams"),
        (name = "maintenance", description = "Operational sweeps"),
    )
)]
pub struct ApiDoc;
