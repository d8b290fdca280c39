/// Auto-advance polling loop run on behalf of the attached host session.
pub mod coordinator;
/// OpenAPI document assembly.
pub mod documentation;
/// Game lifecycle transitions (start, advance, restart).
pub mod game_service;
/// Health status reporting.
pub mod health_service;
/// Host liveness pings and the disconnect threshold.
pub mod presence_service;
/// Room creation, joining, snapshots, and cleanup.
pub mod room_service;
/// SSE event payload broadcasting helpers.
pub mod sse_events;
/// SSE subscription and stream conversion.
pub mod sse_service;
/// Storage backend supervision and degraded-mode handling.
pub mod storage_supervisor;
/// Trivia answers and scavenger submissions/approvals.
pub mod submission_service;
