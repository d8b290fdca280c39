use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status: "ok" or "degraded".
    pub status: String,
}

impl HealthResponse {
    /// The storage backend is reachable and serving.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Running without a usable storage backend; writes will fail.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
