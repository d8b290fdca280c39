use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod host;
pub mod maintenance;
pub mod play;
pub mod room;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(room::router())
        .merge(play::router())
        .merge(host::router())
        .merge(sse::router())
        .merge(maintenance::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
