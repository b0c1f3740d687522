mod error;
mod matches;
mod sessions;
mod swipes;
mod validation;
mod ws;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub use error::{ApiError, ErrorCode};

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:code", get(sessions::get_session))
        .route("/sessions/:code/join", post(sessions::join_session))
        .route("/sessions/:code/seed", post(sessions::seed_session))
        .route("/sessions/:code/candidates", get(sessions::list_candidates))
        .route("/sessions/:code/swipes", post(swipes::record_swipe))
        .route("/sessions/:code/matches", get(matches::list_matches))
        .route("/sessions/:code/matches/stream", get(ws::match_feed_ws));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Session codes are typed by hand; accept them case-insensitively
pub(crate) fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Queue an evaluation pass for a session. A full queue only delays
/// detection until the next trigger or periodic re-check, so failures
/// are logged and swallowed.
pub(crate) async fn trigger_evaluation(state: &AppState, session_code: &str) {
    if let Err(e) = state.eval_tx.send(session_code.to_string()).await {
        tracing::warn!(session = %session_code, error = %e, "Failed to queue evaluation");
    }
}
