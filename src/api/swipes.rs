//! Swipe submission handler.
//!
//! The handler only writes the ledger and queues an evaluation pass;
//! match detection itself is the engine's job.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{RecordSwipeRequest, Session, Swipe};
use crate::AppState;

use super::error::ApiError;
use super::sessions::checked_code;
use super::trigger_evaluation;
use super::validation::{validate_candidate_id, validate_participant_id};

/// POST /api/sessions/:code/swipes
pub async fn record_swipe(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<RecordSwipeRequest>,
) -> Result<StatusCode, ApiError> {
    let code = checked_code(&state, &code)?;

    if let Err(e) = validate_participant_id(&req.participant_id) {
        return Err(ApiError::validation("participant_id", e));
    }
    if let Err(e) = validate_candidate_id(&req.candidate_id) {
        return Err(ApiError::validation("candidate_id", e));
    }

    if Session::get_by_code(&state.db, &code).await?.is_none() {
        return Err(ApiError::not_found("Session not found"));
    }

    Swipe::record(
        &state.db,
        &code,
        &req.participant_id,
        &req.candidate_id,
        req.liked,
    )
    .await?;

    tracing::debug!(
        session = %code,
        participant = %req.participant_id,
        candidate = %req.candidate_id,
        liked = req.liked,
        "Swipe recorded"
    );

    // Every ledger change re-triggers match evaluation
    trigger_evaluation(&state, &code).await;

    Ok(StatusCode::NO_CONTENT)
}
