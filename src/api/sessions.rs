//! Session lifecycle handlers: create, inspect, join, seed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    clamp_max_candidates, Candidate, CreateSessionRequest, JoinSessionRequest, Participant,
    Session,
};
use crate::engine::{self, SeedError};
use crate::AppState;

use super::error::ApiError;
use super::validation::{
    validate_coordinates, validate_display_name, validate_radius_m, validate_session_code,
};
use super::{normalize_code, trigger_evaluation};

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session: Session,
    pub host: Participant,
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub roster: Vec<Participant>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedSessionRequest {
    pub radius_m: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SeedSessionResponse {
    pub candidates: usize,
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    if let Err(e) = validate_display_name(&req.host_name) {
        return Err(ApiError::validation("host_name", e));
    }
    if let Err(e) = validate_coordinates(req.latitude, req.longitude) {
        return Err(ApiError::validation("location", e));
    }

    let max_candidates =
        clamp_max_candidates(req.max_candidates, state.config.session.default_max_candidates);

    let host_id = Uuid::new_v4().to_string();
    let code = Session::unique_code(&state.db, state.config.session.code_length).await?;

    let session = Session::create(
        &state.db,
        &code,
        &host_id,
        req.latitude,
        req.longitude,
        max_candidates,
    )
    .await?;
    let host = Participant::join(&state.db, &code, &host_id, req.host_name.trim()).await?;

    tracing::info!(session = %code, host = %host.name, "Session created");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session, host }),
    ))
}

/// GET /api/sessions/:code
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<SessionDetail>, ApiError> {
    let code = checked_code(&state, &code)?;

    let session = Session::get_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| ApiError::not_found("Session not found"))?;
    let roster = Participant::roster(&state.db, &code).await?;

    Ok(Json(SessionDetail { session, roster }))
}

/// POST /api/sessions/:code/join
pub async fn join_session(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<JoinSessionRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let code = checked_code(&state, &code)?;
    if let Err(e) = validate_display_name(&req.name) {
        return Err(ApiError::validation("name", e));
    }

    if Session::get_by_code(&state.db, &code).await?.is_none() {
        return Err(ApiError::not_found("Session code not found"));
    }

    let participant =
        Participant::join(&state.db, &code, &Uuid::new_v4().to_string(), req.name.trim()).await?;

    tracing::info!(session = %code, participant = %participant.name, "Participant joined");

    // The roster changed; unanimity must be rechecked against it
    trigger_evaluation(&state, &code).await;

    Ok((StatusCode::CREATED, Json(participant)))
}

/// POST /api/sessions/:code/seed
pub async fn seed_session(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<SeedSessionRequest>,
) -> Result<Json<SeedSessionResponse>, ApiError> {
    let code = checked_code(&state, &code)?;

    let radius_m = req.radius_m.unwrap_or(state.config.session.default_radius_m);
    if let Err(e) = validate_radius_m(radius_m) {
        return Err(ApiError::validation("radius_m", e));
    }

    let candidates = engine::seed_session(&state.db, &state.places, &code, radius_m)
        .await
        .map_err(|e| match e {
            SeedError::SessionNotFound => ApiError::not_found("Session not found"),
            SeedError::AlreadySeeded => ApiError::conflict("Session is already seeded"),
            SeedError::Places(e) => {
                tracing::warn!(session = %code, error = %e, "Places lookup failed");
                ApiError::upstream("Restaurant search is unavailable")
            }
            SeedError::Db(e) => e.into(),
        })?;

    Ok(Json(SeedSessionResponse { candidates }))
}

/// GET /api/sessions/:code/candidates
pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let code = checked_code(&state, &code)?;

    if Session::get_by_code(&state.db, &code).await?.is_none() {
        return Err(ApiError::not_found("Session not found"));
    }

    Ok(Json(Candidate::list_for_session(&state.db, &code).await?))
}

/// Normalize and shape-check a session code from the path
pub(super) fn checked_code(state: &AppState, raw: &str) -> Result<String, ApiError> {
    let code = normalize_code(raw);
    validate_session_code(&code, state.config.session.code_length)
        .map_err(|e| ApiError::validation("code", e))?;
    Ok(code)
}
