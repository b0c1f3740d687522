//! Match list handler: the read side of the match store.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{MatchEntry, MatchedCandidate, Session};
use crate::AppState;

use super::error::ApiError;
use super::sessions::checked_code;

/// GET /api/sessions/:code/matches
pub async fn list_matches(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<MatchedCandidate>>, ApiError> {
    let code = checked_code(&state, &code)?;

    if Session::get_by_code(&state.db, &code).await?.is_none() {
        return Err(ApiError::not_found("Session not found"));
    }

    Ok(Json(MatchEntry::list_for_session(&state.db, &code).await?))
}
