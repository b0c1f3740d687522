//! Candidate seeding: fills a session with nearby restaurants.
//!
//! Runs once per session. Drives the session status through
//! `waiting -> seeding -> ready`; on failure the status is reset to
//! `waiting` so seeding can be retried and the session stays joinable.

use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;

use crate::db::{stable_id, Candidate, CandidateSeed, Session, SessionStatus};
use crate::places::PlacesClient;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("session not found")]
    SessionNotFound,
    #[error("session is already seeded")]
    AlreadySeeded,
    #[error("places lookup failed: {0}")]
    Places(anyhow::Error),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Seed a session's candidate list from the places API.
///
/// Rows whose stable id strips to empty are dropped, and duplicate
/// stable ids within the batch are deduplicated (first occurrence wins):
/// candidate identity must be unique before anything downstream keys on
/// it. Returns the number of candidates stored.
pub async fn seed_session(
    db: &SqlitePool,
    places: &PlacesClient,
    session_code: &str,
    radius_m: u32,
) -> Result<usize, SeedError> {
    let session = Session::get_by_code(db, session_code)
        .await?
        .ok_or(SeedError::SessionNotFound)?;

    // Claim the session atomically: of two concurrent seed requests only
    // one leaves `waiting`, the other sees the claim and backs off
    let claimed =
        Session::set_status_if(db, session_code, SessionStatus::Waiting, SessionStatus::Seeding)
            .await?;
    if !claimed {
        return Err(SeedError::AlreadySeeded);
    }

    match fetch_and_store(db, places, &session, radius_m).await {
        Ok(count) => {
            Session::set_status(db, session_code, SessionStatus::Ready).await?;
            tracing::info!(
                session = %session_code,
                candidates = count,
                radius_m = radius_m,
                "Session seeded"
            );
            Ok(count)
        }
        Err(e) => {
            // Leave the session retryable rather than wedged in `seeding`,
            // but never knock an already-ready session back
            if let Err(reset_err) =
                Session::set_status_if(db, session_code, SessionStatus::Seeding, SessionStatus::Waiting)
                    .await
            {
                tracing::warn!(
                    session = %session_code,
                    error = %reset_err,
                    "Failed to reset session status after seeding failure"
                );
            }
            Err(e)
        }
    }
}

async fn fetch_and_store(
    db: &SqlitePool,
    places: &PlacesClient,
    session: &Session,
    radius_m: u32,
) -> Result<usize, SeedError> {
    let rows = places
        .nearby_restaurants(
            session.latitude,
            session.longitude,
            radius_m,
            session.max_candidates,
        )
        .await
        .map_err(SeedError::Places)?;

    let seeds = dedupe_seeds(rows);
    let stored = Candidate::insert_all(db, &session.code, &seeds).await?;
    Ok(stored)
}

/// Drop rows with empty stable ids and keep the first row per stable id
fn dedupe_seeds(rows: Vec<CandidateSeed>) -> Vec<CandidateSeed> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::with_capacity(rows.len());

    for row in rows {
        let id = stable_id(&row.name, &row.address);
        if id.is_empty() {
            tracing::warn!(name = %row.name, address = %row.address, "Dropping candidate with empty stable id");
            continue;
        }
        if seen.insert(id) {
            seeds.push(row);
        }
    }

    seeds
}
