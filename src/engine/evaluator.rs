//! Match evaluation engine.
//!
//! Determines when every participant in a session has liked the same
//! candidate and announces each such match exactly once. The unanimity
//! computation is a pure function of four snapshots (roster, seeded
//! candidate set, ledger, already-confirmed set); the async wrapper
//! around it only does I/O.
//!
//! Key guarantees:
//! - No false positive: unanimity is checked against the roster as read
//!   at evaluation time, and a missing swipe is never consent.
//! - Only seeded candidates can match: a swiped-on id with no candidate
//!   row is treated as not unanimous, never as an error.
//! - No duplicate announcement: the store commit is write-if-absent and
//!   the sink fires only for the call that actually inserted.
//! - Confirm-then-notify: a failed commit never reaches the sink.
//! - Transient read failures skip the pass; the next trigger (or the
//!   periodic re-check) retries.

use crate::db::{Candidate, MatchEntry, Participant, SwipeLedger};
use crate::notifications::MatchSink;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

/// Candidates that every roster participant has liked, minus those
/// already confirmed, in ascending candidate-id order.
///
/// An empty roster matches nothing: unanimity over the empty set is not
/// treated as vacuously true in this domain. A candidate nobody swiped
/// on is outside the universe and is never considered, and a swiped-on
/// id that was never seeded is discarded rather than reported.
pub fn unanimous_candidates(
    roster: &[Participant],
    seeded: &HashSet<String>,
    ledger: &SwipeLedger,
    confirmed: &HashSet<String>,
) -> Vec<String> {
    if roster.is_empty() {
        return Vec::new();
    }

    ledger
        .candidate_universe()
        .into_iter()
        .filter(|candidate_id| seeded.contains(*candidate_id))
        .filter(|candidate_id| !confirmed.contains(*candidate_id))
        .filter(|candidate_id| roster.iter().all(|p| ledger.liked(&p.id, candidate_id)))
        .map(str::to_string)
        .collect()
}

/// Result of one evaluation pass over a session
#[derive(Debug, Default)]
pub struct EvaluationResult {
    /// Number of candidates that had received at least one swipe
    pub candidates_checked: usize,
    /// Number of matches newly confirmed and announced
    pub matches_confirmed: usize,
}

/// Match evaluation service
pub struct MatchEvaluator {
    db: SqlitePool,
    /// Optional sink for announcing newly confirmed matches
    sink: Option<Arc<dyn MatchSink>>,
}

impl MatchEvaluator {
    /// Create a new evaluator with no notification sink
    pub fn new(db: SqlitePool) -> Self {
        Self { db, sink: None }
    }

    /// Create a new evaluator that announces matches through a sink
    pub fn with_sink(db: SqlitePool, sink: Arc<dyn MatchSink>) -> Self {
        Self {
            db,
            sink: Some(sink),
        }
    }

    /// Run one evaluation pass for a session.
    ///
    /// Reads the roster, seeded-candidate, ledger, and confirmed-match
    /// snapshots, commits every newly unanimous candidate, and announces
    /// each successful first insert. Read failures abort the pass
    /// silently.
    pub async fn evaluate_session(&self, session_code: &str) -> EvaluationResult {
        let mut result = EvaluationResult::default();

        let roster = match Participant::roster(&self.db, session_code).await {
            Ok(roster) => roster,
            Err(e) => {
                tracing::warn!(session = %session_code, error = %e, "Failed to read roster");
                return result;
            }
        };

        let seeded = match Candidate::ids_for_session(&self.db, session_code).await {
            Ok(seeded) => seeded,
            Err(e) => {
                tracing::warn!(session = %session_code, error = %e, "Failed to read candidate list");
                return result;
            }
        };

        let ledger = match SwipeLedger::load(&self.db, session_code).await {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(session = %session_code, error = %e, "Failed to read swipe ledger");
                return result;
            }
        };

        let confirmed = match MatchEntry::confirmed_ids(&self.db, session_code).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                tracing::warn!(session = %session_code, error = %e, "Failed to read match store");
                return result;
            }
        };

        result.candidates_checked = ledger.candidate_universe().len();

        for candidate_id in unanimous_candidates(&roster, &seeded, &ledger, &confirmed) {
            // Commit before announcing. A lost race (row already there)
            // stays silent; a failed write must never reach the sink.
            match MatchEntry::commit(&self.db, session_code, &candidate_id).await {
                Ok(true) => {
                    tracing::info!(
                        session = %session_code,
                        candidate = %candidate_id,
                        participants = roster.len(),
                        "Unanimous match confirmed"
                    );
                    if let Some(ref sink) = self.sink {
                        sink.match_confirmed(session_code, &candidate_id).await;
                    }
                    result.matches_confirmed += 1;
                }
                Ok(false) => {
                    tracing::debug!(
                        session = %session_code,
                        candidate = %candidate_id,
                        "Match already committed elsewhere, not re-announcing"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        session = %session_code,
                        candidate = %candidate_id,
                        error = %e,
                        "Failed to commit match"
                    );
                }
            }
        }

        result
    }

    /// Re-evaluate every session with recent swipe activity.
    ///
    /// Safety net behind the event-driven triggers: an evaluation pass
    /// skipped on a transient error is retried here instead of waiting
    /// for the next swipe.
    pub async fn evaluate_recent(&self) -> EvaluationSummary {
        let mut summary = EvaluationSummary::default();

        let codes: Vec<(String,)> = match sqlx::query_as(
            r#"
            SELECT DISTINCT session_code
            FROM swipes
            WHERE updated_at > strftime('%Y-%m-%dT%H:%M:%S', 'now', '-10 minutes')
            "#,
        )
        .fetch_all(&self.db)
        .await
        {
            Ok(codes) => codes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list sessions for re-evaluation");
                return summary;
            }
        };

        summary.sessions_checked = codes.len();

        for (session_code,) in codes {
            let result = self.evaluate_session(&session_code).await;
            summary.candidates_checked += result.candidates_checked;
            summary.matches_confirmed += result.matches_confirmed;
        }

        if summary.matches_confirmed > 0 {
            tracing::info!(
                sessions = summary.sessions_checked,
                confirmed = summary.matches_confirmed,
                "Periodic re-check confirmed matches"
            );
        }

        summary
    }
}

/// Summary of a periodic re-check across sessions
#[derive(Debug, Default)]
pub struct EvaluationSummary {
    pub sessions_checked: usize,
    pub candidates_checked: usize,
    pub matches_confirmed: usize,
}
