//! Swipe ledger: per-participant, per-candidate like/dislike decisions.
//!
//! The ledger is append/overwrite only. At most one current decision
//! exists per (session, participant, candidate) key; recording again
//! overwrites it (last write wins, no history).

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

/// A single recorded swipe decision
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Swipe {
    pub session_code: String,
    pub participant_id: String,
    pub candidate_id: String,
    pub liked: bool,
    pub updated_at: String,
}

/// Request body for recording a swipe
#[derive(Debug, Deserialize)]
pub struct RecordSwipeRequest {
    pub participant_id: String,
    pub candidate_id: String,
    pub liked: bool,
}

impl Swipe {
    /// Record a decision, overwriting any prior decision for the key
    pub async fn record(
        db: &SqlitePool,
        session_code: &str,
        participant_id: &str,
        candidate_id: &str,
        liked: bool,
    ) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO swipes (session_code, participant_id, candidate_id, liked, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(session_code, participant_id, candidate_id) DO UPDATE SET
                liked = excluded.liked,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_code)
        .bind(participant_id)
        .bind(candidate_id)
        .bind(liked)
        .bind(&now)
        .execute(db)
        .await?;

        Ok(())
    }
}

/// An in-memory snapshot of a session's ledger: participant id to
/// (candidate id to liked). The evaluator works exclusively on this
/// snapshot so its core stays a pure function of its inputs.
#[derive(Debug, Default, Clone)]
pub struct SwipeLedger {
    decisions: HashMap<String, HashMap<String, bool>>,
}

impl SwipeLedger {
    /// Load the full ledger for a session
    pub async fn load(db: &SqlitePool, session_code: &str) -> Result<SwipeLedger, sqlx::Error> {
        let rows: Vec<Swipe> = sqlx::query_as(
            r#"
            SELECT session_code, participant_id, candidate_id, liked, updated_at
            FROM swipes
            WHERE session_code = ?
            "#,
        )
        .bind(session_code)
        .fetch_all(db)
        .await?;

        let mut ledger = SwipeLedger::default();
        for row in rows {
            ledger.record(&row.participant_id, &row.candidate_id, row.liked);
        }
        Ok(ledger)
    }

    /// Record a decision in the snapshot (last write wins)
    pub fn record(&mut self, participant_id: &str, candidate_id: &str, liked: bool) {
        self.decisions
            .entry(participant_id.to_string())
            .or_default()
            .insert(candidate_id.to_string(), liked);
    }

    /// Every candidate id that has received at least one swipe from
    /// anyone, in ascending order. Candidates nobody swiped on are not
    /// part of the universe and can never match.
    pub fn candidate_universe(&self) -> BTreeSet<&str> {
        self.decisions
            .values()
            .flat_map(|by_candidate| by_candidate.keys().map(String::as_str))
            .collect()
    }

    /// Whether a participant has a recorded `liked = true` for a
    /// candidate. No recorded decision counts as not liked.
    pub fn liked(&self, participant_id: &str, candidate_id: &str) -> bool {
        self.decisions
            .get(participant_id)
            .and_then(|by_candidate| by_candidate.get(candidate_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_is_last_write_wins() {
        let db = crate::db::memory_pool().await;

        Swipe::record(&db, "S", "p1", "c1", true).await.unwrap();
        Swipe::record(&db, "S", "p1", "c1", false).await.unwrap();

        let ledger = SwipeLedger::load(&db, "S").await.unwrap();
        assert!(!ledger.liked("p1", "c1"));

        Swipe::record(&db, "S", "p1", "c1", true).await.unwrap();
        let ledger = SwipeLedger::load(&db, "S").await.unwrap();
        assert!(ledger.liked("p1", "c1"));
    }

    #[tokio::test]
    async fn test_ledger_is_scoped_to_session() {
        let db = crate::db::memory_pool().await;

        Swipe::record(&db, "AAA", "p1", "c1", true).await.unwrap();
        Swipe::record(&db, "BBB", "p1", "c2", true).await.unwrap();

        let ledger = SwipeLedger::load(&db, "AAA").await.unwrap();
        assert!(ledger.liked("p1", "c1"));
        assert!(!ledger.liked("p1", "c2"));
    }

    #[test]
    fn test_candidate_universe_is_sorted_and_distinct() {
        let mut ledger = SwipeLedger::default();
        ledger.record("p2", "zeta", true);
        ledger.record("p1", "alpha", false);
        ledger.record("p1", "zeta", true);

        let universe: Vec<&str> = ledger.candidate_universe().into_iter().collect();
        assert_eq!(universe, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_missing_decision_is_not_liked() {
        let ledger = SwipeLedger::default();
        assert!(!ledger.liked("p1", "c1"));
        assert!(ledger.is_empty());
    }
}
