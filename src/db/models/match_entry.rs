//! Match store: confirmed consensus records.
//!
//! Rows are insert-only. A candidate that reaches the match set stays
//! there for the session's lifetime; later roster changes never retract
//! it. `commit` is a conditional write-if-absent so that when two
//! evaluators race on the same candidate, exactly one of them observes
//! the insert and gets to announce it.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// A confirmed match record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchEntry {
    pub session_code: String,
    pub candidate_id: String,
    pub matched_at: String,
}

/// A confirmed match joined with its candidate's details, for rendering
/// the match list.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchedCandidate {
    pub candidate_id: String,
    pub name: String,
    pub address: String,
    pub photo_url: Option<String>,
    pub matched_at: String,
}

impl MatchEntry {
    /// Point existence check
    pub async fn contains(
        db: &SqlitePool,
        session_code: &str,
        candidate_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT candidate_id FROM matches WHERE session_code = ? AND candidate_id = ?",
        )
        .bind(session_code)
        .bind(candidate_id)
        .fetch_optional(db)
        .await?;
        Ok(row.is_some())
    }

    /// Conditionally record a match. Returns true iff this call inserted
    /// the row; a concurrent writer that lost the race gets false and
    /// must not announce.
    pub async fn commit(
        db: &SqlitePool,
        session_code: &str,
        candidate_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO matches (session_code, candidate_id, matched_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(session_code)
        .bind(candidate_id)
        .bind(&now)
        .execute(db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// The already-confirmed candidate ids for a session
    pub async fn confirmed_ids(
        db: &SqlitePool,
        session_code: &str,
    ) -> Result<HashSet<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT candidate_id FROM matches WHERE session_code = ?")
                .bind(session_code)
                .fetch_all(db)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Confirmed matches joined with candidate details, newest first
    pub async fn list_for_session(
        db: &SqlitePool,
        session_code: &str,
    ) -> Result<Vec<MatchedCandidate>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT m.candidate_id, c.name, c.address, c.photo_url, m.matched_at
            FROM matches m
            JOIN candidates c ON c.session_code = m.session_code AND c.id = m.candidate_id
            WHERE m.session_code = ?
            ORDER BY m.matched_at DESC, m.candidate_id ASC
            "#,
        )
        .bind(session_code)
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Candidate, CandidateSeed, Session};

    #[tokio::test]
    async fn test_commit_is_write_if_absent() {
        let db = crate::db::memory_pool().await;

        assert!(!MatchEntry::contains(&db, "S", "c1").await.unwrap());

        // First writer inserts, second is a silent no-op
        assert!(MatchEntry::commit(&db, "S", "c1").await.unwrap());
        assert!(!MatchEntry::commit(&db, "S", "c1").await.unwrap());

        assert!(MatchEntry::contains(&db, "S", "c1").await.unwrap());
        let ids = MatchEntry::confirmed_ids(&db, "S").await.unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("c1"));
    }

    #[tokio::test]
    async fn test_list_joins_candidate_details() {
        let db = crate::db::memory_pool().await;
        Session::create(&db, "JOINED", "h", 0.0, 0.0, 30)
            .await
            .unwrap();
        Candidate::insert_all(
            &db,
            "JOINED",
            &[CandidateSeed {
                name: "Taco Tavern".into(),
                address: "9 Ninth St".into(),
                photo_url: None,
            }],
        )
        .await
        .unwrap();

        MatchEntry::commit(&db, "JOINED", "TacoTavern9NinthSt")
            .await
            .unwrap();

        let listed = MatchEntry::list_for_session(&db, "JOINED").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Taco Tavern");
        assert_eq!(listed[0].candidate_id, "TacoTavern9NinthSt");
    }
}
