//! Participant (roster) model.
//!
//! The roster for a session only ever grows: nothing in the schema or
//! the queries removes a participant, and the match evaluator relies on
//! that to keep confirmed matches stable once announced.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// A participant in a session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: String,
    pub session_code: String,
    pub name: String,
    pub joined_at: String,
}

impl Participant {
    /// Add a participant to a session's roster. Re-joining with the same
    /// id refreshes the display name (last write wins).
    pub async fn join(
        db: &SqlitePool,
        session_code: &str,
        id: &str,
        name: &str,
    ) -> Result<Participant, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO participants (id, session_code, name, joined_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(session_code, id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(id)
        .bind(session_code)
        .bind(name)
        .bind(&now)
        .execute(db)
        .await?;

        Self::get(db, session_code, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get(
        db: &SqlitePool,
        session_code: &str,
        id: &str,
    ) -> Result<Option<Participant>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, session_code, name, joined_at
            FROM participants
            WHERE session_code = ? AND id = ?
            "#,
        )
        .bind(session_code)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Current roster snapshot for a session, in join order
    pub async fn roster(
        db: &SqlitePool,
        session_code: &str,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, session_code, name, joined_at
            FROM participants
            WHERE session_code = ?
            ORDER BY joined_at ASC, id ASC
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
    use crate::db::Session;

    #[tokio::test]
    async fn test_roster_grows_and_rejoin_updates_name() {
        let db = crate::db::memory_pool().await;
        Session::create(&db, "ROSTER", "p1", 0.0, 0.0, 30)
            .await
            .unwrap();

        Participant::join(&db, "ROSTER", "p1", "Ada").await.unwrap();
        Participant::join(&db, "ROSTER", "p2", "Grace")
            .await
            .unwrap();
        assert_eq!(Participant::roster(&db, "ROSTER").await.unwrap().len(), 2);

        // Same id again: no roster growth, name refreshed
        Participant::join(&db, "ROSTER", "p1", "Ada L.")
            .await
            .unwrap();
        let roster = Participant::roster(&db, "ROSTER").await.unwrap();
        assert_eq!(roster.len(), 2);
        let ada = roster.iter().find(|p| p.id == "p1").unwrap();
        assert_eq!(ada.name, "Ada L.");
    }
}
