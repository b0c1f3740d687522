//! Session model: the short-lived group a roster swipes in.
//!
//! A session is identified by a short human-typeable code so it can be
//! read out loud across a table. Codes use an ambiguity-reduced alphabet
//! (no I/O/0/1) and are retried on collision.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Alphabet for session codes, with easily-confused characters removed.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// How many collision retries before giving up on code generation.
const CODE_RETRIES: usize = 5;

/// Hard cap on candidates per session regardless of what the client asks for.
pub const MAX_CANDIDATE_CAP: i64 = 100;

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Seeding,
    Ready,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::Seeding => "seeding",
            SessionStatus::Ready => "ready",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "waiting" => Some(SessionStatus::Waiting),
            "seeding" => Some(SessionStatus::Seeding),
            "ready" => Some(SessionStatus::Ready),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A session record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub code: String,
    pub host_id: String,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub max_candidates: i64,
    pub created_at: String,
}

/// Request body for creating a session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub host_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub max_candidates: Option<i64>,
}

/// Request body for joining a session
#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    pub name: String,
}

/// Generate a single candidate code from the reduced alphabet
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Clamp the requested candidate count to a sane range
pub fn clamp_max_candidates(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_CANDIDATE_CAP)
}

impl Session {
    /// Generate a code not yet present in the sessions table
    pub async fn unique_code(db: &SqlitePool, length: usize) -> Result<String, sqlx::Error> {
        for _ in 0..CODE_RETRIES {
            let code = generate_code(length);
            if !Self::code_exists(db, &code).await? {
                return Ok(code);
            }
        }
        // Astronomically unlikely with a 32^6 space; surface as a proper error
        Err(sqlx::Error::Protocol(
            "could not generate a unique session code".into(),
        ))
    }

    pub async fn code_exists(db: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT code FROM sessions WHERE code = ?")
            .bind(code)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    /// Create a new session in `waiting` status
    pub async fn create(
        db: &SqlitePool,
        code: &str,
        host_id: &str,
        latitude: f64,
        longitude: f64,
        max_candidates: i64,
    ) -> Result<Session, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO sessions (code, host_id, status, latitude, longitude, max_candidates, created_at)
            VALUES (?, ?, 'waiting', ?, ?, ?, ?)
            "#,
        )
        .bind(code)
        .bind(host_id)
        .bind(latitude)
        .bind(longitude)
        .bind(max_candidates)
        .bind(&now)
        .execute(db)
        .await?;

        Self::get_by_code(db, code)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_code(db: &SqlitePool, code: &str) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT code, host_id, status, latitude, longitude, max_candidates, created_at
            FROM sessions
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(db)
        .await
    }

    pub async fn set_status(
        db: &SqlitePool,
        code: &str,
        status: SessionStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET status = ? WHERE code = ?")
            .bind(status.as_str())
            .bind(code)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Transition the status only if it currently holds `from`. Returns
    /// true iff the transition applied; a concurrent writer that changed
    /// the status first wins.
    pub async fn set_status_if(
        db: &SqlitePool,
        code: &str,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sessions SET status = ? WHERE code = ? AND status = ?")
            .bind(to.as_str())
            .bind(code)
            .bind(from.as_str())
            .execute(db)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub fn status(&self) -> Option<SessionStatus> {
        SessionStatus::from_str(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_roundtrip() {
        assert_eq!(SessionStatus::Waiting.as_str(), "waiting");
        assert_eq!(SessionStatus::Seeding.as_str(), "seeding");
        assert_eq!(SessionStatus::Ready.as_str(), "ready");

        assert_eq!(
            SessionStatus::from_str("waiting"),
            Some(SessionStatus::Waiting)
        );
        assert_eq!(SessionStatus::from_str("READY"), Some(SessionStatus::Ready));
        assert_eq!(SessionStatus::from_str("expired"), None);
    }

    #[test]
    fn test_generate_code_length_and_alphabet() {
        for _ in 0..50 {
            let code = generate_code(6);
            assert_eq!(code.len(), 6);
            for c in code.bytes() {
                assert!(
                    CODE_ALPHABET.contains(&c),
                    "unexpected character {:?} in code",
                    c as char
                );
            }
        }
    }

    #[test]
    fn test_code_alphabet_excludes_ambiguous() {
        for banned in [b'I', b'O', b'0', b'1'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
    }

    #[test]
    fn test_clamp_max_candidates() {
        assert_eq!(clamp_max_candidates(None, 30), 30);
        assert_eq!(clamp_max_candidates(Some(10), 30), 10);
        assert_eq!(clamp_max_candidates(Some(0), 30), 1);
        assert_eq!(clamp_max_candidates(Some(-5), 30), 1);
        assert_eq!(clamp_max_candidates(Some(500), 30), MAX_CANDIDATE_CAP);
    }

    #[tokio::test]
    async fn test_create_and_fetch_session() {
        let db = crate::db::memory_pool().await;

        let session = Session::create(&db, "ABC234", "host-1", 40.7, -74.0, 30)
            .await
            .unwrap();
        assert_eq!(session.code, "ABC234");
        assert_eq!(session.status(), Some(SessionStatus::Waiting));
        assert!(Session::code_exists(&db, "ABC234").await.unwrap());
        assert!(!Session::code_exists(&db, "ZZZZZZ").await.unwrap());

        Session::set_status(&db, "ABC234", SessionStatus::Ready)
            .await
            .unwrap();
        let session = Session::get_by_code(&db, "ABC234").await.unwrap().unwrap();
        assert_eq!(session.status(), Some(SessionStatus::Ready));
    }

    #[tokio::test]
    async fn test_set_status_if_only_applies_from_expected_state() {
        let db = crate::db::memory_pool().await;
        Session::create(&db, "COND01", "h", 0.0, 0.0, 30).await.unwrap();

        assert!(
            Session::set_status_if(&db, "COND01", SessionStatus::Waiting, SessionStatus::Seeding)
                .await
                .unwrap()
        );
        // Already left `waiting`: a second claim loses
        assert!(
            !Session::set_status_if(&db, "COND01", SessionStatus::Waiting, SessionStatus::Seeding)
                .await
                .unwrap()
        );

        // A session that reached `ready` is not knocked back by a stale reset
        Session::set_status(&db, "COND01", SessionStatus::Ready)
            .await
            .unwrap();
        assert!(
            !Session::set_status_if(&db, "COND01", SessionStatus::Seeding, SessionStatus::Waiting)
                .await
                .unwrap()
        );
        let session = Session::get_by_code(&db, "COND01").await.unwrap().unwrap();
        assert_eq!(session.status(), Some(SessionStatus::Ready));
    }
}
