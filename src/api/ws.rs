//! WebSocket match feed.
//!
//! Clients subscribe to a session's live match stream. On connect they
//! receive a snapshot of already-confirmed matches, then one event per
//! newly confirmed match. The broadcast subscription is taken before the
//! snapshot is read so nothing confirmed in between is lost; a sent-id
//! set keeps the overlap from producing duplicates on the wire.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, StreamExt};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::db::MatchEntry;
use crate::AppState;

use super::error::ApiError;
use super::sessions::checked_code;

/// GET /api/sessions/:code/matches/stream
pub async fn match_feed_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let code = checked_code(&state, &code)?;
    Ok(ws.on_upgrade(move |socket| handle_match_feed(socket, state, code)))
}

/// Send every confirmed match the client has not seen yet, recording
/// each id in `sent`. Returns Ok(false) when the socket is gone.
async fn send_confirmed<S>(
    db: &SqlitePool,
    session_code: &str,
    sender: &mut S,
    sent: &mut HashSet<String>,
) -> Result<bool, sqlx::Error>
where
    S: Sink<Message> + Unpin,
{
    let existing = MatchEntry::list_for_session(db, session_code).await?;
    for entry in existing {
        if sent.contains(&entry.candidate_id) {
            continue;
        }
        let msg = serde_json::json!({
            "type": "match",
            "session_code": session_code,
            "candidate_id": entry.candidate_id.clone(),
            "matched_at": entry.matched_at,
        });
        if sender.send(Message::Text(msg.to_string())).await.is_err() {
            return Ok(false);
        }
        sent.insert(entry.candidate_id);
    }
    Ok(true)
}

async fn handle_match_feed(socket: WebSocket, state: Arc<AppState>, session_code: String) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the snapshot so no confirmation is missed
    let mut feed = state.feed.subscribe(&session_code);
    let mut sent: HashSet<String> = HashSet::new();

    // Send everything already confirmed
    match send_confirmed(&state.db, &session_code, &mut sender, &mut sent).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(e) => {
            let error_msg = serde_json::json!({
                "type": "error",
                "message": format!("Failed to load matches: {}", e)
            });
            let _ = sender.send(Message::Text(error_msg.to_string())).await;
            return;
        }
    }

    // Forward live confirmations until either side disconnects
    loop {
        tokio::select! {
            event = feed.recv() => {
                match event {
                    Ok(event) => {
                        if !sent.insert(event.candidate_id.clone()) {
                            continue;
                        }
                        let msg = serde_json::json!({
                            "type": "match",
                            "session_code": event.session_code,
                            "candidate_id": event.candidate_id,
                            "matched_at": event.matched_at,
                        });
                        if sender.send(Message::Text(msg.to_string())).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            session = %session_code,
                            skipped = skipped,
                            "Match feed subscriber lagged, resyncing from the store"
                        );
                        // Skipped events are already committed, so the
                        // store has everything the channel dropped
                        match send_confirmed(&state.db, &session_code, &mut sender, &mut sent).await
                        {
                            Ok(true) => {}
                            Ok(false) => return,
                            Err(e) => {
                                tracing::warn!(
                                    session = %session_code,
                                    error = %e,
                                    "Failed to resync match feed after lag"
                                );
                            }
                        }
                    }
                    Err(RecvError::Closed) => {
                        let _ = sender.send(Message::Text(r#"{"type":"end"}"#.to_string())).await;
                        return;
                    }
                }
            }

            // Handle incoming messages (for ping/pong or close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}
