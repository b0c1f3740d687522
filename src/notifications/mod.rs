//! Match notification sink and the in-process match feed.
//!
//! The evaluator announces confirmed matches through the [`MatchSink`]
//! trait so its logic stays independent of the delivery mechanism.
//! The production sink is [`MatchFeed`], a per-session broadcast hub
//! that WebSocket handlers subscribe to. Dropping a receiver is the
//! unsubscribe; no listener bookkeeping outlives the subscriber.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

/// Buffered events per session channel before slow subscribers lag
const FEED_CAPACITY: usize = 64;

/// A confirmed match, as delivered to subscribers
#[derive(Debug, Clone, Serialize)]
pub struct MatchEvent {
    pub session_code: String,
    pub candidate_id: String,
    pub matched_at: String,
}

impl MatchEvent {
    pub fn new(session_code: &str, candidate_id: &str) -> Self {
        Self {
            session_code: session_code.to_string(),
            candidate_id: candidate_id.to_string(),
            matched_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Sink invoked exactly once per newly confirmed match
#[async_trait]
pub trait MatchSink: Send + Sync {
    async fn match_confirmed(&self, session_code: &str, candidate_id: &str);
}

/// Per-session broadcast hub for live match delivery
#[derive(Debug, Default)]
pub struct MatchFeed {
    channels: DashMap<String, broadcast::Sender<MatchEvent>>,
}

impl MatchFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a session's match feed. The subscription ends when
    /// the returned receiver is dropped.
    pub fn subscribe(&self, session_code: &str) -> broadcast::Receiver<MatchEvent> {
        self.channels
            .entry(session_code.to_string())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }

    /// Publish a match event to current subscribers, if any
    pub fn publish(&self, event: MatchEvent) {
        if let Some(sender) = self.channels.get(&event.session_code) {
            // Err means every receiver is gone; drop the channel so idle
            // sessions don't accumulate senders forever.
            if sender.send(event.clone()).is_err() {
                drop(sender);
                self.channels
                    .remove_if(&event.session_code, |_, s| s.receiver_count() == 0);
            }
        }
    }

    /// Number of live subscribers for a session
    pub fn subscriber_count(&self, session_code: &str) -> usize {
        self.channels
            .get(session_code)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MatchSink for MatchFeed {
    async fn match_confirmed(&self, session_code: &str, candidate_id: &str) {
        tracing::info!(
            session = %session_code,
            candidate = %candidate_id,
            "Match confirmed"
        );
        self.publish(MatchEvent::new(session_code, candidate_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let feed = MatchFeed::new();
        let mut rx = feed.subscribe("AAA111");

        feed.match_confirmed("AAA111", "c1").await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_code, "AAA111");
        assert_eq!(event.candidate_id, "c1");
    }

    #[tokio::test]
    async fn test_events_are_scoped_per_session() {
        let feed = MatchFeed::new();
        let mut rx_a = feed.subscribe("AAA111");
        let _rx_b = feed.subscribe("BBB222");

        feed.match_confirmed("BBB222", "c9").await;
        feed.match_confirmed("AAA111", "c1").await;

        // rx_a only ever sees its own session's match
        let event = rx_a.recv().await.unwrap();
        assert_eq!(event.candidate_id, "c1");
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let feed = MatchFeed::new();
        // No subscriber ever existed for this session
        feed.match_confirmed("GHOST1", "c1").await;

        // A fully dropped subscription cleans up the channel
        let rx = feed.subscribe("DROPPED");
        drop(rx);
        feed.match_confirmed("DROPPED", "c2").await;
        assert_eq!(feed.subscriber_count("DROPPED"), 0);
    }
}
