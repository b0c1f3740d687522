mod evaluator;
mod seeder;

pub use evaluator::*;
pub use seeder::*;

use crate::notifications::MatchSink;
use crate::DbPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

/// Seconds between periodic re-checks of recently active sessions
const RECHECK_INTERVAL_SECS: u64 = 60;

/// The match engine: a single consumer of evaluation triggers.
///
/// API handlers push a session code after every ledger or roster write;
/// running all evaluation through one queue serializes passes within
/// this process. Across processes, correctness comes from the match
/// store's conditional commit, not from this queue.
pub struct MatchEngine {
    rx: mpsc::Receiver<String>,
    evaluator: MatchEvaluator,
}

impl MatchEngine {
    pub fn new(db: DbPool, sink: Arc<dyn MatchSink>, rx: mpsc::Receiver<String>) -> Self {
        Self {
            rx,
            evaluator: MatchEvaluator::with_sink(db, sink),
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Match engine started");

        let mut recheck = interval(Duration::from_secs(RECHECK_INTERVAL_SECS));

        loop {
            tokio::select! {
                trigger = self.rx.recv() => {
                    match trigger {
                        Some(session_code) => {
                            tracing::debug!(session = %session_code, "Evaluation triggered");
                            self.evaluator.evaluate_session(&session_code).await;
                        }
                        None => break,
                    }
                }
                _ = recheck.tick() => {
                    self.evaluator.evaluate_recent().await;
                }
            }
        }

        tracing::info!("Match engine stopped");
    }
}
