pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod notifications;
pub mod places;

pub use db::DbPool;

use config::Config;
use notifications::MatchFeed;
use places::PlacesClient;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    /// Queues session codes for the match engine to evaluate
    pub eval_tx: mpsc::Sender<String>,
    pub feed: Arc<MatchFeed>,
    pub places: PlacesClient,
}

impl AppState {
    pub fn new(
        config: Config,
        db: DbPool,
        eval_tx: mpsc::Sender<String>,
        feed: Arc<MatchFeed>,
    ) -> Self {
        let places = PlacesClient::new(
            config.places.base_url.clone(),
            config.places.api_key.clone(),
        );
        Self {
            config,
            db,
            eval_tx,
            feed,
            places,
        }
    }
}
