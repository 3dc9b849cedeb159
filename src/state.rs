use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::auth::SessionKeys;
use crate::models::assignment::FreightEvent;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionKeys,
    pub freight_events_tx: broadcast::Sender<FreightEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(db: SqlitePool, sessions: SessionKeys, event_buffer_size: usize) -> Self {
        let (freight_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            db,
            sessions,
            freight_events_tx,
            metrics: Metrics::new(),
        }
    }
}
