use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::observability::metrics::Metrics;
use crate::store::{RequestStore, StoreError};

// Wire frame pushed to tracking watchers:
// {"type":"location_update","data":{"latitude":...,"longitude":...}}
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TrackingMessage {
    LocationUpdate {
        #[serde(with = "rust_decimal::serde::float")]
        latitude: Decimal,
        #[serde(with = "rust_decimal::serde::float")]
        longitude: Decimal,
    },
}

struct Watcher {
    id: u64,
    tx: mpsc::Sender<TrackingMessage>,
}

// Fans position updates out to at most one live watcher per tracking code.
// The store write always happens first, so a watcherless update is never
// lost, just not pushed.
pub struct PositionRelay {
    store: Arc<dyn RequestStore>,
    watchers: DashMap<String, Watcher>,
    next_watcher_id: AtomicU64,
    buffer: usize,
    metrics: Metrics,
}

impl PositionRelay {
    pub fn new(store: Arc<dyn RequestStore>, metrics: Metrics, buffer: usize) -> Self {
        Self {
            store,
            watchers: DashMap::new(),
            next_watcher_id: AtomicU64::new(1),
            // mpsc::channel panics on zero capacity
            buffer: buffer.max(1),
            metrics,
        }
    }

    // Registers the caller as the watcher for `tracking_code`, replacing any
    // previous watcher. Dropping the superseded sender ends the old
    // receiver's stream, which is how its socket learns it was replaced.
    pub async fn register_watcher(
        &self,
        tracking_code: &str,
    ) -> Result<(u64, mpsc::Receiver<TrackingMessage>), StoreError> {
        let request = self.store.find_by_code(tracking_code).await?;

        let (tx, rx) = mpsc::channel(self.buffer);

        // Seed the last known position so a watcher that connects mid-trip
        // does not wait for the next update.
        if let (Some(latitude), Some(longitude)) =
            (request.current_latitude, request.current_longitude)
        {
            let _ = tx.try_send(TrackingMessage::LocationUpdate {
                latitude,
                longitude,
            });
        }

        let id = self.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .watchers
            .insert(tracking_code.to_string(), Watcher { id, tx });

        if previous.is_some() {
            self.metrics.active_watchers.dec();
            debug!(code = %tracking_code, "replaced existing watcher");
        }
        self.metrics.active_watchers.inc();

        Ok((id, rx))
    }

    // Removes the watcher only if `watcher_id` still owns the slot, so a
    // disconnecting socket can never evict the watcher that replaced it.
    pub fn unregister_watcher(&self, tracking_code: &str, watcher_id: u64) {
        let removed = self
            .watchers
            .remove_if(tracking_code, |_, watcher| watcher.id == watcher_id);

        if removed.is_some() {
            self.metrics.active_watchers.dec();
        }
    }

    pub async fn publish_position(
        &self,
        tracking_code: &str,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<(), StoreError> {
        let started = Instant::now();

        if let Err(err) = self
            .store
            .update_position(tracking_code, latitude, longitude)
            .await
        {
            self.metrics
                .position_updates_total
                .with_label_values(&["rejected"])
                .inc();
            self.metrics
                .publish_latency_seconds
                .with_label_values(&["rejected"])
                .observe(started.elapsed().as_secs_f64());
            return Err(err);
        }

        let outcome = match self.watchers.get(tracking_code) {
            Some(watcher) => match watcher.tx.try_send(TrackingMessage::LocationUpdate {
                latitude,
                longitude,
            }) {
                Ok(()) => "delivered",
                // A slow or gone watcher only misses the push; the stored
                // position is already current.
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(code = %tracking_code, "watcher channel full, dropping push");
                    "stored"
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(code = %tracking_code, "watcher channel closed, dropping push");
                    "stored"
                }
            },
            None => "stored",
        };

        self.metrics
            .position_updates_total
            .with_label_values(&[outcome])
            .inc();
        self.metrics
            .publish_latency_seconds
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());

        Ok(())
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }
}
