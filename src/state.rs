use std::sync::Arc;

use crate::config::Config;
use crate::distance::DistanceProvider;
use crate::observability::metrics::Metrics;
use crate::pricing::PriceTable;
use crate::relay::PositionRelay;
use crate::store::RequestStore;

pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub distance: Arc<dyn DistanceProvider>,
    pub prices: PriceTable,
    pub relay: PositionRelay,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn RequestStore>,
        distance: Arc<dyn DistanceProvider>,
    ) -> Self {
        let metrics = Metrics::new();
        let relay = PositionRelay::new(store.clone(), metrics.clone(), config.watcher_buffer_size);

        Self {
            store,
            distance,
            prices: config.prices.clone(),
            relay,
            metrics,
        }
    }
}
