use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub requests_created_total: IntCounterVec,
    pub position_updates_total: IntCounterVec,
    pub active_watchers: IntGauge,
    pub publish_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let requests_created_total = IntCounterVec::new(
            Opts::new(
                "requests_created_total",
                "Total service requests created by outcome",
            ),
            &["outcome"],
        )
        .expect("valid requests_created_total metric");

        let position_updates_total = IntCounterVec::new(
            Opts::new(
                "position_updates_total",
                "Total position updates by outcome",
            ),
            &["outcome"],
        )
        .expect("valid position_updates_total metric");

        let active_watchers = IntGauge::new(
            "active_watchers",
            "Current number of registered tracking watchers",
        )
        .expect("valid active_watchers metric");

        let publish_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "publish_latency_seconds",
                "Latency of position publish processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid publish_latency_seconds metric");

        registry
            .register(Box::new(requests_created_total.clone()))
            .expect("register requests_created_total");
        registry
            .register(Box::new(position_updates_total.clone()))
            .expect("register position_updates_total");
        registry
            .register(Box::new(active_watchers.clone()))
            .expect("register active_watchers");
        registry
            .register(Box::new(publish_latency_seconds.clone()))
            .expect("register publish_latency_seconds");

        Self {
            registry,
            requests_created_total,
            position_updates_total,
            active_watchers,
            publish_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
