use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub freight_transitions_total: IntCounterVec,
    pub freight_transition_latency_seconds: HistogramVec,
    pub websocket_subscribers: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let freight_transitions_total = IntCounterVec::new(
            Opts::new(
                "freight_transitions_total",
                "Freight lifecycle transitions by event and outcome",
            ),
            &["event", "outcome"],
        )
        .expect("valid freight_transitions_total metric");

        let freight_transition_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "freight_transition_latency_seconds",
                "Latency of freight lifecycle transitions in seconds",
            ),
            &["event"],
        )
        .expect("valid freight_transition_latency_seconds metric");

        let websocket_subscribers = IntGauge::new(
            "websocket_subscribers",
            "Currently connected lifecycle event subscribers",
        )
        .expect("valid websocket_subscribers metric");

        registry
            .register(Box::new(freight_transitions_total.clone()))
            .expect("register freight_transitions_total");
        registry
            .register(Box::new(freight_transition_latency_seconds.clone()))
            .expect("register freight_transition_latency_seconds");
        registry
            .register(Box::new(websocket_subscribers.clone()))
            .expect("register websocket_subscribers");

        Self {
            registry,
            freight_transitions_total,
            freight_transition_latency_seconds,
            websocket_subscribers,
        }
    }

    pub fn record_transition(&self, event: &str, outcome: &str, elapsed_secs: f64) {
        self.freight_transitions_total
            .with_label_values(&[event, outcome])
            .inc();
        self.freight_transition_latency_seconds
            .with_label_values(&[event])
            .observe(elapsed_secs);
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
