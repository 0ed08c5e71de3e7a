//! Prometheus metrics for the workflow API server.
//!
//! # Metric Categories
//!
//! - **HTTP metrics**: request counts, latencies, in-flight gauge by route
//! - **Orchestrator metrics**: latency of calls made to the workflow engine
//! - **Status-stream metrics**: active WebSocket subscriber counts

#[cfg(feature = "metrics")]
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[cfg(feature = "metrics")]
const HTTP_LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[cfg(feature = "metrics")]
const ORCHESTRATOR_LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Prometheus metrics for the workflow API.
#[cfg(feature = "metrics")]
#[derive(Clone)]
pub struct WorkflowMetrics {
    pub registry: Registry,

    /// Total HTTP requests by method, route, status.
    pub http_requests_total: IntCounterVec,

    /// HTTP request duration in seconds by method, route.
    pub http_request_duration_seconds: HistogramVec,

    /// Currently in-flight HTTP requests.
    pub http_requests_in_flight: IntGauge,

    /// Orchestrator calls by operation (register, unpause, trigger, poll, ...).
    pub orchestrator_calls_total: IntCounterVec,

    /// Orchestrator call duration in seconds by operation.
    pub orchestrator_call_duration_seconds: HistogramVec,

    /// Currently active status-stream WebSocket subscribers, by channel.
    pub ws_subscribers: prometheus::IntGaugeVec,
}

#[cfg(feature = "metrics")]
impl WorkflowMetrics {
    /// Builds metrics registered against a fresh Prometheus registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Builds metrics registered against the given Prometheus registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests").namespace("scyflow"),
            &["method", "route", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .namespace("scyflow")
            .buckets(HTTP_LATENCY_BUCKETS.to_vec()),
            &["method", "route"],
        )?;

        let http_requests_in_flight = IntGauge::new(
            "scyflow_http_requests_in_flight",
            "Currently in-flight HTTP requests",
        )?;

        let orchestrator_calls_total = IntCounterVec::new(
            Opts::new("orchestrator_calls_total", "Total orchestrator API calls").namespace("scyflow"),
            &["operation", "result"],
        )?;

        let orchestrator_call_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "orchestrator_call_duration_seconds",
                "Orchestrator API call duration in seconds",
            )
            .namespace("scyflow")
            .buckets(ORCHESTRATOR_LATENCY_BUCKETS.to_vec()),
            &["operation"],
        )?;

        let ws_subscribers = prometheus::IntGaugeVec::new(
            Opts::new("ws_subscribers", "Active status-stream subscribers").namespace("scyflow"),
            &["channel"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(orchestrator_calls_total.clone()))?;
        registry.register(Box::new(orchestrator_call_duration_seconds.clone()))?;
        registry.register(Box::new(ws_subscribers.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            orchestrator_calls_total,
            orchestrator_call_duration_seconds,
            ws_subscribers,
        })
    }

    /// Encodes every metric as Prometheus text format.
    ///
    /// Gathers from both `self.registry` and `prometheus::default_registry()`
    /// so metrics any dependency registers globally (rather than against
    /// this instance) still show up on a scrape, deduping by family name
    /// with this registry taking precedence on a collision.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();

        let custom_families = self.registry.gather();
        let custom_names: std::collections::HashSet<String> =
            custom_families.iter().map(|f| f.get_name().to_string()).collect();

        let default_families = prometheus::default_registry().gather();

        let mut merged_families = custom_families;
        let mut collisions = 0;
        for family in default_families {
            if custom_names.contains(family.get_name()) {
                collisions += 1;
                tracing::debug!(
                    metric = family.get_name(),
                    "metric family present in both registries, using local version"
                );
            } else {
                merged_families.push(family);
            }
        }
        if collisions > 0 {
            tracing::debug!(collisions, "merged metrics from local and default registries");
        }

        encoder.encode_to_string(&merged_families)
    }

    /// Records a completed HTTP request.
    pub fn record_http_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, route, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, route])
            .observe(duration_secs);
    }

    /// Records a completed orchestrator call.
    pub fn record_orchestrator_call(&self, operation: &str, duration_secs: f64, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.orchestrator_calls_total
            .with_label_values(&[operation, result])
            .inc();
        self.orchestrator_call_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Adjusts the active subscriber count for a status-stream channel.
    pub fn adjust_ws_subscribers(&self, channel: &str, delta: i64) {
        self.ws_subscribers.with_label_values(&[channel]).add(delta);
    }
}

/// Timer guard that records an observation into a histogram on drop or
/// explicit [`MetricTimer::stop`].
#[cfg(feature = "metrics")]
pub struct MetricTimer {
    start: std::time::Instant,
    histogram: Histogram,
}

#[cfg(feature = "metrics")]
impl MetricTimer {
    pub fn new(histogram: Histogram) -> Self {
        Self {
            start: std::time::Instant::now(),
            histogram,
        }
    }

    /// Stops the timer, records the elapsed duration, and returns it.
    pub fn stop(self) -> f64 {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
        duration
    }
}
