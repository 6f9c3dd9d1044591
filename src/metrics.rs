//! Prometheus metrics registry for the drone dispatch service.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the battery sweep and HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry,
};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Total number of battery sweep ticks executed.
    pub sweep_ticks_total: Counter,
    /// Total number of low-battery events recorded by the sweep.
    pub low_battery_events_total: Counter,
    /// Unix timestamp of the last completed sweep tick.
    pub last_sweep_timestamp: Gauge,
    /// Total number of drones registered through the API.
    pub drones_registered_total: Counter,
    /// Total number of successful medication loads.
    pub medication_loads_total: Counter,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated (should not happen in practice).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let sweep_ticks_total = Counter::with_opts(Opts::new(
            "drone_dispatch_sweep_ticks_total",
            "Total battery sweep ticks executed",
        ))?;

        let low_battery_events_total = Counter::with_opts(Opts::new(
            "drone_dispatch_low_battery_events_total",
            "Low-battery events recorded by the sweep",
        ))?;

        let last_sweep_timestamp = Gauge::with_opts(Opts::new(
            "drone_dispatch_last_sweep_timestamp_seconds",
            "Unix timestamp of the last completed sweep tick",
        ))?;

        let drones_registered_total = Counter::with_opts(Opts::new(
            "drone_dispatch_drones_registered_total",
            "Drones registered through the API",
        ))?;

        let medication_loads_total = Counter::with_opts(Opts::new(
            "drone_dispatch_medication_loads_total",
            "Successful medication loads",
        ))?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "drone_dispatch_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "drone_dispatch_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(sweep_ticks_total.clone()))?;
        registry.register(Box::new(low_battery_events_total.clone()))?;
        registry.register(Box::new(last_sweep_timestamp.clone()))?;
        registry.register(Box::new(drones_registered_total.clone()))?;
        registry.register(Box::new(medication_loads_total.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            sweep_ticks_total,
            low_battery_events_total,
            last_sweep_timestamp,
            drones_registered_total,
            medication_loads_total,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
