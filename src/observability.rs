use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total reservation submissions. Labels: status.
pub const SUBMISSIONS_TOTAL: &str = "sarpras_submissions_total";

/// Histogram: submit latency in seconds.
pub const SUBMIT_DURATION_SECONDS: &str = "sarpras_submit_duration_seconds";

/// Counter: submissions rejected for overlap.
pub const CONFLICTS_TOTAL: &str = "sarpras_conflicts_total";

/// Counter: calendar day views served.
pub const CALENDAR_VIEWS_TOTAL: &str = "sarpras_calendar_views_total";

/// Counter: advisory annotations that fell back (error or timeout).
pub const ADVISORY_FALLBACKS_TOTAL: &str = "sarpras_advisory_fallbacks_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "sarpras_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "sarpras_wal_flush_batch_size";

/// Counter: booking notices sent to the hub.
pub const NOTICES_TOTAL: &str = "sarpras_notices_total";

/// Install the Prometheus metrics exporter on the given port. No-op if port
/// is None.
pub fn init_metrics(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install the default fmt tracing subscriber. Embedders with their own
/// subscriber skip this.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
