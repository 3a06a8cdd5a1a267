use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: slot catalog queries served.
pub const SLOT_QUERIES_TOTAL: &str = "slotbook_slot_queries_total";

/// Counter: slots materialized into the store.
pub const SLOTS_CREATED_TOTAL: &str = "slotbook_slots_created_total";

/// Counter: reservations committed.
pub const RESERVATIONS_CREATED_TOTAL: &str = "slotbook_reservations_created_total";

/// Counter: reservation attempts that lost the race for a slot.
pub const RESERVATION_CONFLICTS_TOTAL: &str = "slotbook_reservation_conflicts_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "slotbook_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "slotbook_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
