//! Prometheus metrics endpoint.
//!
//! Grounded on the teacher's `init_metrics`/`metrics_handler` split: a
//! process-wide `PrometheusHandle` installed once at startup, read back on
//! every scrape. The gauges themselves (`active_rooms`, `rooms_created`) are
//! recorded by the registry's periodic sweep in `main.rs`, the way the
//! teacher records session-count gauges from its own sweep task.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Installs the process-wide Prometheus recorder. Safe to call once; a
/// second call is a no-op (mirrors the teacher's idempotent
/// `init_metrics`).
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    let handle = PrometheusBuilder::new().install_recorder().expect("failed to install Prometheus recorder");
    let _ = HANDLE.set(handle);
}

pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}
