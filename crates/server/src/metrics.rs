//! Prometheus metrics
//!
//! The recorder is process-wide; [`init_metrics`] installs it once and
//! hands out clones of the render handle.

use axum::extract::State;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;

use crate::state::AppState;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                // another recorder owns the process; render an empty registry
                tracing::warn!(error = %e, "Prometheus recorder not installed");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

pub fn record_turn(state: &str, failed: bool, latency: Duration) {
    let outcome = if failed { "failed" } else { "ok" };
    metrics::counter!(
        "kiosk_turns_total",
        "state" => state.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("kiosk_turn_duration_seconds").record(latency.as_secs_f64());
}

/// Count a turn that ended in the retry prompt, by cause and dialogue stage
pub fn record_generation_failure(kind: &'static str, stage: &'static str) {
    metrics::counter!(
        "kiosk_generation_failures_total",
        "kind" => kind,
        "stage" => stage
    )
    .increment(1);
}

/// Count a dialogue event such as an escalation or a lookup miss
pub fn record_turn_event(event: &'static str) {
    metrics::counter!("kiosk_dialogue_events_total", "event" => event).increment(1);
}

pub fn record_stt_latency(latency: Duration, ok: bool) {
    metrics::histogram!("kiosk_stt_duration_seconds", "ok" => ok.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_tts_latency(latency: Duration, ok: bool) {
    metrics::histogram!("kiosk_tts_duration_seconds", "ok" => ok.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_health_probe(component: &'static str, healthy: bool) {
    metrics::gauge!("kiosk_component_up", "component" => component)
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn set_active_sessions(count: usize) {
    metrics::gauge!("kiosk_active_sessions").set(count as f64);
}
