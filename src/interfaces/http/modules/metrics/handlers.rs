use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use metrics_exporter_prometheus::PrometheusHandle;

/// Prometheus exposition format, version 0.0.4.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// `GET /metrics`. Public, scraped by Prometheus.
///
/// Besides the HTTP series this exposes the directory counters
/// `user_directory_users_{created,updated,deleted,restored}_total`.
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.handle.render(),
    )
}
