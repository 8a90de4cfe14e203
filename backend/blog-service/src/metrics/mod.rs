//! Prometheus metrics for blog-service.
//!
//! HTTP collectors are fed by `MetricsMiddleware`; content counters by the
//! services. Pool gauges come from `db_pool`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Requests by method, matched route pattern and status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_http_requests_total",
        "HTTP requests segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register blog_http_requests_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_http_request_duration_seconds",
        "HTTP request latency segmented by method and route",
        &["method", "route"]
    )
    .expect("failed to register blog_http_request_duration_seconds");

    /// Successful writes by entity (post, comment, ...) and action.
    pub static ref CONTENT_MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_content_mutations_total",
        "Content writes segmented by entity and action",
        &["entity", "action"]
    )
    .expect("failed to register blog_content_mutations_total");

    /// Edit/delete attempts on someone else's content.
    pub static ref OWNERSHIP_REFUSALS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_ownership_refusals_total",
        "Mutation attempts refused because the requester is not the author",
        &["entity"]
    )
    .expect("failed to register blog_ownership_refusals_total");
}

pub fn record_mutation(entity: &str, action: &str) {
    CONTENT_MUTATIONS_TOTAL
        .with_label_values(&[entity, action])
        .inc();
}

pub fn record_ownership_refusal(entity: &str) {
    OWNERSHIP_REFUSALS_TOTAL.with_label_values(&[entity]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_metrics_exposition_includes_counters() {
        record_mutation("post", "create");
        let resp = serve_metrics().await;
        assert!(resp.status().is_success());

        let body = to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("blog_content_mutations_total"));
    }
}
