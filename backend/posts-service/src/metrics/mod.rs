//! Prometheus metrics for posts-service
//!
//! Tracks page cache effectiveness and content writes.

use actix_web::HttpResponse;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static::lazy_static! {
    /// Page cache lookups by outcome (hit/miss/error)
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "posts_service_page_cache_events_total",
        "Page cache lookups and stores by outcome",
        &["event"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Content created or changed by users (post/post_edit/comment/follow/unfollow)
    pub static ref CONTENT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posts_service_content_writes_total",
        "Content writes by kind",
        &["kind"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

pub fn record_cache_event(event: &str) {
    PAGE_CACHE_EVENTS.with_label_values(&[event]).inc();
}

pub fn record_write(kind: &str) {
    CONTENT_WRITES_TOTAL.with_label_values(&[kind]).inc();
}

/// GET /metrics
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %err, "failed to encode metrics");
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = PAGE_CACHE_EVENTS.with_label_values(&["probe"]).get();
        record_cache_event("probe");
        assert_eq!(PAGE_CACHE_EVENTS.with_label_values(&["probe"]).get(), before + 1);

        let before = CONTENT_WRITES_TOTAL.with_label_values(&["probe"]).get();
        record_write("probe");
        assert_eq!(
            CONTENT_WRITES_TOTAL.with_label_values(&["probe"]).get(),
            before + 1
        );
    }
}
