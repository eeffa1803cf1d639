use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::state::AppState;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: BTreeMap<&'static str, ComponentCheck>,
    timestamp: String,
}

/// Liveness: the process is up and serving
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "posts-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness
///
/// - storage is critical: 503 when unreachable
/// - page cache is optional: pages are served uncached when it is down
pub async fn readiness_check(state: web::Data<AppState>) -> impl Responder {
    let mut checks = BTreeMap::new();
    let mut overall = ComponentStatus::Healthy;

    let start = Instant::now();
    let storage = match state.store.ping().await {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "storage reachable".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        },
        Err(e) => {
            overall = ComponentStatus::Unhealthy;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("storage unreachable: {}", e),
                latency_ms: start.elapsed().as_millis() as u64,
            }
        }
    };
    checks.insert("storage", storage);

    let start = Instant::now();
    let cache = match state.page_cache.ping().await {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "page cache reachable".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        },
        Err(e) => {
            if overall == ComponentStatus::Healthy {
                overall = ComponentStatus::Degraded;
            }
            ComponentCheck {
                status: ComponentStatus::Degraded,
                message: format!("page cache unreachable: {}", e),
                latency_ms: start.elapsed().as_millis() as u64,
            }
        }
    };
    checks.insert("page_cache", cache);

    let ready = overall != ComponentStatus::Unhealthy;
    let response = ReadinessResponse {
        ready,
        status: overall,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        tracing::warn!("readiness check failed");
        HttpResponse::ServiceUnavailable().json(response)
    }
}
