use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::errors::MonitorError;
use crate::pipeline::{ForceCheckReport, InventoryView, Monitor, StatusReport};

pub fn build_router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/inventory", get(inventory))
        .route("/api/status", get(status))
        .route("/api/health", get(health))
        .route("/api/force-check", post(force_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(monitor)
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = match &self {
            MonitorError::NoCachedData => StatusCode::SERVICE_UNAVAILABLE,
            MonitorError::Fetch(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "success": false,
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (status, Json(body)).into_response()
    }
}

// --- Handlers ---

async fn index(State(monitor): State<Arc<Monitor>>) -> Json<Value> {
    let config = monitor.config();
    Json(json!({
        "service": "Listing Inventory Monitor",
        "platform": monitor.platform(),
        "status": "running",
        "business_hours": format!(
            "{} {}",
            config.business_hours_label(),
            config.schedule.timezone
        ),
        "window_state": monitor.window_state(),
        "currently_in_hours": monitor.hours().is_active(monitor.now()),
        "monitoring_active": monitor.runtime().monitoring_active,
        "endpoints": {
            "inventory": "/api/inventory",
            "status": "/api/status",
            "health": "/api/health",
            "force_check": "/api/force-check (POST)",
        },
    }))
}

async fn inventory(
    State(monitor): State<Arc<Monitor>>,
) -> Result<Json<InventoryView>, MonitorError> {
    match monitor.inventory().await {
        Ok(view) => Ok(Json(view)),
        Err(e) => {
            warn!(error = %e, "Inventory request failed");
            Err(e)
        }
    }
}

async fn status(State(monitor): State<Arc<Monitor>>) -> Json<StatusReport> {
    Json(monitor.status().await)
}

async fn health(State(monitor): State<Arc<Monitor>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "platform": monitor.platform(),
        "timestamp": monitor.now().to_rfc3339(),
    }))
}

async fn force_check(
    State(monitor): State<Arc<Monitor>>,
) -> Result<Json<ForceCheckReport>, MonitorError> {
    match monitor.force_check().await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            warn!(error = %e, "Force check failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::tests::helsinki;
    use crate::pipeline::tests::{harness, ScriptedSource};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_never_scrapes() {
        let h = harness(ScriptedSource::default());
        let (status, body) = call(build_router(h.monitor.clone()), "GET", "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
        assert_eq!(h.source.calls(), 0);
    }

    #[tokio::test]
    async fn test_index_reports_gate() {
        let h = harness(ScriptedSource::default());
        let (status, body) = call(build_router(h.monitor.clone()), "GET", "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["business_hours"], "12:00-19:00 Europe/Helsinki");
        assert_eq!(body["currently_in_hours"], true);
        assert_eq!(body["window_state"], "active_window");
        assert_eq!(body["endpoints"]["force_check"], "/api/force-check (POST)");
    }

    #[tokio::test]
    async fn test_inventory_without_data_outside_hours() {
        let h = harness(ScriptedSource::default());
        h.clock.set(helsinki(2026, 1, 15, 22, 0));
        let (status, body) = call(build_router(h.monitor.clone()), "GET", "/api/inventory").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "no_cached_data");
    }

    #[tokio::test]
    async fn test_inventory_cached_annotations() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002"]]));
        h.monitor.run_cycle().await.unwrap();
        h.clock.set(helsinki(2026, 1, 15, 13, 2));

        let (status, body) = call(build_router(h.monitor.clone()), "GET", "/api/inventory").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["from_cache"], true);
        assert_eq!(body["cache_age_seconds"], 120);
        assert_eq!(body["ids"], json!(["1001", "1002"]));
        assert_eq!(body["count"], 2);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_fresh_scrape_failure_is_bad_gateway() {
        let source = ScriptedSource::default();
        source.push_err("net::ERR_NAME_NOT_RESOLVED");
        let h = harness(source);

        let (status, body) = call(build_router(h.monitor.clone()), "GET", "/api/inventory").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "fetch_failure");
    }

    #[tokio::test]
    async fn test_force_check_shape() {
        let h = harness(ScriptedSource::with(&[&["1001", "1002"], &["1001"]]));
        h.monitor.run_cycle().await.unwrap();

        let (status, body) =
            call(build_router(h.monitor.clone()), "POST", "/api/force-check").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sold_items"], json!(["1002"]));
        assert_eq!(body["notification_sent"], true);
        assert_eq!(body["scrape_result"]["ids"], json!(["1001"]));
        assert_eq!(body["scrape_result"]["platform"], "webdriver");
    }

    #[tokio::test]
    async fn test_force_check_requires_post() {
        let h = harness(ScriptedSource::default());
        let req = Request::builder()
            .uri("/api/force-check")
            .body(Body::empty())
            .unwrap();
        let resp = build_router(h.monitor.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(h.source.calls(), 0);
    }

    #[tokio::test]
    async fn test_status_payload() {
        let h = harness(ScriptedSource::with(&[&["1001"]]));
        h.monitor.run_cycle().await.unwrap();

        let (status, body) = call(build_router(h.monitor.clone()), "GET", "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interval_seconds"], 300);
        assert_eq!(body["notifications_enabled"], true);
        assert_eq!(body["item_count"], 1);
        assert_eq!(body["last_clicks"], 2);
        assert_eq!(body["cycles_completed"], 1);
    }
}
