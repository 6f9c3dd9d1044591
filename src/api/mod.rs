//! HTTP surface: router assembly and request metrics.
//!
//! [`build_router`] wires every route onto a shared [`ApiContext`] so the
//! binary and the integration tests serve the exact same application.

pub mod drones;
pub mod health;
pub mod medications;
pub mod response;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::metrics::AppMetrics;
use crate::services::drones::DroneService;
use crate::services::medications::MedicationService;

/// Shared state handed to every handler.
pub struct ApiContext {
    pub drones: Arc<DroneService>,
    pub medications: Arc<MedicationService>,
    pub metrics: Arc<AppMetrics>,
}

pub type AppState = Arc<ApiContext>;

pub fn build_router(context: AppState) -> Router {
    Router::new()
        .route("/api/drones/register", post(drones::register_drone))
        .route("/api/drones/available", get(drones::available_drones))
        .route("/api/drones/events", get(drones::audit_events))
        .route("/api/drones/:serial_number/load", post(drones::load_drone))
        .route(
            "/api/drones/:serial_number/battery",
            get(drones::battery_level),
        )
        .route(
            "/api/drones/:serial_number/change-state/:new_state",
            post(drones::change_state),
        )
        .route(
            "/api/drones/:serial_number/change-battery-capacity/:new_battery_capacity",
            post(drones::change_battery_capacity),
        )
        .route(
            "/api/medications/loaded/:serial_number",
            get(medications::loaded_medications),
        )
        .route("/health", get(health::health))
        .route("/metrics", get(metrics_endpoint))
        .layer(middleware::from_fn_with_state(
            context.clone(),
            track_http_metrics,
        ))
        .layer(CorsLayer::permissive())
        .with_state(context)
}

/// Record a count and latency observation for every request, labelled by
/// the matched route pattern rather than the raw path.
async fn track_http_metrics(State(context): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    context
        .metrics
        .http_requests_total
        .with_label_values(&[&method, &path, &status])
        .inc();
    context
        .metrics
        .http_request_duration
        .observe(start.elapsed().as_secs_f64());

    response
}

async fn metrics_endpoint(State(context): State<AppState>) -> Response {
    match context.metrics.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(body))
            .expect("metrics response should be valid"),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
