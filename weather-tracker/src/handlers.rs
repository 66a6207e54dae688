use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use common::errors::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::ToSchema;

use crate::cache::ClearReport;
use crate::catalog::WeatherSnapshot;
use crate::coordinator::{RefreshOutcome, WeatherCoordinator};
use crate::location::LocationRequest;
use crate::openapi;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<WeatherCoordinator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather", get(list_weather))
        .route("/api/weather/cities", post(add_city))
        .route("/api/weather/cities/{name}", delete(remove_city))
        .route("/api/weather/location", post(report_location))
        .route("/api/cache", delete(clear_cache))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddCityRequest {
    pub city: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RefreshSource {
    Cache,
    Network,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub source: RefreshSource,
    pub snapshot: WeatherSnapshot,
}

impl From<RefreshOutcome> for RefreshResponse {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::Cached(snapshot) => Self {
                source: RefreshSource::Cache,
                snapshot,
            },
            RefreshOutcome::Fetched(snapshot) => Self {
                source: RefreshSource::Network,
                snapshot,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemoveResponse {
    pub removed: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "weather-tracker" }))
}

#[utoipa::path(
    get,
    path = "/api/weather",
    responses(
        (status = 200, description = "Tracked locations in display order", body = Vec<WeatherSnapshot>)
    ),
    tag = "weather"
)]
pub async fn list_weather(State(state): State<AppState>) -> Json<Vec<WeatherSnapshot>> {
    let view = state.coordinator.catalog().snapshot();
    Json(view.as_ref().clone())
}

#[utoipa::path(
    post,
    path = "/api/weather/cities",
    request_body = AddCityRequest,
    responses(
        (status = 200, description = "City added or refreshed", body = RefreshResponse),
        (status = 400, description = "Blank city name"),
        (status = 502, description = "Forecast provider failed")
    ),
    tag = "weather"
)]
pub async fn add_city(
    State(state): State<AppState>,
    Json(body): Json<AddCityRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    info!(city = %body.city, "Add city request received");

    let outcome = state
        .coordinator
        .fetch_weather_for_location(LocationRequest::city(body.city), false)
        .await
        .map_err(|e| AppError::internal(format!("Refresh task failed: {}", e)))??;

    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/weather/location",
    request_body = LocationUpdate,
    responses(
        (status = 202, description = "Location delivery accepted, refresh running")
    ),
    tag = "weather"
)]
pub async fn report_location(
    State(state): State<AppState>,
    Json(body): Json<LocationUpdate>,
) -> StatusCode {
    info!(latitude = body.latitude, longitude = body.longitude, "Location update received");

    // Result is surfaced through the failure channel and the catalog.
    drop(state.coordinator.on_location_update(body.latitude, body.longitude));
    StatusCode::ACCEPTED
}

#[utoipa::path(
    delete,
    path = "/api/weather/cities/{name}",
    params(
        ("name" = String, Path, description = "Resolved location name")
    ),
    responses(
        (status = 200, description = "Whether an entry was removed", body = RemoveResponse)
    ),
    tag = "weather"
)]
pub async fn remove_city(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<RemoveResponse> {
    info!(name = %name, "Remove city request received");

    let removed = state.coordinator.remove_location(&name);
    Json(RemoveResponse { removed })
}

#[utoipa::path(
    delete,
    path = "/api/cache",
    responses(
        (status = 200, description = "Cache files removed", body = ClearReport)
    ),
    tag = "cache"
)]
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearReport> {
    Json(state.coordinator.clear_cache().await)
}
