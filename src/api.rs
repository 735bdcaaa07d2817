//! HTTP surface: request DTOs, response encoding and the router.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::aggregate::{RiskLevel, SafetyStatus, Weights};
use crate::air_quality::AirQualityReport;
use crate::assessor::{Location, PointQuery, SafetyAssessor};
use crate::error::AssessmentError;
use crate::hazard::{HazardKind, RiskAssessment};
use crate::route::{self, Waypoint, WaypointResult};
use crate::weather::{WeatherReading, WeatherReport};

// Shared State for concurrency
pub struct AppState {
    pub assessor: SafetyAssessor,
}

impl AppState {
    pub fn new(assessor: SafetyAssessor) -> Self {
        Self { assessor }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    // Allows browser front-ends on other origins to call the API
    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/health", get(health))
        .route("/safety_score", post(safety_score))
        .route("/route_safety", post(route_safety))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Errors ---

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<HazardKind>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, missing) = match &self {
            ApiError::Assessment(e @ AssessmentError::AggregationIncomplete { missing }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.kind(), Some(missing.clone()))
            }
            ApiError::Assessment(e) => (StatusCode::BAD_REQUEST, e.kind(), None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", None),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            kind,
            missing,
        };
        (status, Json(body)).into_response()
    }
}

// --- API DTOs ---

/// Optional per-request weights; unset fields use the service defaults.
#[derive(Debug, Default, Deserialize)]
pub struct WeightOverrides {
    pub w_landslide: Option<f64>,
    pub w_flood: Option<f64>,
    pub w_air_quality: Option<f64>,
    pub w_weather: Option<f64>,
}

impl WeightOverrides {
    fn apply(&self, defaults: Weights) -> Weights {
        Weights {
            landslide: self.w_landslide.unwrap_or(defaults.landslide),
            flood: self.w_flood.unwrap_or(defaults.flood),
            air_quality: self.w_air_quality.unwrap_or(defaults.air_quality),
            weather: self.w_weather.unwrap_or(defaults.weather),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SafetyScoreRequest {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub weather: Option<WeatherReading>,
    #[serde(flatten)]
    pub weights: WeightOverrides,
}

#[derive(Debug, Serialize)]
pub struct SafetyScoreResponse {
    pub safety_score: f64,
    pub status: SafetyStatus,
    pub risk_level: RiskLevel,
    pub combined_risk: f64,
    pub landslide_risk: Option<f64>,
    pub flood_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQualityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReport>,
    pub location: Location,
    pub weights: Weights,
    pub channels: Vec<RiskAssessment>,
}

#[derive(Debug, Deserialize)]
pub struct RouteSafetyRequest {
    pub waypoints: Vec<Waypoint>,
    #[serde(flatten)]
    pub weights: WeightOverrides,
}

#[derive(Debug, Serialize)]
pub struct RouteSafetyResponse {
    pub average_safety: Option<f64>,
    pub route_status: Option<SafetyStatus>,
    pub route_risk_level: Option<RiskLevel>,
    pub scored_waypoints: usize,
    pub unscored_waypoints: usize,
    pub total_distance_m: f64,
    pub waypoints: Vec<WaypointDetail>,
}

#[derive(Debug, Serialize)]
pub struct WaypointDetail {
    pub index: usize,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub h3_cell: Option<String>,
    pub scored: bool,
    pub safety_score: Option<f64>,
    pub status: Option<SafetyStatus>,
    pub risk_level: Option<RiskLevel>,
    pub combined_risk: Option<f64>,
    pub landslide_risk: Option<f64>,
    pub flood_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQualityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WaypointDetail {
    fn new(index: usize, result: WaypointResult) -> Self {
        let WaypointResult {
            waypoint,
            assessment,
        } = result;
        let landslide_risk = channel_risk(&assessment.channels, HazardKind::Landslide);
        let flood_risk = channel_risk(&assessment.channels, HazardKind::Flood);
        let (safety, error) = match assessment.safety {
            Ok(safety) => (Some(safety), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            index,
            name: waypoint.name,
            lat: waypoint.lat,
            lon: waypoint.lon,
            h3_cell: assessment.location.h3_cell,
            scored: safety.is_some(),
            safety_score: safety.map(|s| s.safety_score),
            status: safety.map(|s| s.status),
            risk_level: safety.map(|s| s.risk_level),
            combined_risk: safety.map(|s| s.combined_risk),
            landslide_risk,
            flood_risk,
            air_quality: assessment.air_quality,
            weather: assessment.weather,
            error,
        }
    }
}

fn channel_risk(channels: &[RiskAssessment], kind: HazardKind) -> Option<f64> {
    channels
        .iter()
        .find(|c| c.source == kind)
        .and_then(RiskAssessment::risk)
        .map(|r| r.value())
}

// --- Handlers ---

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let predictors = state.assessor.predictors();
    Json(serde_json::json!({
        "status": "healthy",
        "service": "safesafar",
        "version": env!("CARGO_PKG_VERSION"),
        "models": {
            "landslide": predictors.landslide.is_available(),
            "flood": predictors.flood.is_available(),
        }
    }))
}

async fn safety_score(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SafetyScoreRequest>,
) -> Result<Json<SafetyScoreResponse>, ApiError> {
    let weights = payload.weights.apply(state.assessor.default_weights());
    let point = state.assessor.assess(&PointQuery {
        lat: payload.lat,
        lon: payload.lon,
        weights,
        pm25: payload.pm25,
        weather: payload.weather,
    });
    let safety = point.safety?;

    Ok(Json(SafetyScoreResponse {
        safety_score: safety.safety_score,
        status: safety.status,
        risk_level: safety.risk_level,
        combined_risk: safety.combined_risk,
        landslide_risk: channel_risk(&point.channels, HazardKind::Landslide),
        flood_risk: channel_risk(&point.channels, HazardKind::Flood),
        air_quality: point.air_quality,
        weather: point.weather,
        location: point.location,
        weights,
        channels: point.channels,
    }))
}

async fn route_safety(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteSafetyRequest>,
) -> Result<Json<RouteSafetyResponse>, ApiError> {
    let weights = payload.weights.apply(state.assessor.default_weights());
    let waypoints = payload.waypoints;

    // Waypoints fan out over rayon; keep that off the async workers
    let summary = tokio::task::spawn_blocking(move || {
        route::evaluate_route(&state.assessor, &waypoints, weights)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(RouteSafetyResponse {
        average_safety: summary.average_safety,
        route_status: summary.route_status,
        route_risk_level: summary.route_status.map(|s| s.risk_level()),
        scored_waypoints: summary.scored,
        unscored_waypoints: summary.unscored,
        total_distance_m: summary.total_distance_m,
        waypoints: summary
            .waypoints
            .into_iter()
            .enumerate()
            .map(|(index, result)| WaypointDetail::new(index, result))
            .collect(),
    }))
}
