//! HTTP adapter: thin routing layer over the scoring service.
//!
//! Routes mirror the service's public surface:
//! - `GET /` service banner
//! - `POST /predict` score one patient record
//! - `GET /predictions?limit=N` bounded most-recent-first listing
//! - `GET /model_info` loaded-model metadata
//!
//! The pipeline itself is synchronous, so handlers run it on the blocking
//! pool. Error taxonomy mapping: validation failures are client errors
//! (422), scoring and store failures are server errors (500).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::adapters::model::LogisticModel;
use crate::adapters::sqlite::SqliteStore;
use crate::application::{ScoredPrediction, ScoringService};
use crate::domain::{PatientRecord, PredictionRecord, RiskCategory};
use crate::StrokewatchError;

/// Default listing bound when the caller omits `limit`.
const DEFAULT_LISTING_LIMIT: usize = 10;

/// The concrete service this surface is wired to.
pub type Service = ScoringService<LogisticModel, SqliteStore>;

/// Metadata about the loaded model, reported by `/model_info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub num_features: usize,
}

#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
    model_info: ModelInfo,
}

/// Build the service router.
#[must_use]
pub fn router(service: Arc<Service>, model_info: ModelInfo) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/predictions", get(predictions))
        .route("/model_info", get(model_info_handler))
        .with_state(AppState {
            service,
            model_info,
        })
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Stroke risk scoring service" }))
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    probability: f64,
    risk_category: RiskCategory,
    contributing_factors: Vec<String>,
    prediction_id: i64,
}

impl From<ScoredPrediction> for PredictResponse {
    fn from(scored: ScoredPrediction) -> Self {
        Self {
            probability: scored.result.probability,
            risk_category: scored.result.risk_category,
            contributing_factors: scored.result.contributing_factors,
            prediction_id: scored.prediction_id,
        }
    }
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PatientRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    // A malformed or incomplete body is a validation failure, same taxonomy
    // as an out-of-domain field value.
    let Json(record) =
        payload.map_err(|e| ApiError(StrokewatchError::Validation(e.body_text())))?;

    let service = state.service.clone();
    let scored = tokio::task::spawn_blocking(move || service.score(record))
        .await
        .map_err(|e| ApiError(StrokewatchError::Scoring(format!("scoring task failed: {e}"))))??;

    Ok(Json(scored.into()))
}

#[derive(Debug, Deserialize)]
struct ListingQuery {
    limit: Option<usize>,
}

async fn predictions(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LISTING_LIMIT);
    let service = state.service.clone();
    let records = tokio::task::spawn_blocking(move || service.recent_predictions(limit))
        .await
        .map_err(|e| ApiError(StrokewatchError::Scoring(format!("listing task failed: {e}"))))??;

    Ok(Json(records))
}

async fn model_info_handler(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.model_info.clone())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

/// Response wrapper mapping the crate error taxonomy onto HTTP statuses.
struct ApiError(StrokewatchError);

impl From<StrokewatchError> for ApiError {
    fn from(err: StrokewatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            StrokewatchError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            StrokewatchError::Scoring(_) => (StatusCode::INTERNAL_SERVER_ERROR, "scoring_error"),
            StrokewatchError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            StrokewatchError::Startup(_) => (StatusCode::SERVICE_UNAVAILABLE, "startup_error"),
            StrokewatchError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error")
            }
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error: code,
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
