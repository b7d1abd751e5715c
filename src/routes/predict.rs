use actix_web::{web, HttpResponse, Responder};
use crate::core::{field_schema, validate, PredictionError, Predictor, ValidationError};
use crate::models::{
    ErrorResponse, HealthResponse, ModelInfo, PredictResponse, RawFields, SchemaResponse,
};
use std::time::Instant;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub model: ModelInfo,
}

/// Configure all prediction routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/schema", web::get().to(schema))
        .route("/predict", web::post().to(predict_json))
        .route("/predict", web::get().to(predict_query))
        .route("/predict/form", web::post().to(predict_form));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        model: state.model.clone(),
    })
}

/// Input field descriptions, for clients that render their own forms
///
/// GET /api/v1/schema
async fn schema() -> impl Responder {
    HttpResponse::Ok().json(SchemaResponse {
        fields: field_schema().iter().map(|d| d.info()).collect(),
    })
}

/// Predict from a structured request body
///
/// POST /api/v1/predict
async fn predict_json(
    state: web::Data<AppState>,
    req: web::Json<RawFields>,
) -> impl Responder {
    run_prediction(&state, &req).await
}

/// Predict from URL-encoded form fields
///
/// POST /api/v1/predict/form
async fn predict_form(
    state: web::Data<AppState>,
    req: web::Form<RawFields>,
) -> impl Responder {
    run_prediction(&state, &req).await
}

/// Predict from query parameters
///
/// GET /api/v1/predict?generation=gen%20X&gender=1&...
async fn predict_query(
    state: web::Data<AppState>,
    req: web::Query<RawFields>,
) -> impl Responder {
    run_prediction(&state, &req).await
}

async fn run_prediction(state: &AppState, raw: &RawFields) -> HttpResponse {
    let request_id = uuid::Uuid::new_v4().to_string();

    let features = match validate(raw) {
        Ok(features) => features,
        Err(e) => {
            tracing::info!("Rejected request {}: {}", request_id, e);
            return validation_error_response(&e);
        }
    };

    let started = Instant::now();
    match state.predictor.predict_with_timeout(features).await {
        Ok(result) => {
            tracing::info!(
                "Request {} predicted {} in {:?}",
                request_id,
                result.verdict,
                started.elapsed()
            );

            HttpResponse::Ok().json(PredictResponse {
                prediction: result.output,
                verdict: result.verdict,
                message: result.verdict.message().to_string(),
                request_id,
                timestamp: chrono::Utc::now(),
            })
        }
        Err(PredictionError::Validation(e)) => {
            tracing::info!("Rejected request {}: {}", request_id, e);
            validation_error_response(&e)
        }
        Err(e @ PredictionError::ContractViolation { .. }) => {
            tracing::error!("Request {} failed, model {} broke its contract: {}", request_id, state.model.name, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "classifier_contract_violation",
                e.to_string(),
                500,
            ))
        }
        Err(e @ PredictionError::Timeout(_)) => {
            tracing::warn!("Request {} timed out: {}", request_id, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
                "prediction_timeout",
                e.to_string(),
                503,
            ))
        }
        Err(e @ PredictionError::Saturated(_)) => {
            tracing::warn!("Request {} shed: {}", request_id, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
                "prediction_saturated",
                e.to_string(),
                503,
            ))
        }
        Err(e @ PredictionError::Worker(_)) => {
            tracing::error!("Request {} failed: {}", request_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "prediction_failed",
                e.to_string(),
                500,
            ))
        }
    }
}

fn validation_error_response(error: &ValidationError) -> HttpResponse {
    let mut body = match error {
        ValidationError::MissingField { .. } => {
            ErrorResponse::new("missing_field", error.to_string(), 422)
        }
        ValidationError::InvalidDomain { allowed, .. } => {
            let mut body = ErrorResponse::new("invalid_domain", error.to_string(), 422);
            body.allowed = Some(allowed.clone());
            body
        }
    };
    body.field = Some(error.field().to_string());

    HttpResponse::UnprocessableEntity().json(body)
}
