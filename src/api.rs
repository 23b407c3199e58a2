//! HTTP surface
//!
//! ## Endpoints
//!
//! - `GET /` - Form page; query parameters carry widget values
//! - `POST /predict` - Form submit, renders the page with the result
//! - `POST /v1/predict` - JSON prediction
//! - `GET /v1/schema` - Widget specs and record schemas
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus-formatted metrics
//!
//! ## Example
//!
//! ```rust,ignore
//! use labdelay::{api::{create_router, AppState}, config::ServerConfig};
//!
//! let state = AppState::new(ServerConfig::default())?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

use std::{sync::Arc, time::Instant};

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::{
    config::ServerConfig,
    error::Result,
    form::{field_specs, FieldSpec, FormInput, FormSubmission},
    metrics::MetricsCollector,
    predictor::{Prediction, PredictionError},
    record::{ColumnSpec, FeatureRecord, SchemaVersion},
    render::{Panel, Renderer},
    risk::{RiskAssessment, RiskTier},
};

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    renderer: Arc<Renderer>,
    metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// Create application state, compiling page templates
    ///
    /// # Errors
    ///
    /// Fails if a template does not compile.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Ok(Self {
            config: Arc::new(config),
            renderer: Arc::new(Renderer::new()?),
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Server configuration
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Metrics collector
    #[must_use]
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    // Runs one prediction off the async workers and records its outcome
    async fn predict(&self, input: FormInput) -> std::result::Result<Prediction, PredictionError> {
        let predictor = self.config.predictor();
        let start = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || predictor.predict(input))
            .await
            .unwrap_or_else(|e| {
                Err(PredictionError::Failed {
                    message: e.to_string(),
                })
            });
        match &outcome {
            Ok(p) => self.metrics.record_prediction(p.tier, start.elapsed()),
            Err(e) => self.metrics.record_failure(e),
        }
        outcome
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version string
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message, as shown on the page
    pub error: String,
    /// Machine-readable code
    pub code: String,
}

/// JSON prediction response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Predicted delay in minutes
    pub delay_minutes: f64,
    /// Risk tier
    pub tier: RiskTier,
    /// Tier headline
    pub label: &'static str,
    /// Tier colour
    pub color: &'static str,
    /// Recommended action
    pub advice: &'static str,
    /// `Expected Delay: ... minutes`
    pub delay_text: String,
    /// Schema the record was built for
    pub schema: SchemaVersion,
    /// Model name from the artifact
    pub model: String,
    /// Record handed to the model
    pub record: FeatureRecord,
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        let assessment = RiskAssessment::new(p.delay_minutes);
        Self {
            delay_minutes: p.delay_minutes,
            tier: assessment.tier,
            label: assessment.label,
            color: assessment.color,
            advice: assessment.advice,
            delay_text: assessment.delay_text(),
            schema: p.schema,
            model: p.model_name,
            record: p.record,
        }
    }
}

/// Column layout of one record schema
#[derive(Debug, Serialize)]
pub struct SchemaColumns {
    /// Schema version
    pub version: SchemaVersion,
    /// Columns in model order
    pub columns: &'static [ColumnSpec],
}

/// Widget specs and record schemas
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    /// Form widgets in page order
    pub fields: Vec<FieldSpec>,
    /// Every supported record schema
    pub schemas: Vec<SchemaColumns>,
    /// Schema used when the artifact does not decide
    pub default_schema: SchemaVersion,
}

impl SchemaResponse {
    /// Current widget and schema description
    #[must_use]
    pub fn current() -> Self {
        Self {
            fields: field_specs(),
            schemas: SchemaVersion::ALL
                .iter()
                .map(|&version| SchemaColumns {
                    version,
                    columns: version.columns(),
                })
                .collect(),
            default_schema: SchemaVersion::default(),
        }
    }
}

type HtmlResult = std::result::Result<(StatusCode, Html<String>), (StatusCode, String)>;

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/predict", post(predict_form_handler))
        .route("/v1/predict", post(predict_json_handler))
        .route("/v1/schema", get(schema_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn render(state: &AppState, status: StatusCode, input: &FormInput, panel: Panel<'_>) -> HtmlResult {
    state
        .renderer
        .render_page(input, state.config.display_schema(), panel)
        .map(|html| (status, Html(html)))
        .map_err(|e| {
            warn!(error = %e, "page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

// Shows the rejection reason above whatever values could be kept
fn render_invalid(state: &AppState, input: &FormInput, message: &str) -> HtmlResult {
    state.metrics.record_invalid_input();
    render(
        state,
        StatusCode::UNPROCESSABLE_ENTITY,
        input,
        Panel::Error(message),
    )
}

// Validates a decoded submission; on failure the page keeps the valid fields
fn validate_page(
    state: &AppState,
    submission: &FormSubmission,
) -> std::result::Result<FormInput, HtmlResult> {
    FormInput::from_submission(submission).map_err(|e| {
        debug!(error = %e, "form rejected");
        render_invalid(
            state,
            &FormInput::salvage(submission),
            &crate::error::LabDelayError::from(e).to_string(),
        )
    })
}

/// Form page
async fn index_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<FormSubmission>, QueryRejection>,
) -> HtmlResult {
    let Query(submission) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return render_invalid(&state, &FormInput::default(), &rejection.body_text())
        },
    };
    match validate_page(&state, &submission) {
        Ok(input) => render(&state, StatusCode::OK, &input, Panel::Empty),
        Err(page) => page,
    }
}

/// Form submit; model failures are shown on the page, not as HTTP errors
async fn predict_form_handler(
    State(state): State<AppState>,
    form: std::result::Result<Form<FormSubmission>, FormRejection>,
) -> HtmlResult {
    let Form(submission) = match form {
        Ok(form) => form,
        Err(rejection) => {
            return render_invalid(&state, &FormInput::default(), &rejection.body_text())
        },
    };
    let input = match validate_page(&state, &submission) {
        Ok(input) => input,
        Err(page) => return page,
    };

    match state.predict(input.clone()).await {
        Ok(prediction) => render(&state, StatusCode::OK, &input, Panel::Prediction(&prediction)),
        Err(e) => render(&state, StatusCode::OK, &input, Panel::Error(&e.to_string())),
    }
}

fn invalid_input(state: &AppState, message: String) -> (StatusCode, Json<ErrorResponse>) {
    state.metrics.record_invalid_input();
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: "invalid_input".to_string(),
        }),
    )
}

/// JSON prediction
///
/// Undecodable bodies, mistyped values and unknown field names are all
/// `400 invalid_input`.
async fn predict_json_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<FormSubmission>, JsonRejection>,
) -> std::result::Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(submission) = body.map_err(|rejection| {
        debug!(error = %rejection, "json body rejected");
        invalid_input(&state, rejection.body_text())
    })?;
    let input = FormInput::from_submission(&submission).map_err(|e| {
        invalid_input(&state, crate::error::LabDelayError::from(e).to_string())
    })?;

    let prediction = state.predict(input).await.map_err(|e| {
        let status = match e {
            PredictionError::ModelNotFound { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PredictionError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: e.to_string(),
                code: e.code().to_string(),
            }),
        )
    })?;

    Ok(Json(prediction.into()))
}

/// Widget and schema description
async fn schema_handler() -> Json<SchemaResponse> {
    Json(SchemaResponse::current())
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Metrics handler - returns Prometheus-formatted metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.to_prometheus()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::{
        body::Body,
        http::{header, Request},
    };
    use tower::util::ServiceExt;

    use super::*;
    use crate::demo::demo_artifact;

    fn app_for(model_path: &Path) -> (AppState, Router) {
        let state = AppState::new(ServerConfig {
            model_path: model_path.to_path_buf(),
            ..ServerConfig::default()
        })
        .unwrap();
        (state.clone(), create_router(state))
    }

    fn with_demo_model() -> (tempfile::TempDir, AppState, Router) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ldm");
        demo_artifact(SchemaVersion::V2).unwrap().save(&path).unwrap();
        let (state, app) = app_for(&path);
        (dir, state, app)
    }

    fn without_model() -> (tempfile::TempDir, AppState, Router) {
        let dir = tempfile::tempdir().unwrap();
        let (state, app) = app_for(&dir.path().join("lab_delay_model_v2.ldm"));
        (dir, state, app)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_dir, _state, app) = without_model();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, crate::VERSION);
    }

    #[tokio::test]
    async fn test_index_renders_defaults() {
        let (_dir, _state, app) = without_model();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Experimental Overview"));
        assert!(html.contains(r#"<option value="BATCH_001" selected>"#));
    }

    #[tokio::test]
    async fn test_index_reflects_query() {
        let (_dir, _state, app) = without_model();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/?lab_occupancy=90&scientist_workload=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("<td>900</td>"));
    }

    #[tokio::test]
    async fn test_index_invalid_query_is_422() {
        let (_dir, state, app) = without_model();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/?lab_occupancy=150")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Invalid input"));
        assert_eq!(state.metrics().snapshot().invalid_input, 1);
    }

    #[tokio::test]
    async fn test_form_predict_low_risk() {
        let (_dir, state, app) = with_demo_model();
        let response = app
            .oneshot(form_post(
                "lab_occupancy=70&scientist_workload=5&reagent_batch_id=BATCH_001&expected_duration=",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("LOW RISK"));
        assert!(html.contains("Expected Delay: 8.0 minutes"));
        assert_eq!(state.metrics().snapshot().low_risk, 1);
    }

    #[tokio::test]
    async fn test_form_predict_bad_batch_is_high() {
        let (_dir, _state, app) = with_demo_model();
        let response = app
            .oneshot(form_post("reagent_batch_id=BATCH_392"))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("HIGH RISK (BOTTLENECK)"));
        assert!(html.contains("CRITICAL: Reschedule or allocate backup resources immediately."));
    }

    #[tokio::test]
    async fn test_form_missing_model_is_shown_not_raised() {
        let (_dir, state, app) = without_model();
        let response = app.oneshot(form_post("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Error: Model file"));
        assert!(html.contains("Please train the model first."));
        assert_eq!(state.metrics().snapshot().model_not_found, 1);
    }

    #[tokio::test]
    async fn test_form_invalid_option_is_422() {
        let (_dir, _state, app) = with_demo_model();
        let response = app
            .oneshot(form_post("instrument_type=Laser"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_json_predict() {
        let (_dir, _state, app) = with_demo_model();
        let response = app
            .oneshot(json_post(r#"{"reagent_batch_id":"BATCH_392","lab_occupancy":70}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["tier"], "high");
        assert_eq!(json["delay_minutes"], 53.0);
        assert_eq!(json["schema"], "v2");
        assert_eq!(json["record"]["reagent_batch_id"], "BATCH_392");
    }

    #[tokio::test]
    async fn test_json_predict_errors() {
        let (_dir, _state, app) = without_model();
        let response = app.clone().oneshot(json_post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let err: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(err.code, "model_not_found");

        let response = app
            .oneshot(json_post(r#"{"hour_of_day":24}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(err.code, "invalid_input");
    }

    #[tokio::test]
    async fn test_json_predict_corrupt_model_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ldm");
        std::fs::write(&path, b"garbage").unwrap();
        let (_state, app) = app_for(&path);
        let response = app.oneshot(json_post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(err.error.starts_with("Prediction Error: "));
    }

    #[tokio::test]
    async fn test_json_predict_mistyped_field_is_400() {
        let (_dir, state, app) = with_demo_model();
        let response = app
            .clone()
            .oneshot(json_post(r#"{"lab_occupancy": true}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(err.code, "invalid_input");

        let response = app.oneshot(json_post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(err.code, "invalid_input");

        let snapshot = state.metrics().snapshot();
        assert_eq!(snapshot.invalid_input, 2);
        assert_eq!(snapshot.successful(), 0);
    }

    #[tokio::test]
    async fn test_json_predict_unknown_field_is_400() {
        let (_dir, state, app) = with_demo_model();
        let response = app
            .oneshot(json_post(
                r#"{"ambient_temp": 29.5, "stress_index": 5000, "reagent_batch": "BATCH_392"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(err.code, "invalid_input");
        assert!(err.error.contains("unknown field"));
        assert_eq!(state.metrics().snapshot().invalid_input, 1);
    }

    #[tokio::test]
    async fn test_form_invalid_submit_keeps_valid_values() {
        let (_dir, _state, app) = with_demo_model();
        let response = app
            .oneshot(form_post("lab_occupancy=150&reagent_batch_id=BATCH_392"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains(r#"<option value="BATCH_392" selected>"#));
        assert!(!html.contains(r#"<option value="BATCH_001" selected>"#));
    }

    #[tokio::test]
    async fn test_form_unknown_field_is_422() {
        let (_dir, state, app) = with_demo_model();
        let response = app
            .oneshot(form_post("lab_occupancy=70&stress_index=5000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.metrics().snapshot().invalid_input, 1);
        assert_eq!(state.metrics().snapshot().successful(), 0);
    }

    #[tokio::test]
    async fn test_schema_endpoint() {
        let (_dir, _state, app) = without_model();
        let response = app
            .oneshot(Request::builder().uri("/v1/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["fields"].as_array().unwrap().len(), 11);
        assert_eq!(json["schemas"][1]["columns"].as_array().unwrap().len(), 11);
        assert_eq!(json["schemas"][0]["columns"].as_array().unwrap().len(), 9);
        assert_eq!(json["default_schema"], "v2");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (_dir, _state, app) = with_demo_model();
        app.clone().oneshot(form_post("")).await.unwrap();
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let text = body_text(response).await;
        assert!(text.contains("labdelay_predictions_total{tier=\"low\"} 1"));
    }
}
