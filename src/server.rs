use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::error::{AnalysisError, FailureKind};
use crate::pipelines::AnalysisPipeline;

pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
}

pub fn create_router(pipeline: Arc<AnalysisPipeline>) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/analyze-food", post(analyze_food))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        match self.kind() {
            FailureKind::Internal => error!("Unexpected error: {}", self),
            kind => error!("{}: {}", kind, self),
        }
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

async fn analyze_food(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    // A body that is not JSON at all is reported like any other malformed request
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return AnalysisError::Validation(format!("Request body is not valid JSON: {}", e))
                .into_response()
        }
    };

    match state.pipeline.run(raw).await {
        Ok(analysis) => (StatusCode::OK, Json(analysis)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn root_handler() -> Json<Value> {
    Json(json!({"message": "Calorie Estimation API is running"}))
}

async fn health_check() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// Bind and serve until Ctrl-C
pub async fn serve(pipeline: Arc<AnalysisPipeline>, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Calorie Estimation API listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(pipeline))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down Calorie Estimation API...");
        })
        .await
}
