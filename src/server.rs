//! HTTP listener serving the registered transforms.
//!
//! - `GET /health`
//! - `GET /transforms`: registered transforms with their schemas
//! - `POST /transforms/{name}`: body `{"city": [...]}`, responds with a JSON
//!   array of output rows

use crate::batch::BatchError;
use crate::schema::SCHEMA_IN;
use crate::transforms::{TransformDescription, TransformError, TransformRegistry};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use polars::prelude::*;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TransformRegistry>,
}

/// Columnar input table; one entry per row.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub city: Vec<Option<String>>,
}

impl BatchRequest {
    pub fn into_frame(self) -> PolarsResult<DataFrame> {
        let name = PlSmallStr::from(SCHEMA_IN.columns()[0].name);
        DataFrame::new(vec![Column::from(Series::new(name, self.city))])
    }
}

async fn health_check() -> &'static str {
    "ok"
}

async fn list_transforms(State(state): State<AppState>) -> Json<Vec<TransformDescription>> {
    Json(
        state
            .registry
            .iter()
            .map(|t| t.description().clone())
            .collect(),
    )
}

async fn run_transform(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Response, (StatusCode, String)> {
    let Json(request) = request.map_err(|rejection| {
        warn!("Rejected input for transform {}: {}", name, rejection.body_text());
        (StatusCode::BAD_REQUEST, rejection.body_text())
    })?;
    let input = request
        .into_frame()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut output = state
        .registry
        .call(&name, &input)
        .await
        .map_err(|e| {
            warn!("Transform {} failed: {}", name, e);
            (error_status(&e), error_message(&e))
        })?;

    let body = frame_to_json(&mut output)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

fn error_status(error: &TransformError) -> StatusCode {
    match error {
        TransformError::UnknownTransform(_) => StatusCode::NOT_FOUND,
        TransformError::Batch(BatchError::InvalidInput(_) | BatchError::NullCity { .. }) => {
            StatusCode::BAD_REQUEST
        }
        TransformError::Batch(BatchError::UpstreamFetch { .. }) => StatusCode::BAD_GATEWAY,
        TransformError::Batch(BatchError::DataFrameProcessing(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// The error and its sources, outermost first.
fn error_message(error: &TransformError) -> String {
    let mut message = error.to_string();
    let mut source = StdError::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Serializes `frame` as a JSON array of row objects.
pub fn frame_to_json(frame: &mut DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buffer = Vec::new();
    JsonWriter::new(&mut buffer)
        .with_json_format(JsonFormat::Json)
        .finish(frame)?;
    Ok(buffer)
}

pub fn create_router(registry: Arc<TransformRegistry>) -> Router {
    let state = AppState { registry };

    Router::new()
        .route("/health", get(health_check))
        .route("/transforms", get(list_transforms))
        .route("/transforms/{name}", post(run_transform))
        .with_state(state)
}

/// Serves the registry on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, registry: Arc<TransformRegistry>) -> std::io::Result<()> {
    let app = create_router(registry);
    if let Ok(addr) = listener.local_addr() {
        info!("Weather features listening on {}", addr);
    }
    axum::serve(listener, app).await
}

/// Binds `0.0.0.0:<port>` and serves the registry.
pub async fn run_server(registry: Arc<TransformRegistry>, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    serve(listener, registry).await
}
