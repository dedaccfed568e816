//! HTTP surface: a health check and a multipart plate detection endpoint.
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::pipeline::{AnprPipeline, PlateRecord};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
  pub pipeline: Arc<AnprPipeline>,
  pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
  pub status: String,
  pub model: String,
  pub debug: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectResponse {
  pub plates: Vec<PlateRecord>,
}

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),
  #[error("ANPR processing failed: {0}")]
  Processing(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(health))
    .route("/detect", post(detect))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Binds `host:port`. Hostnames such as `localhost` are resolved.
pub async fn bind(host: &str, port: u16) -> std::io::Result<TcpListener> {
  TcpListener::bind((host, port)).await
}

pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
  let listener = bind(host, port)
    .await
    .with_context(|| format!("Could not bind {host}:{port}"))?;
  info!("ANPR service listening on {}", listener.local_addr()?);
  axum::serve(listener, router(state)).await?;
  Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "ANPR Service Running".to_string(),
    model: state.model.clone(),
    debug: state.pipeline.debug(),
  })
}

async fn detect(
  State(state): State<AppState>,
  mut multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
  let mut upload = None;
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
  {
    if field.name() != Some("image") {
      continue;
    }
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(format!("Could not read upload: {e}")))?;
    upload = Some((content_type, bytes));
    break;
  }

  let (content_type, bytes) =
    upload.ok_or_else(|| ApiError::BadRequest("image field is required".to_string()))?;

  if !content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
    return Err(ApiError::BadRequest("File must be an image".to_string()));
  }

  let image = image::load_from_memory(&bytes).map_err(|e| {
    warn!("Failed to decode upload: {}", e);
    ApiError::BadRequest("Could not decode image".to_string())
  })?;

  let pipeline = Arc::clone(&state.pipeline);
  let plates = tokio::task::spawn_blocking(move || pipeline.run(&image))
    .await
    .map_err(|e| ApiError::Processing(e.to_string()))?
    .map_err(|e| {
      warn!("Pipeline failed: {}", e);
      ApiError::Processing(e.to_string())
    })?;

  Ok(Json(DetectResponse { plates }))
}
