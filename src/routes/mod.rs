pub mod events;
pub mod programs;

use crate::db::AppState;
use crate::error::StudioError;
use axum::{
  extract::{rejection::JsonRejection, FromRequest},
  http::StatusCode,
  response::{IntoResponse, Json, Response},
  routing::get,
  Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub type SharedState = Arc<AppState>;

/// Envelope for every JSON response: `{ success, data, message }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
  pub fn success(data: T) -> Self {
    Self {
      success: true,
      data: Some(data),
      message: None,
    }
  }
}

impl ApiResponse<()> {
  pub fn error(message: impl Into<String>) -> Self {
    Self {
      success: false,
      data: None,
      message: Some(message.into()),
    }
  }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, StudioError>;

/// JSON body extractor whose rejections use the same failure envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(StudioError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for StudioError {
  fn from(rejection: JsonRejection) -> Self {
    StudioError::Validation(rejection.body_text())
  }
}

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
  Ok(Json(ApiResponse::success(data)))
}

impl IntoResponse for StudioError {
  fn into_response(self) -> Response {
    let status = match &self {
      StudioError::Validation(_) | StudioError::Phase(_) => StatusCode::BAD_REQUEST,
      StudioError::NotFound(_) => StatusCode::NOT_FOUND,
      StudioError::Conflict(_) => StatusCode::CONFLICT,
      StudioError::Database(_) | StudioError::Serialization(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    if self.is_client_error() {
      tracing::warn!(status = status.as_u16(), "Request rejected: {}", self);
    } else {
      tracing::error!(status = status.as_u16(), "Request failed: {}", self);
    }

    (status, Json(ApiResponse::error(self.to_string()))).into_response()
  }
}

#[derive(Serialize)]
pub struct Health {
  pub status: &'static str,
  pub version: &'static str,
}

async fn health() -> ApiResult<Health> {
  ok(Health {
    status: "ok",
    version: env!("CARGO_PKG_VERSION"),
  })
}

/// Full `/api` router with request tracing
pub fn router(state: SharedState) -> Router {
  let api = Router::new()
    .route("/health", get(health))
    .merge(programs::router())
    .merge(events::router());

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
