//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  /// The target record is not in a state that allows the request.
  #[error("{0}")]
  Conflict(String),

  /// The request was well-formed but its content cannot be processed.
  #[error("{0}")]
  Unprocessable(String),

  #[error("model error: {0}")]
  Upstream(String),

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<aiflow_workflows::Error> for ApiError {
  fn from(e: aiflow_workflows::Error) -> Self {
    use aiflow_workflows::Error as W;
    match e {
      W::NotFound { .. } => Self::NotFound(e.to_string()),
      W::InvalidTransition { .. } => Self::Conflict(e.to_string()),
      W::InvalidJson
      | W::MissingField(_)
      | W::UnmatchedPaymentTerm(_)
      | W::UnsupportedInterface(_)
      | W::Core(_) => Self::Unprocessable(e.to_string()),
      W::Llm(source) => Self::Upstream(source.to_string()),
      W::Store(source) => Self::Store(source),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
      ApiError::Json(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"aiflow\""),
      );
    }
    res
  }
}
