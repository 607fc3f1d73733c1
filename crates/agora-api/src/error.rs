//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthenticated")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  /// The body could not be read as a request of the expected shape.
  #[error("bad request: {0}")]
  BadRequest(String),

  /// A request field failed validation; rendered as `{ field: message }`.
  #[error("invalid {field}: {message}")]
  Invalid { field: &'static str, message: String },

  #[error("conflict: {0}")]
  Conflict(String),

  /// Anything the client cannot act on. Details are logged, never returned.
  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<agora_core::Error> for ApiError {
  fn from(e: agora_core::Error) -> Self {
    use agora_core::Error as E;
    match e {
      E::InvalidVoteValue(_) => ApiError::Invalid {
        field:   "value",
        message: "Value must be -1, 0 or 1".to_owned(),
      },
      E::PostNotFound { .. } => ApiError::NotFound("Post not found".to_owned()),
      E::CommentNotFound(_) => ApiError::NotFound("Comment not found".to_owned()),
      E::VoteNotFound => ApiError::NotFound("Vote not found".to_owned()),
      E::ConcurrentVoteConflict => {
        ApiError::Conflict("Vote changed concurrently, try again".to_owned())
      }
      E::Storage(e) => ApiError::Internal(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(error = %rejection.body_text(), "rejected request body");
    ApiError::BadRequest("Invalid request body".to_owned())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthenticated" })))
          .into_response()
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Invalid { field, message } => {
        (StatusCode::BAD_REQUEST, Json(json!({ field: message }))).into_response()
      }
      ApiError::Conflict(m) => {
        (StatusCode::CONFLICT, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "Something went wrong" })),
        )
          .into_response()
      }
    }
  }
}
