use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;

/// Closed set of error kinds from spec §7. `Display`/`is_request_fatal` mirror the
/// teacher's `ErrorCode` in shape, but this enum additionally drives HTTP surfacing, so
/// it carries a message payload where the kind alone isn't enough context.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[serde(tag = "code", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayError {
  #[error("catalog metadata unavailable")]
  MetadataMissing,
  #[error("no candidates found")]
  NoCandidatesFound,
  #[error("no candidates matched within the year gate")]
  AllCandidatesFailedYearGate,
  #[error("link resolution failed: {0}")]
  ResolutionFailed(String),
  #[error("url failed validation: {0}")]
  ValidationRejected(String),
  #[error("insufficient storage: {0}")]
  InsufficientStorage(String),
  #[error("download failed or aborted: {0}")]
  DownloadFailedOrAborted(String),
  #[error("unsupported archive: {0}")]
  UnsupportedArchive(String),
  #[error("seek-ahead timed out waiting for download to advance")]
  SeekAheadTimeout,
  #[error("mkv seek requested before index is extracted")]
  MkvSeekTooEarly,
  #[error("upstream rate limited or timed out: {0}")]
  UpstreamRateLimitOrTimeout(String),
  #[error("not found")]
  NotFound,
  #[error("internal error: {0}")]
  Internal(String),
}

impl GatewayError {
  /// Request-level failures terminate the request; everything else is local to a
  /// single candidate/link and the pipeline continues with what remains (spec §7).
  pub fn is_request_fatal(&self) -> bool {
    matches!(
      self,
      GatewayError::InsufficientStorage(_) | GatewayError::DownloadFailedOrAborted(_)
    )
  }

  fn status(&self) -> StatusCode {
    match self {
      GatewayError::MetadataMissing
      | GatewayError::NoCandidatesFound
      | GatewayError::AllCandidatesFailedYearGate
      | GatewayError::ResolutionFailed(_)
      | GatewayError::ValidationRejected(_) => StatusCode::OK,
      GatewayError::InsufficientStorage(_) => StatusCode::INSUFFICIENT_STORAGE,
      GatewayError::DownloadFailedOrAborted(_) | GatewayError::UnsupportedArchive(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      GatewayError::SeekAheadTimeout => StatusCode::REQUEST_TIMEOUT,
      GatewayError::MkvSeekTooEarly => StatusCode::RANGE_NOT_SATISFIABLE,
      GatewayError::UpstreamRateLimitOrTimeout(_) => StatusCode::BAD_GATEWAY,
      GatewayError::NotFound => StatusCode::NOT_FOUND,
      GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for GatewayError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = Json(serde_json::json!({ "error": self.to_string() }));
    (status, body).into_response()
  }
}

impl From<anyhow::Error> for GatewayError {
  fn from(e: anyhow::Error) -> Self {
    GatewayError::Internal(e.to_string())
  }
}
