//! Error-as-video channel (spec §4.9): for failure modes discovered after a response has
//! already committed to deliver video bytes, proxy a pre-rendered clip from the file-server
//! collaborator instead of an HTTP error body. Follows the teacher's `local_api/mod.rs`
//! streaming-handler style (`impl IntoResponse` built from a body stream plus a `HeaderMap`).

use crate::external::file_server::FileServerClient;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub async fn stream_error_video(file_server: &Arc<dyn FileServerClient>, message: &str) -> Response {
  match file_server.error_video_stream(message).await {
    Ok(stream) => {
      let mut resp = Response::new(Body::from_stream(stream));
      let headers = resp.headers_mut();
      headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
      headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
      headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600"));
      resp
    }
    Err(e) => {
      tracing::error!(error = %e, "error-video stream itself failed");
      (StatusCode::INTERNAL_SERVER_ERROR, "error video unavailable").into_response()
    }
  }
}
