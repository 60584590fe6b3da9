//! Thin HTTP surface (spec §6 explicitly scopes HTTP routing out; SPEC_FULL §6 builds a
//! minimal one anyway so the crate runs end to end). Grounded on the teacher's
//! `local_api/mod.rs`: one `ApiState` behind `with_state`, a bearer/header `check_auth` gate on
//! mutating routes, streaming handlers built from `impl IntoResponse`.

use crate::error::GatewayError;
use crate::model::{MediaType, SearchRequest, StreamDescriptor, UserConfig};
use crate::usenet::VideoResource;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

pub fn routes(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/catalog", get(get_catalog))
    .route("/usenet/open", get(open_usenet_stream))
    .route("/usenet/stream/:download_id", get(stream_range))
    .route("/usenet/:download_id/pause", post(pause_download))
    .route("/usenet/:download_id/resume", post(resume_download))
    .route("/usenet/:download_id/prioritize", post(prioritize_download))
    .with_state(state)
}

fn check_auth(headers: &HeaderMap, expected: &Option<String>) -> bool {
  let Some(expected) = expected else { return true };
  if let Some(v) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
    if let Some(rest) = v.strip_prefix("Bearer ") {
      return rest.trim() == expected;
    }
  }
  false
}

/// `GET /catalog` (spec §4.4): fan the request out through `SearchOrchestrator::search` and
/// return the ranked, deduplicated `StreamDescriptor` list.
async fn get_catalog(State(state): State<Arc<AppState>>, Query(req): Query<SearchRequest>) -> impl IntoResponse {
  let descriptors = state.orchestrator.search(&req).await;
  Json(descriptors).into_response()
}

#[derive(Debug, serde::Deserialize)]
struct OpenStreamParams {
  nzb_url: String,
  title: String,
  media_type: MediaType,
  season: Option<u32>,
  episode: Option<u32>,
  #[serde(default)]
  delete_on_stream_stop: bool,
  #[serde(default)]
  is_personal: bool,
}

/// `GET /usenet/open` (spec §4.6's `openStream`): submit or adopt the NZB, wait out the
/// minimum-progress gate, and return the `VideoResource` the caller should then range-GET from
/// `/usenet/stream/:downloadId`.
async fn open_usenet_stream(State(state): State<Arc<AppState>>, Query(params): Query<OpenStreamParams>) -> Response {
  let user_config = UserConfig { delete_on_stream_stop: params.delete_on_stream_stop, is_personal: params.is_personal };
  match state
    .controller
    .open_stream(&params.nzb_url, &params.title, params.media_type, params.season, params.episode, user_config)
    .await
  {
    Ok(resource) => Json::<VideoResource>(resource).into_response(),
    // §7/scenario 4: these two are request-level failures that spec.md routes to the
    // error-video channel instead of a JSON body, since the caller already expects a video
    // response from this endpoint.
    Err(err @ (GatewayError::UnsupportedArchive(_) | GatewayError::DownloadFailedOrAborted(_))) => {
      crate::usenet::error_video::stream_error_video(&state.controller.file_server(), &err.to_string()).await
    }
    Err(err) => err.into_response(),
  }
}

/// `GET /usenet/stream/:downloadId` (spec §4.7): range-serves the growing file, handling every
/// boundary case `RangeStreamer::serve` implements.
async fn stream_range(State(state): State<Arc<AppState>>, Path(download_id): Path<String>, headers: HeaderMap) -> Response {
  let range = headers.get(axum::http::header::RANGE).and_then(|v| v.to_str().ok());
  state.range_streamer.serve(&download_id, range).await
}

async fn pause_download(State(state): State<Arc<AppState>>, headers: HeaderMap, Path(download_id): Path<String>) -> Response {
  if !check_auth(&headers, &state.config.admin_password) {
    return StatusCode::UNAUTHORIZED.into_response();
  }
  match state.controller.pause_download(&download_id).await {
    Ok(()) => StatusCode::ACCEPTED.into_response(),
    Err(e) => GatewayError::from(e).into_response(),
  }
}

async fn resume_download(State(state): State<Arc<AppState>>, headers: HeaderMap, Path(download_id): Path<String>) -> Response {
  if !check_auth(&headers, &state.config.admin_password) {
    return StatusCode::UNAUTHORIZED.into_response();
  }
  match state.controller.resume_download(&download_id).await {
    Ok(()) => StatusCode::ACCEPTED.into_response(),
    Err(e) => GatewayError::from(e).into_response(),
  }
}

async fn prioritize_download(State(state): State<Arc<AppState>>, headers: HeaderMap, Path(download_id): Path<String>) -> Response {
  if !check_auth(&headers, &state.config.admin_password) {
    return StatusCode::UNAUTHORIZED.into_response();
  }
  match state.controller.prioritize(&download_id).await {
    Ok(position) => Json(serde_json::json!({ "queue_position": position })).into_response(),
    Err(e) => GatewayError::from(e).into_response(),
  }
}
