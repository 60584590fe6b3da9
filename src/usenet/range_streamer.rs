//! RangeStreamer (spec §4.7): serves HTTP range requests against a file that may still be
//! growing underneath it. Grounded on the teacher's `engine/job.rs::attempt_download_once`,
//! which already tolerates `size(path)` changing mid-flight and re-`stat`s immediately before
//! committing to a length — the same tolerance this needs, just on the read side instead of the
//! write side. Background coordination (seek-ahead resume, MKV index gate) drives
//! `usenet::controller::UsenetController` the same way the teacher's engine drives its own
//! per-job `watch::Sender<JobControl>`.

use crate::model::{ActiveStream, DownloadState};
use crate::usenet::controller::UsenetController;
use crate::usenet::error_video::stream_error_video;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const SEEK_AHEAD_BAND_FRACTION: f64 = 0.15;
const SEEK_AHEAD_BUDGET: Duration = Duration::from_secs(5 * 60);
const SEEK_AHEAD_POLL: Duration = Duration::from_secs(2);
const GROWTH_POLL_BUDGET: Duration = Duration::from_secs(60);
const GROWTH_POLL_INTERVAL: Duration = Duration::from_secs(2);
const MKV_SEEK_INDEX_THRESHOLD_PERCENT: f64 = 80.0;
const FORWARD_SEEK_EVENT_FRACTION: f64 = 0.05;
const BACKWARD_SEEK_EVENT_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeekKind {
  Forward,
  Backward,
  Sequential,
}

pub struct RangeStreamer {
  controller: Arc<UsenetController>,
  storage_root: PathBuf,
}

impl RangeStreamer {
  pub fn new(controller: Arc<UsenetController>, storage_root: PathBuf) -> Self {
    Self { controller, storage_root }
  }

  fn local_path(&self, file_server_path: &str) -> PathBuf {
    self.storage_root.join(file_server_path.trim_start_matches('/'))
  }

  /// Entry point for `GET /usenet/stream/.../attach` style range reads (spec §4.6's
  /// `attachStream`). `range_header` is the raw `Range:` request header value, if present.
  pub async fn serve(&self, download_id: &str, range_header: Option<&str>) -> Response {
    let Some(stream) = self.controller.peek_stream(download_id) else {
      return (StatusCode::NOT_FOUND, "no active stream for this download").into_response();
    };
    let path = self.local_path(&stream.file_server_path);

    let Some(raw_range) = range_header else {
      return self.serve_whole_file(&path, download_id).await;
    };

    let (start, end_req) = match parse_range_header(raw_range) {
      Some(parsed) => parsed,
      None => return StatusCode::RANGE_NOT_SATISFIABLE.into_response(),
    };

    let size_on_disk = stat_len(&path).await;

    // Boundary case (spec §8): an empty on-disk file. A still-queued download hasn't written
    // anything yet, so an empty 200 is more honest than a 416; any other state is final.
    if size_on_disk == 0 {
      return if self.controller.download_state(download_id) == Some(DownloadState::Queued) {
        empty_200_response()
      } else {
        StatusCode::RANGE_NOT_SATISFIABLE.into_response()
      };
    }

    record_seek_and_maybe_prioritize(&self.controller, download_id, &stream, start).await;

    if is_mkv(&stream.file_server_path) && start > 0 && stream.last_download_percent < MKV_SEEK_INDEX_THRESHOLD_PERCENT {
      return mkv_seek_too_early_response();
    }

    if self.within_seek_ahead_band(&stream, start) {
      if let Err(resp) = self.wait_for_seek_ahead(download_id, start).await {
        return resp;
      }
    }

    let size_on_disk = stat_len(&path).await.max(size_on_disk);

    if start >= size_on_disk {
      return self.serve_growth_wait(&path, download_id, start, end_req).await;
    }

    let end = end_req.unwrap_or(size_on_disk - 1).min(size_on_disk - 1);
    self.controller.attach_stream(download_id, start);
    self.serve_range(&path, start, end, size_on_disk).await
  }

  async fn serve_whole_file(&self, path: &Path, download_id: &str) -> Response {
    self.controller.attach_stream(download_id, 0);
    match tokio::fs::File::open(path).await {
      Ok(file) => {
        let body = Body::from_stream(ReaderStream::new(file));
        let mut resp = Response::new(body);
        let headers = resp.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        resp
      }
      Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
  }

  /// `start >= fileSizeOnDisk` (spec §4.7): if the download is still advancing, poll disk size
  /// for up to 60s; otherwise 416.
  async fn serve_growth_wait(&self, path: &Path, download_id: &str, start: i64, end_req: Option<i64>) -> Response {
    let state = self.controller.download_state(download_id);
    if state == Some(DownloadState::Failed) {
      return stream_error_video(&self.controller.file_server(), "download failed while waiting for more bytes").await;
    }
    if !matches!(state, Some(DownloadState::Downloading) | Some(DownloadState::Extracting) | Some(DownloadState::Paused)) {
      return StatusCode::RANGE_NOT_SATISFIABLE.into_response();
    }

    let deadline = tokio::time::Instant::now() + GROWTH_POLL_BUDGET;
    loop {
      let size = stat_len(path).await;
      if start < size {
        let end = end_req.unwrap_or(size - 1).min(size - 1);
        self.controller.attach_stream(download_id, start);
        return self.serve_range(path, start, end, size).await;
      }
      if tokio::time::Instant::now() >= deadline {
        return StatusCode::RANGE_NOT_SATISFIABLE.into_response();
      }
      tokio::time::sleep(GROWTH_POLL_INTERVAL).await;
    }
  }

  /// Seek-ahead rule (spec §4.7): a range whose start sits within 15% of the extraction
  /// frontier (`downloadPercent × fileSize`) triggers a resume-and-wait before serving.
  fn within_seek_ahead_band(&self, stream: &ActiveStream, start: i64) -> bool {
    if stream.file_size <= 0 {
      return false;
    }
    let frontier = (stream.last_download_percent / 100.0) * stream.file_size as f64;
    let band_floor = (frontier - SEEK_AHEAD_BAND_FRACTION * stream.file_size as f64).max(0.0);
    (start as f64) >= band_floor
  }

  async fn wait_for_seek_ahead(&self, download_id: &str, start: i64) -> Result<(), Response> {
    if self.controller.peek_stream(download_id).map(|s| s.paused).unwrap_or(false) {
      let _ = self.controller.prioritize(download_id).await;
    }

    let deadline = tokio::time::Instant::now() + SEEK_AHEAD_BUDGET;
    loop {
      match self.controller.refresh_download_progress(download_id).await {
        Some((DownloadState::Completed, _)) => return Ok(()),
        Some((DownloadState::Failed, _)) => {
          return Err(stream_error_video(&self.controller.file_server(), "download failed while waiting to catch up").await)
        }
        Some((_, percent)) => {
          if let Some(stream) = self.controller.peek_stream(download_id) {
            if !self.within_seek_ahead_band(&ActiveStream { last_download_percent: percent, ..stream }, start) {
              return Ok(());
            }
          }
        }
        None => return Ok(()),
      }
      if tokio::time::Instant::now() >= deadline {
        return Err((StatusCode::REQUEST_TIMEOUT, "seek-ahead catchup timed out").into_response());
      }
      tokio::time::sleep(SEEK_AHEAD_POLL).await;
    }
  }

  async fn serve_range(&self, path: &Path, start: i64, end: i64, size_on_disk: i64) -> Response {
    if start > end || start >= size_on_disk {
      return StatusCode::RANGE_NOT_SATISFIABLE.into_response();
    }
    let mut file = match tokio::fs::File::open(path).await {
      Ok(f) => f,
      Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };
    if file.seek(std::io::SeekFrom::Start(start as u64)).await.is_err() {
      return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let len = (end - start + 1) as u64;
    let body = Body::from_stream(ReaderStream::new(file.take(len)));

    let mut resp = Response::new(body);
    *resp.status_mut() = StatusCode::PARTIAL_CONTENT;
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
      header::CONTENT_RANGE,
      HeaderValue::from_str(&format!("bytes {start}-{end}/{size_on_disk}")).unwrap(),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_str(&len.to_string()).unwrap());
    resp
  }
}

async fn stat_len(path: &Path) -> i64 {
  tokio::fs::metadata(path).await.map(|m| m.len() as i64).unwrap_or(0)
}

fn is_mkv(path: &str) -> bool {
  path.to_ascii_lowercase().ends_with(".mkv")
}

fn empty_200_response() -> Response {
  let mut resp = Response::new(Body::empty());
  let headers = resp.headers_mut();
  headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
  headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
  resp
}

fn mkv_seek_too_early_response() -> Response {
  (
    StatusCode::RANGE_NOT_SATISFIABLE,
    "mkv seek index is stored at the file's end and is not extracted yet",
  )
    .into_response()
}

/// `Range: bytes=start-end?` (spec §4.7). Only the single-range, byte-unit form is supported;
/// anything else (suffix ranges, multi-range, non-byte units) is rejected as unsatisfiable.
fn parse_range_header(raw: &str) -> Option<(i64, Option<i64>)> {
  let spec = raw.trim().strip_prefix("bytes=")?;
  if spec.contains(',') {
    return None;
  }
  let (start_str, end_str) = spec.split_once('-')?;
  let start: i64 = start_str.trim().parse().ok()?;
  if start < 0 {
    return None;
  }
  let end_str = end_str.trim();
  if end_str.is_empty() {
    Some((start, None))
  } else {
    let end: i64 = end_str.parse().ok()?;
    if end < start {
      return None;
    }
    Some((start, Some(end)))
  }
}

/// Seek-detection telemetry (spec §4.7): a forward jump of >5% of file size marks an event and
/// triggers an aggressive resume+prioritize; a backward jump of >1% is logged; anything smaller
/// is sequential playback and ignored.
async fn record_seek_and_maybe_prioritize(controller: &Arc<UsenetController>, download_id: &str, stream: &ActiveStream, start: i64) {
  if stream.file_size <= 0 {
    return;
  }
  let delta = start - stream.last_playback_byte;
  let fraction = delta.unsigned_abs() as f64 / stream.file_size as f64;
  let kind = if delta > 0 && fraction > FORWARD_SEEK_EVENT_FRACTION {
    SeekKind::Forward
  } else if delta < 0 && fraction > BACKWARD_SEEK_EVENT_FRACTION {
    SeekKind::Backward
  } else {
    SeekKind::Sequential
  };

  match kind {
    SeekKind::Forward => {
      tracing::info!(download_id, start, last_playback_byte = stream.last_playback_byte, "forward seek detected");
      let _ = controller.prioritize(download_id).await;
    }
    SeekKind::Backward => {
      tracing::debug!(download_id, start, last_playback_byte = stream.last_playback_byte, "backward seek detected");
    }
    SeekKind::Sequential => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_start_and_end() {
    assert_eq!(parse_range_header("bytes=100-199"), Some((100, Some(199))));
  }

  #[test]
  fn parses_open_ended_range() {
    assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
  }

  #[test]
  fn rejects_multi_range_and_malformed() {
    assert_eq!(parse_range_header("bytes=0-10,20-30"), None);
    assert_eq!(parse_range_header("bytes=abc-10"), None);
    assert_eq!(parse_range_header("bytes=10-5"), None);
  }

  #[test]
  fn is_mkv_matches_extension_case_insensitively() {
    assert!(is_mkv("/downloads/Show.S01E02.MKV"));
    assert!(!is_mkv("/downloads/Show.S01E02.mp4"));
  }
}
