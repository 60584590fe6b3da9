//! Owns the Usenet download lifecycle end to end (spec §4.6): submit/adopt, gate on minimum
//! progress, reject unsupported archives, discover the eventual video file, and track active
//! streams for the cleanup/extraction-monitor background loops. Structurally a direct
//! generalization of the teacher's `DownloadEngine` (`engine/mod.rs` + `engine/job.rs`): an
//! in-memory `DashMap<String, JobEntry>` registry, one `watch::Sender<JobControl>` per handle,
//! and the same `tokio::spawn`-per-background-loop shape (the teacher has one flusher loop in
//! `spawn_progress_flusher`; this controller runs five).

use crate::error::GatewayError;
use crate::external::downloader::Downloader;
use crate::external::file_server::FileServerClient;
use crate::model::{ActiveStream, DownloadState, MediaType, UserConfig};
use crate::usenet::storage_manager::StorageManager;
use crate::util::time::unix_millis;
use dashmap::DashMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

const MIN_PERCENT_GATE: f64 = 5.0;
const MIN_PERCENT_GATE_BUDGET: Duration = Duration::from_secs(60);
const VIDEO_DISCOVERY_BUDGET: Duration = Duration::from_secs(120);
const VIDEO_DISCOVERY_POLL: Duration = Duration::from_millis(500);
const INACTIVITY_CLEANUP_INTERVAL: Duration = Duration::from_secs(120);
const INACTIVE_TIMEOUT_SECS: i64 = 600;
const EXTRACTION_MONITOR_INTERVAL: Duration = Duration::from_secs(30);
const AUTOCLEAN_INTERVAL: Duration = Duration::from_secs(3600);
const AUTOCLEAN_AGE_DAYS: i64 = 7;
const STORAGE_MONITOR_INTERVAL: Duration = Duration::from_secs(60);

const EXCLUDED_FILE_PATTERN: &str = "(?i)sample|extra|featurette|deleted|trailer|bonus";
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "m4v", "ts"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobControl {
  Run,
  Pause,
}

struct JobEntry {
  download_id: String,
  display_name: String,
  media_type: MediaType,
  season: Option<u32>,
  episode: Option<u32>,
  config: UserConfig,
  state: parking_lot::Mutex<DownloadState>,
  control: watch::Sender<JobControl>,
  file_path: parking_lot::Mutex<Option<String>>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VideoResource {
  pub download_id: String,
  pub url: String,
  pub estimated_total_size: Option<i64>,
}

pub struct UsenetController {
  downloader: Arc<dyn Downloader>,
  file_server: Arc<dyn FileServerClient>,
  file_server_base_url: String,
  storage: Arc<StorageManager>,
  handles: DashMap<String, Arc<JobEntry>>,
  streams: parking_lot::Mutex<HashMap<String, ActiveStream>>,
}

impl UsenetController {
  pub fn new(
    downloader: Arc<dyn Downloader>,
    file_server: Arc<dyn FileServerClient>,
    file_server_base_url: String,
    storage: Arc<StorageManager>,
  ) -> Self {
    Self {
      downloader,
      file_server,
      file_server_base_url,
      storage,
      handles: DashMap::new(),
      streams: parking_lot::Mutex::new(HashMap::new()),
    }
  }

  fn streams_snapshot(&self) -> HashMap<String, ActiveStream> {
    self.streams.lock().clone()
  }

  /// `openStream` (spec §4.6): idempotent per title — a second call for the same title attaches
  /// to the handle the first call created.
  pub async fn open_stream(
    &self,
    nzb_url: &str,
    title: &str,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
    user_config: UserConfig,
  ) -> Result<VideoResource, GatewayError> {
    // 1. Disk-space gate.
    let gate_ok = self
      .storage
      .pre_download_gate(&self.streams_snapshot())
      .await
      .map_err(|e| GatewayError::InsufficientStorage(e.to_string()))?;
    if !gate_ok {
      return Err(GatewayError::InsufficientStorage("incomplete directory below 2 GiB".to_string()));
    }

    // 2. Adoption, else 3. fresh submission.
    let download_id = match self.adopt_or_submit(nzb_url, title, media_type, season, episode, user_config).await {
      Ok(id) => id,
      Err(e) => return Err(GatewayError::DownloadFailedOrAborted(e.to_string())),
    };

    // 4. Minimum-percentage gate.
    if let Err(e) = self.wait_minimum_percent(&download_id).await {
      self.purge(&download_id).await;
      return Err(e);
    }

    // 5. Archive detection.
    if let Err(e) = self.reject_unsupported_archives(&download_id, title).await {
      self.purge(&download_id).await;
      return Err(e);
    }

    // 6. Video-file discovery loop.
    let (path, size) = match self.discover_video_file(&download_id, title, media_type, season, episode).await {
      Ok(found) => found,
      Err(e) => {
        self.purge(&download_id).await;
        return Err(e);
      }
    };

    if let Some(entry) = self.handles.get(&download_id) {
      *entry.file_path.lock() = Some(path.clone());
    }
    self.streams.lock().insert(
      download_id.clone(),
      ActiveStream {
        download_id: download_id.clone(),
        file_server_path: path.clone(),
        file_size: size,
        last_access_ts: unix_millis() / 1000,
        last_playback_byte: 0,
        last_download_percent: 0.0,
        paused: false,
        is_personal: false,
        config: UserConfig { delete_on_stream_stop: false, is_personal: false },
        watched_percent: 0.0,
      },
    );

    Ok(VideoResource {
      download_id,
      url: format!("{}/{}", self.file_server_base_url.trim_end_matches('/'), path.trim_start_matches('/')),
      estimated_total_size: Some(size),
    })
  }

  async fn adopt_or_submit(
    &self,
    nzb_url: &str,
    title: &str,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
    user_config: UserConfig,
  ) -> anyhow::Result<String> {
    if let Some(existing) = self.handles.iter().find(|e| e.display_name == title) {
      return Ok(existing.download_id.clone());
    }

    let queue = self.downloader.queue().await?;
    if let Some(q) = queue.iter().find(|q| q.filename == title) {
      self.register_handle(q.nzo_id.clone(), title.to_string(), media_type, season, episode, user_config, DownloadState::Downloading);
      return Ok(q.nzo_id.clone());
    }

    let history = self.downloader.history().await?;
    if let Some(h) = history.iter().find(|h| h.name == title) {
      let still_present = self.file_server.list().await.map(|files| files.iter().any(|f| f.path.contains(title))).unwrap_or(false);
      if still_present {
        self.register_handle(h.nzo_id.clone(), title.to_string(), media_type, season, episode, user_config, DownloadState::Completed);
        return Ok(h.nzo_id.clone());
      }
      let _ = self.downloader.queue_delete(&h.nzo_id).await;
    }

    let nzo_id = self.downloader.add_url(nzb_url, title).await?;
    self.register_handle(nzo_id.clone(), title.to_string(), media_type, season, episode, user_config, DownloadState::Queued);

    // Delete all other in-progress downloads — only the just-submitted handle is itself
    // in-progress here, so peer eviction always applies on a fresh submission (spec §4.6 step 3).
    for other in self.handles.iter() {
      if other.download_id == nzo_id {
        continue;
      }
      if matches!(*other.state.lock(), DownloadState::Queued | DownloadState::Downloading) {
        let _ = self.downloader.queue_delete(&other.download_id).await;
      }
    }
    self.handles.retain(|id, entry| *id == nzo_id || !matches!(*entry.state.lock(), DownloadState::Queued | DownloadState::Downloading));

    Ok(nzo_id)
  }

  fn register_handle(
    &self,
    download_id: String,
    display_name: String,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
    config: UserConfig,
    state: DownloadState,
  ) {
    let (tx, _rx) = watch::channel(JobControl::Run);
    self.handles.insert(
      download_id.clone(),
      Arc::new(JobEntry {
        download_id,
        display_name,
        media_type,
        season,
        episode,
        config,
        state: parking_lot::Mutex::new(state),
        control: tx,
        file_path: parking_lot::Mutex::new(None),
      }),
    );
  }

  async fn wait_minimum_percent(&self, download_id: &str) -> Result<(), GatewayError> {
    let deadline = tokio::time::Instant::now() + MIN_PERCENT_GATE_BUDGET;
    loop {
      let queue = self.downloader.queue().await.map_err(|e| GatewayError::DownloadFailedOrAborted(e.to_string()))?;
      if let Some(entry) = queue.iter().find(|q| q.nzo_id == download_id) {
        if entry.status.eq_ignore_ascii_case("failed") || entry.status.eq_ignore_ascii_case("error") {
          return Err(GatewayError::DownloadFailedOrAborted(format!("downloader reported {}", entry.status)));
        }
        if entry.percent_complete().unwrap_or(0.0) >= MIN_PERCENT_GATE {
          self.set_state(download_id, DownloadState::Downloading);
          return Ok(());
        }
      } else {
        let history = self.downloader.history().await.map_err(|e| GatewayError::DownloadFailedOrAborted(e.to_string()))?;
        if let Some(h) = history.iter().find(|h| h.nzo_id == download_id) {
          if h.status.eq_ignore_ascii_case("failed") {
            return Err(GatewayError::DownloadFailedOrAborted("download failed".to_string()));
          }
          self.set_state(download_id, DownloadState::Completed);
          return Ok(());
        }
      }
      if tokio::time::Instant::now() >= deadline {
        return Err(GatewayError::DownloadFailedOrAborted("minimum-percentage gate timed out".to_string()));
      }
      tokio::time::sleep(Duration::from_secs(1)).await;
    }
  }

  async fn reject_unsupported_archives(&self, download_id: &str, title: &str) -> Result<(), GatewayError> {
    if let Ok(check) = self.file_server.check_archives(title).await {
      if check.found && check.has_7z {
        return Err(GatewayError::UnsupportedArchive("7z archives not supported".to_string()));
      }
    }
    if let Ok(files) = self.downloader.get_files(download_id).await {
      let has_zip = files.iter().any(|f| {
        let lower = f.path.to_ascii_lowercase();
        lower.ends_with(".zip") || lower.ends_with(".zip.001")
      });
      if has_zip {
        return Err(GatewayError::UnsupportedArchive("zip archives not supported".to_string()));
      }
    }
    Ok(())
  }

  async fn discover_video_file(
    &self,
    download_id: &str,
    title: &str,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
  ) -> Result<(String, i64), GatewayError> {
    let excluded = Regex::new(EXCLUDED_FILE_PATTERN).expect("static pattern");
    let deadline = tokio::time::Instant::now() + VIDEO_DISCOVERY_BUDGET;
    loop {
      let candidates = self.list_candidate_files(download_id, title, &excluded).await;
      let chosen = if media_type == MediaType::Series && (season.is_some() || episode.is_some()) {
        candidates.into_iter().find(|(path, _)| season_episode_matches(path, season, episode))
      } else {
        candidates.into_iter().max_by_key(|(_, size)| *size)
      };
      if let Some((path, size)) = chosen {
        return Ok((path, size));
      }
      if tokio::time::Instant::now() >= deadline {
        return Err(GatewayError::DownloadFailedOrAborted("video file discovery timed out".to_string()));
      }
      tokio::time::sleep(VIDEO_DISCOVERY_POLL).await;
    }
  }

  async fn list_candidate_files(&self, download_id: &str, title: &str, excluded: &Regex) -> Vec<(String, i64)> {
    let mut out = Vec::new();
    if let Ok(files) = self.file_server.list().await {
      out.extend(files.into_iter().map(|f| (f.path, f.size_bytes)));
    }
    if out.is_empty() {
      if let Ok(files) = self.downloader.get_files(download_id).await {
        out.extend(files.into_iter().map(|f| (f.path, f.size)));
      }
    }
    let title_lower = title.to_ascii_lowercase();
    out.retain(|(path, _)| {
      let lower = path.to_ascii_lowercase();
      let is_video = VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext));
      let name_matches = lower.contains(&title_lower);
      is_video && name_matches && !excluded.is_match(&lower)
    });
    out
  }

  async fn purge(&self, download_id: &str) {
    let _ = self.downloader.queue_delete(download_id).await;
    self.handles.remove(download_id);
    self.streams.lock().remove(download_id);
  }

  fn set_state(&self, download_id: &str, state: DownloadState) {
    if let Some(entry) = self.handles.get(download_id) {
      *entry.state.lock() = state;
    }
  }

  /// `attachStream` (spec §4.6): invoked on every HTTP range read to bump the liveness clock
  /// RangeStreamer and the inactivity-cleanup loop both consult.
  pub fn attach_stream(&self, download_id: &str, playback_byte: i64) -> Option<ActiveStream> {
    let mut streams = self.streams.lock();
    let stream = streams.get_mut(download_id)?;
    stream.last_access_ts = unix_millis() / 1000;
    stream.last_playback_byte = stream.last_playback_byte.max(playback_byte);
    Some(stream.clone())
  }

  pub fn download_state(&self, download_id: &str) -> Option<DownloadState> {
    self.handles.get(download_id).map(|e| *e.state.lock())
  }

  /// The file-server collaborator, for callers (the HTTP layer, the range streamer) that need
  /// to proxy the error-as-video clip (spec §4.9) without owning their own handle.
  pub fn file_server(&self) -> Arc<dyn FileServerClient> {
    self.file_server.clone()
  }

  /// Read-only snapshot of an `ActiveStream`, for callers (the range streamer) that need to
  /// inspect frontier/percent state without bumping `lastAccessTs` the way `attach_stream` does.
  pub fn peek_stream(&self, download_id: &str) -> Option<ActiveStream> {
    self.streams.lock().get(download_id).cloned()
  }

  /// Re-queries the downloader for this handle's live state/percent and updates the tracked
  /// `ActiveStream.last_download_percent` (the extraction-monitor loop only does this every 30s,
  /// too coarse for the range streamer's seek-ahead wait, which polls every 2s). Returns the
  /// freshly observed state and percent, or `None` if the handle has vanished from both queue
  /// and history (spec §4.6's `NotFound`).
  pub async fn refresh_download_progress(&self, download_id: &str) -> Option<(DownloadState, f64)> {
    if let Ok(queue) = self.downloader.queue().await {
      if let Some(entry) = queue.iter().find(|q| q.nzo_id == download_id) {
        let percent = entry.percent_complete().unwrap_or(0.0);
        let state = if entry.status.eq_ignore_ascii_case("failed") || entry.status.eq_ignore_ascii_case("error") {
          DownloadState::Failed
        } else if entry.status.eq_ignore_ascii_case("paused") {
          DownloadState::Paused
        } else if entry.status.eq_ignore_ascii_case("extracting") {
          DownloadState::Extracting
        } else if entry.status.eq_ignore_ascii_case("verifying") {
          DownloadState::Verifying
        } else if percent >= 100.0 {
          // Transfer finished but the downloader still carries the job — archive
          // post-processing (spec §4.6's 100%+archive-processing → Extracting).
          DownloadState::Extracting
        } else {
          DownloadState::Downloading
        };
        self.set_state(download_id, state);
        if let Some(stream) = self.streams.lock().get_mut(download_id) {
          stream.last_download_percent = percent;
          stream.paused = state == DownloadState::Paused;
        }
        return Some((state, percent));
      }
    }
    if let Ok(history) = self.downloader.history().await {
      if let Some(h) = history.iter().find(|h| h.nzo_id == download_id) {
        let state = if h.status.eq_ignore_ascii_case("failed") { DownloadState::Failed } else { DownloadState::Completed };
        self.set_state(download_id, state);
        if let Some(stream) = self.streams.lock().get_mut(download_id) {
          stream.last_download_percent = 100.0;
        }
        return Some((state, 100.0));
      }
    }

    // Neither the queue nor history knows this handle (spec §4.6's synthetic `NotFound`).
    // Last-chance: the file server may already hold the finished file even though the
    // downloader's own bookkeeping dropped the job first.
    let known_path = self.handles.get(download_id).and_then(|e| e.file_path.lock().clone());
    if let Some(path) = known_path {
      if let Ok(files) = self.file_server.list().await {
        if files.iter().any(|f| f.path == path) {
          self.set_state(download_id, DownloadState::Completed);
          if let Some(stream) = self.streams.lock().get_mut(download_id) {
            stream.last_download_percent = 100.0;
          }
          return Some((DownloadState::Completed, 100.0));
        }
      }
    }
    self.set_state(download_id, DownloadState::NotFound);
    Some((DownloadState::NotFound, 0.0))
  }

  pub async fn pause_download(&self, download_id: &str) -> anyhow::Result<()> {
    self.downloader.queue_pause(download_id).await?;
    if let Some(entry) = self.handles.get(download_id) {
      let _ = entry.control.send(JobControl::Pause);
      *entry.state.lock() = DownloadState::Paused;
    }
    if let Some(stream) = self.streams.lock().get_mut(download_id) {
      stream.paused = true;
    }
    Ok(())
  }

  pub async fn resume_download(&self, download_id: &str) -> anyhow::Result<()> {
    self.downloader.queue_resume(download_id).await?;
    if let Some(entry) = self.handles.get(download_id) {
      let _ = entry.control.send(JobControl::Run);
      *entry.state.lock() = DownloadState::Downloading;
    }
    if let Some(stream) = self.streams.lock().get_mut(download_id) {
      stream.paused = false;
    }
    Ok(())
  }

  pub async fn move_to_top(&self, download_id: &str) -> anyhow::Result<()> {
    self.downloader.queue_priority_top(download_id).await
  }

  /// Composite: resume → moveToTop → pause every other in-progress peer. Returns the count paused.
  pub async fn prioritize(&self, download_id: &str) -> anyhow::Result<usize> {
    self.resume_download(download_id).await?;
    self.move_to_top(download_id).await?;

    let peers: Vec<String> = self
      .handles
      .iter()
      .filter(|e| e.download_id != download_id && matches!(*e.state.lock(), DownloadState::Queued | DownloadState::Downloading))
      .map(|e| e.download_id.clone())
      .collect();
    let mut paused = 0;
    for peer in peers {
      if self.pause_download(&peer).await.is_ok() {
        paused += 1;
      }
    }
    Ok(paused)
  }

  /// Starts the five background loops (spec §4.6). Each runs until `cancel` is triggered.
  pub fn spawn_background_loops(self: &Arc<Self>, cancel: CancellationToken) {
    self.clone().spawn_inactivity_cleanup(cancel.clone());
    self.clone().spawn_extraction_monitor(cancel.clone());
    self.clone().spawn_autoclean(cancel.clone());
    self.clone().spawn_orphan_sweep();
    self.clone().spawn_storage_monitor(cancel.clone());
  }

  /// Disk-pressure monitor (spec §4.8): Normal mode reacts to the downloader's own `lowSpace`
  /// report, Critical mode reacts to available space dropping under 5 GiB. `pre_download_gate`
  /// (step 1 of `open_stream`) covers the synchronous submit-time case; this loop is what makes
  /// eviction reactive between submissions.
  fn spawn_storage_monitor(self: Arc<Self>, cancel: CancellationToken) {
    tokio::spawn(async move {
      let mut tick = tokio::time::interval(STORAGE_MONITOR_INTERVAL);
      loop {
        tokio::select! {
          _ = cancel.cancelled() => break,
          _ = tick.tick() => {
            let active = self.streams_snapshot();
            if let Err(e) = self.storage.run_normal_if_needed(&active).await {
              tracing::warn!(error = %e, "normal storage cleanup failed");
            }
            if let Err(e) = self.storage.run_critical_if_needed(&active).await {
              tracing::warn!(error = %e, "critical storage cleanup failed");
            }
          }
        }
      }
    });
  }

  fn spawn_inactivity_cleanup(self: Arc<Self>, cancel: CancellationToken) {
    tokio::spawn(async move {
      let mut tick = tokio::time::interval(INACTIVITY_CLEANUP_INTERVAL);
      loop {
        tokio::select! {
          _ = cancel.cancelled() => break,
          _ = tick.tick() => {
            let now = unix_millis() / 1000;
            let idle: Vec<(String, bool, bool)> = self
              .streams
              .lock()
              .values()
              .filter(|s| now - s.last_access_ts > INACTIVE_TIMEOUT_SECS)
              .map(|s| (s.download_id.clone(), s.is_personal, s.config.delete_on_stream_stop))
              .collect();
            for (download_id, is_personal, delete_on_stop) in idle {
              if is_personal {
                continue;
              }
              let state = self.download_state(&download_id);
              if delete_on_stop && matches!(state, Some(DownloadState::Downloading) | Some(DownloadState::Paused)) {
                if let Some(path) = self.handles.get(&download_id).and_then(|e| e.file_path.lock().clone()) {
                  let _ = self.file_server.delete(&path).await;
                }
                self.purge(&download_id).await;
              }
              self.streams.lock().remove(&download_id);
            }
          }
        }
      }
    });
  }

  fn spawn_extraction_monitor(self: Arc<Self>, cancel: CancellationToken) {
    tokio::spawn(async move {
      let mut tick = tokio::time::interval(EXTRACTION_MONITOR_INTERVAL);
      loop {
        tokio::select! {
          _ = cancel.cancelled() => break,
          _ = tick.tick() => {
            let paused: Vec<String> = self
              .streams
              .lock()
              .values()
              .filter(|s| {
                s.paused && s.file_size > 0 && {
                  let playback_percent = (s.last_playback_byte as f64 / s.file_size as f64) * 100.0;
                  playback_percent > s.last_download_percent - 15.0
                }
              })
              .map(|s| s.download_id.clone())
              .collect();
            for download_id in paused {
              let _ = self.resume_download(&download_id).await;
            }
          }
        }
      }
    });
  }

  fn spawn_autoclean(self: Arc<Self>, cancel: CancellationToken) {
    tokio::spawn(async move {
      let mut tick = tokio::time::interval(AUTOCLEAN_INTERVAL);
      loop {
        tokio::select! {
          _ = cancel.cancelled() => break,
          _ = tick.tick() => {
            let Ok(files) = self.file_server.list().await else { continue };
            let now = unix_millis() / 1000;
            for file in files {
              let age_days = (now - file.modified_ts) / 86_400;
              if file.is_complete && age_days > AUTOCLEAN_AGE_DAYS {
                let _ = self.file_server.delete(&file.path).await;
              }
            }
          }
        }
      }
    });
  }

  fn spawn_orphan_sweep(self: Arc<Self>) {
    tokio::spawn(async move {
      let Ok(queue) = self.downloader.queue().await else { return };
      let active_ids: std::collections::HashSet<String> = self.streams.lock().keys().cloned().collect();
      for entry in queue {
        if entry.status.eq_ignore_ascii_case("paused") && !active_ids.contains(&entry.nzo_id) {
          let _ = self.downloader.queue_resume(&entry.nzo_id).await;
        }
      }
    });
  }
}

/// Series season/episode match against a release path, tolerating `S01E02`, `1x02`, and
/// `Season 1/Episode 2` directory-style layouts.
fn season_episode_matches(path: &str, season: Option<u32>, episode: Option<u32>) -> bool {
  let Some(re) = Regex::new(r"(?i)s(\d{1,2})[._ ]?e(\d{1,3})|(\d{1,2})x(\d{1,3})").ok() else { return false };
  let Some(caps) = re.captures(path) else { return false };
  let (found_season, found_episode) = if let (Some(s), Some(e)) = (caps.get(1), caps.get(2)) {
    (s.as_str().parse::<u32>().ok(), e.as_str().parse::<u32>().ok())
  } else {
    (caps.get(3).and_then(|m| m.as_str().parse().ok()), caps.get(4).and_then(|m| m.as_str().parse().ok()))
  };
  match (season, episode) {
    (Some(s), Some(e)) => found_season == Some(s) && found_episode == Some(e),
    (Some(s), None) => found_season == Some(s),
    (None, Some(e)) => found_episode == Some(e),
    (None, None) => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn season_episode_matches_s01e02_style() {
    assert!(season_episode_matches("Show.S01E02.mkv", Some(1), Some(2)));
    assert!(!season_episode_matches("Show.S01E03.mkv", Some(1), Some(2)));
  }

  #[test]
  fn season_episode_matches_1x02_style() {
    assert!(season_episode_matches("Show.1x02.mkv", Some(1), Some(2)));
  }

  #[test]
  fn season_episode_no_constraint_matches_anything() {
    assert!(season_episode_matches("Show.mkv", None, None));
  }
}
