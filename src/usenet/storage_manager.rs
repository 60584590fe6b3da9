//! Disk-pressure eviction (spec §4.8). New relative to the teacher (no analog module), but
//! follows the teacher's `persistence`-module texture: plain functions over a small struct,
//! no background state beyond what callers pass in.

use crate::external::downloader::Downloader;
use crate::external::file_server::FileServerClient;
use crate::model::{ActiveStream, StoredFile};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const GIB: i64 = 1024 * 1024 * 1024;
const NORMAL_TARGET_BYTES: i64 = 10 * GIB;
const CRITICAL_TARGET_BYTES: i64 = 20 * GIB;
const CRITICAL_THRESHOLD_BYTES: i64 = 5 * GIB;
const PRE_DOWNLOAD_GATE_BYTES: i64 = 2 * GIB;
const PRE_DOWNLOAD_MIN_FREED_BYTES: i64 = 1 * GIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
  Normal,
  Critical,
}

pub struct StorageManager {
  downloader: Arc<dyn Downloader>,
  file_server: Arc<dyn FileServerClient>,
}

impl StorageManager {
  pub fn new(downloader: Arc<dyn Downloader>, file_server: Arc<dyn FileServerClient>) -> Self {
    Self { downloader, file_server }
  }

  /// Runs if the downloader reports low space on either managed directory. Frees up to
  /// `NORMAL_TARGET_BYTES`, stopping as soon as the target is reached.
  pub async fn run_normal_if_needed(&self, active: &HashMap<String, ActiveStream>) -> anyhow::Result<i64> {
    let space = self.downloader.disk_space().await?;
    let low_space = space.complete_dir_free_gb < 1.0 || space.incomplete_dir_free_gb < 1.0;
    if !low_space {
      return Ok(0);
    }
    self.cleanup(CleanupMode::Normal, NORMAL_TARGET_BYTES, active).await
  }

  /// Runs if available space is below the critical threshold. Admits deletion of still-incomplete
  /// files, unlike `Normal`.
  pub async fn run_critical_if_needed(&self, active: &HashMap<String, ActiveStream>) -> anyhow::Result<i64> {
    let space = self.downloader.disk_space().await?;
    let available = (space.complete_dir_free_gb.min(space.incomplete_dir_free_gb) * GIB as f64) as i64;
    if available >= CRITICAL_THRESHOLD_BYTES {
      return Ok(0);
    }
    self.cleanup(CleanupMode::Critical, CRITICAL_TARGET_BYTES, active).await
  }

  /// Pre-submission gate: if available space is under 2 GiB, runs Critical cleanup synchronously
  /// and only proceeds if at least 1 GiB was freed.
  pub async fn pre_download_gate(&self, active: &HashMap<String, ActiveStream>) -> anyhow::Result<bool> {
    let space = self.downloader.disk_space().await?;
    let available = (space.complete_dir_free_gb.min(space.incomplete_dir_free_gb) * GIB as f64) as i64;
    if available >= PRE_DOWNLOAD_GATE_BYTES {
      return Ok(true);
    }
    let freed = self.cleanup(CleanupMode::Critical, CRITICAL_TARGET_BYTES, active).await?;
    Ok(freed >= PRE_DOWNLOAD_MIN_FREED_BYTES)
  }

  async fn cleanup(&self, mode: CleanupMode, target_bytes: i64, active: &HashMap<String, ActiveStream>) -> anyhow::Result<i64> {
    let files = self.file_server.list().await?;
    let mut scored: Vec<(i64, StoredFile)> = files
      .into_iter()
      .filter(|f| mode == CleanupMode::Critical || f.is_complete)
      .map(|f| (priority(&f, active), f))
      .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut freed = 0i64;
    for (_, file) in scored {
      if freed >= target_bytes {
        break;
      }
      if is_protected(&file, active) {
        continue;
      }
      if self.file_server.delete(&file.path).await.is_ok() {
        freed += file.size_bytes;
      }
      tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Ok(freed)
  }
}

/// InactiveTimeout-protected files are never eligible for eviction (spec §8 invariant 5).
fn is_protected(file: &StoredFile, active: &HashMap<String, ActiveStream>) -> bool {
  const INACTIVE_TIMEOUT_SECS: i64 = 600;
  active.values().any(|s| {
    s.file_server_path == file.path && (crate::util::time::unix_millis() / 1000 - s.last_access_ts) < INACTIVE_TIMEOUT_SECS
  })
}

/// Cleanup priority scoring (spec §4.8): higher runs first.
fn priority(file: &StoredFile, active: &HashMap<String, ActiveStream>) -> i64 {
  let now = crate::util::time::unix_millis() / 1000;
  let age_days = ((now - file.modified_ts).max(0) as f64 / 86_400.0) as i64;

  if let Some(stream) = active.values().find(|s| s.file_server_path == file.path) {
    if stream.watched_percent >= 90.0 {
      let hours_since_watch = ((now - stream.last_access_ts).max(0) as f64 / 3600.0) as i64;
      return 1000 + hours_since_watch;
    }
  }

  if file.is_complete && age_days > 7 {
    return 100 + 10 * age_days;
  }
  if !file.is_complete && age_days > 3 {
    return 50 + 5 * age_days;
  }
  0
}

#[cfg(test)]
mod tests {
  use super::*;

  fn stored(path: &str, size: i64, modified_ts: i64, is_complete: bool) -> StoredFile {
    StoredFile { path: path.to_string(), name: path.to_string(), size_bytes: size, modified_ts, is_complete }
  }

  #[test]
  fn completed_old_unwatched_file_scores_by_age() {
    let now = crate::util::time::unix_millis() / 1000;
    let f = stored("a", 1, now - 10 * 86_400, true);
    let active = HashMap::new();
    assert_eq!(priority(&f, &active), 100 + 10 * 10);
  }

  #[test]
  fn incomplete_recent_file_scores_zero() {
    let now = crate::util::time::unix_millis() / 1000;
    let f = stored("b", 1, now - 86_400, false);
    let active = HashMap::new();
    assert_eq!(priority(&f, &active), 0);
  }

  #[test]
  fn watched_file_outranks_everything_else() {
    let now = crate::util::time::unix_millis() / 1000;
    let f = stored("c", 1, now - 30 * 86_400, true);
    let mut active = HashMap::new();
    active.insert(
      "s1".to_string(),
      ActiveStream {
        download_id: "d1".to_string(),
        file_server_path: "c".to_string(),
        file_size: 100,
        last_access_ts: now,
        last_playback_byte: 0,
        last_download_percent: 100.0,
        paused: false,
        is_personal: false,
        config: crate::model::UserConfig { delete_on_stream_stop: false, is_personal: false },
        watched_percent: 95.0,
      },
    );
    assert!(priority(&f, &active) >= 1000);
  }
}
