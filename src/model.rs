//! Wire/data-model entities (spec §3). Flat, `serde`-derived public structs, following the
//! teacher's `model.rs` conventions: `SCREAMING_SNAKE_CASE` wire enums, `Option<T>` for
//! nullable fields, plain `String` timestamps produced by [`crate::util::time::now_rfc3339`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
  Movie,
  Series,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
  pub catalog_id: String,
  pub media_type: MediaType,
  pub season: Option<u32>,
  pub episode: Option<u32>,
  #[serde(default)]
  pub user_options: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTitle {
  pub title: String,
  pub url: String,
  pub year: Option<i32>,
  pub poster: Option<String>,
  pub source_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedTitle {
  pub candidate: CandidateTitle,
  pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
  Q2160p,
  Q1440p,
  Q1080p,
  Q720p,
  Q480p,
  Other,
}

impl Quality {
  /// Sort rank, best first: 2160p > 1440p > 1080p > 720p > 480p > other (spec §4.5).
  pub fn rank(self) -> u8 {
    match self {
      Quality::Q2160p => 0,
      Quality::Q1440p => 1,
      Quality::Q1080p => 2,
      Quality::Q720p => 3,
      Quality::Q480p => 4,
      Quality::Other => 5,
    }
  }
}

pub type LangCode = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
  pub display_name: String,
  pub title: String,
  pub url: String,
  pub quality: Quality,
  pub size_bytes: Option<i64>,
  pub languages: BTreeSet<LangCode>,
  pub source_tag: String,
  pub needs_resolution: bool,
  pub binge_group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedUrl {
  pub url: String,
  pub filename: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadState {
  Queued,
  Downloading,
  Paused,
  Extracting,
  Verifying,
  Completed,
  Failed,
  NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadHandle {
  pub download_id: String,
  pub display_name: String,
  pub submitted_at: String,
  pub state: DownloadState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
  #[serde(default)]
  pub delete_on_stream_stop: bool,
  #[serde(default)]
  pub is_personal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveStream {
  pub download_id: String,
  pub file_server_path: String,
  pub file_size: i64,
  pub last_access_ts: i64,
  pub last_playback_byte: i64,
  pub last_download_percent: f64,
  pub paused: bool,
  pub is_personal: bool,
  pub config: UserConfig,
  pub watched_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
  pub path: String,
  #[serde(default)]
  pub name: String,
  #[serde(rename = "size")]
  pub size_bytes: i64,
  #[serde(rename = "modified")]
  pub modified_ts: i64,
  #[serde(rename = "isComplete")]
  pub is_complete: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogMeta {
  pub name: String,
  pub year: Option<String>,
  #[serde(default)]
  pub moviedb_id: Option<String>,
  #[serde(default)]
  pub original_name: Option<String>,
  #[serde(default)]
  pub alternate_names: Vec<String>,
}
