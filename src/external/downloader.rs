//! The external Usenet downloader's HTTP API (spec §6) — a SABnzbd/Newznab-shaped surface,
//! explicitly out of scope to specify in detail ("not specified here"). One concrete
//! `reqwest`-backed client against a generic JSON contract, narrow enough for
//! `usenet::controller` to drive without knowing the vendor. Percentage parsing tolerates the
//! empty string and non-numeric junk, per spec §6.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct QueueEntry {
  pub nzo_id: String,
  pub filename: String,
  #[serde(default)]
  pub percentage: serde_json::Value,
  #[serde(default)]
  pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
  pub nzo_id: String,
  pub name: String,
  pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloaderFile {
  pub path: String,
  pub size: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloaderConfig {
  pub complete_dir: String,
  pub incomplete_dir: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DiskSpace {
  #[serde(rename = "diskspace1")]
  pub complete_dir_free_gb: f64,
  #[serde(rename = "diskspace2")]
  pub incomplete_dir_free_gb: f64,
}

impl QueueEntry {
  /// Tolerant percentage parse: the downloader reports this as a JSON string like `"45.2"`,
  /// but also emits `""` or non-numeric placeholders while queued. Either maps to `None`.
  pub fn percent_complete(&self) -> Option<f64> {
    match &self.percentage {
      serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
      serde_json::Value::Number(n) => n.as_f64(),
      _ => None,
    }
  }
}

#[async_trait]
pub trait Downloader: Send + Sync {
  async fn add_url(&self, nzb_url: &str, display_name: &str) -> anyhow::Result<String>;
  async fn queue(&self) -> anyhow::Result<Vec<QueueEntry>>;
  async fn history(&self) -> anyhow::Result<Vec<HistoryEntry>>;
  async fn get_files(&self, nzo_id: &str) -> anyhow::Result<Vec<DownloaderFile>>;
  async fn get_config(&self) -> anyhow::Result<DownloaderConfig>;
  /// SABnzbd-shaped `mode=qstatus`: free space in each managed directory, in GiB.
  async fn disk_space(&self) -> anyhow::Result<DiskSpace>;
  async fn queue_delete(&self, nzo_id: &str) -> anyhow::Result<()>;
  async fn queue_pause(&self, nzo_id: &str) -> anyhow::Result<()>;
  async fn queue_resume(&self, nzo_id: &str) -> anyhow::Result<()>;
  async fn queue_priority_top(&self, nzo_id: &str) -> anyhow::Result<()>;
}

pub struct HttpDownloader {
  client: reqwest::Client,
  base_url: String,
}

impl HttpDownloader {
  pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
    Ok(Self { client: crate::transport::build_client(timeout)?, base_url })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
  }
}

#[derive(Deserialize)]
struct AddResponse {
  nzo_ids: Vec<String>,
}

#[async_trait]
impl Downloader for HttpDownloader {
  async fn add_url(&self, nzb_url: &str, display_name: &str) -> anyhow::Result<String> {
    let resp: AddResponse = self
      .client
      .get(self.url("api"))
      .query(&[("mode", "addurl"), ("name", nzb_url), ("nzbname", display_name)])
      .send()
      .await?
      .json()
      .await?;
    resp.nzo_ids.into_iter().next().ok_or_else(|| anyhow::anyhow!("downloader returned no nzo_id"))
  }

  async fn queue(&self) -> anyhow::Result<Vec<QueueEntry>> {
    #[derive(Deserialize)]
    struct Envelope {
      queue: QueueBody,
    }
    #[derive(Deserialize)]
    struct QueueBody {
      slots: Vec<QueueEntry>,
    }
    let env: Envelope = self
      .client
      .get(self.url("api"))
      .query(&[("mode", "queue")])
      .send()
      .await?
      .json()
      .await?;
    Ok(env.queue.slots)
  }

  async fn history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
    #[derive(Deserialize)]
    struct Envelope {
      history: HistoryBody,
    }
    #[derive(Deserialize)]
    struct HistoryBody {
      slots: Vec<HistoryEntry>,
    }
    let env: Envelope = self
      .client
      .get(self.url("api"))
      .query(&[("mode", "history")])
      .send()
      .await?
      .json()
      .await?;
    Ok(env.history.slots)
  }

  async fn get_files(&self, nzo_id: &str) -> anyhow::Result<Vec<DownloaderFile>> {
    #[derive(Deserialize)]
    struct Envelope {
      files: Vec<DownloaderFile>,
    }
    let env: Envelope = self
      .client
      .get(self.url("api"))
      .query(&[("mode", "get_files"), ("value", nzo_id)])
      .send()
      .await?
      .json()
      .await?;
    Ok(env.files)
  }

  async fn get_config(&self) -> anyhow::Result<DownloaderConfig> {
    #[derive(Deserialize)]
    struct Envelope {
      config: DownloaderConfig,
    }
    let env: Envelope = self
      .client
      .get(self.url("api"))
      .query(&[("mode", "get_config")])
      .send()
      .await?
      .json()
      .await?;
    Ok(env.config)
  }

  async fn disk_space(&self) -> anyhow::Result<DiskSpace> {
    let space: DiskSpace = self
      .client
      .get(self.url("api"))
      .query(&[("mode", "qstatus")])
      .send()
      .await?
      .json()
      .await?;
    Ok(space)
  }

  async fn queue_delete(&self, nzo_id: &str) -> anyhow::Result<()> {
    self
      .client
      .get(self.url("api"))
      .query(&[("mode", "queue"), ("name", "delete"), ("value", nzo_id)])
      .send()
      .await?;
    Ok(())
  }

  async fn queue_pause(&self, nzo_id: &str) -> anyhow::Result<()> {
    self
      .client
      .get(self.url("api"))
      .query(&[("mode", "queue"), ("name", "pause"), ("value", nzo_id)])
      .send()
      .await?;
    Ok(())
  }

  async fn queue_resume(&self, nzo_id: &str) -> anyhow::Result<()> {
    self
      .client
      .get(self.url("api"))
      .query(&[("mode", "queue"), ("name", "resume"), ("value", nzo_id)])
      .send()
      .await?;
    Ok(())
  }

  async fn queue_priority_top(&self, nzo_id: &str) -> anyhow::Result<()> {
    self
      .client
      .get(self.url("api"))
      .query(&[("mode", "queue"), ("name", "priority"), ("value", nzo_id), ("value2", "2")])
      .send()
      .await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percent_complete_tolerates_empty_and_non_numeric() {
    let mut entry = QueueEntry {
      nzo_id: "1".into(),
      filename: "f".into(),
      percentage: serde_json::Value::String("".into()),
      status: "Downloading".into(),
    };
    assert_eq!(entry.percent_complete(), None);
    entry.percentage = serde_json::Value::String("n/a".into());
    assert_eq!(entry.percent_complete(), None);
    entry.percentage = serde_json::Value::String("45.2".into());
    assert_eq!(entry.percent_complete(), Some(45.2));
  }
}
