//! Internal file-server collaborator (spec §6): `/api/list`, `/api/check-archives`,
//! `DELETE /{path}`, `/error?message=...`. API-key header `X-API-Key`. This is the one
//! "internal collaborator" spec.md treats as in-scope for a client shape (unlike the
//! downloader/catalog/provider HTML surfaces, which are pure externals).

use crate::model::StoredFile;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;
use std::time::Duration;

pub type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ArchiveCheck {
  #[serde(rename = "has7z")]
  pub has_7z: bool,
  pub found: bool,
}

#[async_trait]
pub trait FileServerClient: Send + Sync {
  async fn list(&self) -> anyhow::Result<Vec<StoredFile>>;
  async fn check_archives(&self, folder: &str) -> anyhow::Result<ArchiveCheck>;
  async fn delete(&self, path: &str) -> anyhow::Result<()>;
  /// Streams the pre-rendered error-as-video clip (spec §4.9), parameterized by `message`.
  async fn error_video_stream(&self, message: &str) -> anyhow::Result<ByteStream>;
}

#[derive(Clone)]
pub struct HttpFileServerClient {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

impl HttpFileServerClient {
  pub fn new(base_url: String, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
    Ok(Self { client: crate::transport::build_client(timeout)?, base_url, api_key })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
  }
}

#[derive(serde::Deserialize)]
struct ListEnvelope {
  files: Vec<StoredFile>,
}

#[async_trait]
impl FileServerClient for HttpFileServerClient {
  async fn list(&self) -> anyhow::Result<Vec<StoredFile>> {
    let env: ListEnvelope = self
      .client
      .get(self.url("api/list"))
      .header("X-API-Key", &self.api_key)
      .send()
      .await?
      .json()
      .await?;
    Ok(env.files)
  }

  async fn check_archives(&self, folder: &str) -> anyhow::Result<ArchiveCheck> {
    let check: ArchiveCheck = self
      .client
      .get(self.url("api/check-archives"))
      .header("X-API-Key", &self.api_key)
      .query(&[("folder", folder)])
      .send()
      .await?
      .json()
      .await?;
    Ok(check)
  }

  async fn delete(&self, path: &str) -> anyhow::Result<()> {
    self
      .client
      .delete(self.url(path))
      .header("X-API-Key", &self.api_key)
      .send()
      .await?;
    Ok(())
  }

  async fn error_video_stream(&self, message: &str) -> anyhow::Result<ByteStream> {
    let resp = self
      .client
      .get(self.url("error"))
      .header("X-API-Key", &self.api_key)
      .query(&[("message", message)])
      .send()
      .await?;
    Ok(Box::pin(resp.bytes_stream()))
  }
}
