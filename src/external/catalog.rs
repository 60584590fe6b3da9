//! Catalog metadata collaborator (spec §6): `GET {catalogBase}/meta/{type}/{id}.json`.
//! Explicitly out of scope per spec.md's non-goals ("catalog metadata service" is an external
//! collaborator, not specified here), so this is one concrete `reqwest`-backed implementation
//! behind a narrow trait, following the teacher's `transport::Transport::client_for` pattern
//! of a single shared client per collaborator.

use crate::model::{CatalogMeta, MediaType};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait CatalogClient: Send + Sync {
  /// Resolves `catalogId` into metadata, or `None` on any non-2xx/parse failure — the caller
  /// treats that as `MetadataMissing` (spec §7) and returns an empty result set.
  async fn lookup(&self, media_type: MediaType, catalog_id: &str) -> Option<CatalogMeta>;
}

pub struct HttpCatalogClient {
  client: reqwest::Client,
  base_url: String,
}

impl HttpCatalogClient {
  pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
    Ok(Self { client: crate::transport::build_client(timeout)?, base_url })
  }
}

#[derive(serde::Deserialize)]
struct MetaEnvelope {
  meta: CatalogMeta,
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
  async fn lookup(&self, media_type: MediaType, catalog_id: &str) -> Option<CatalogMeta> {
    let type_segment = match media_type {
      MediaType::Movie => "movie",
      MediaType::Series => "series",
    };
    let url = format!("{}/meta/{}/{}.json", self.base_url.trim_end_matches('/'), type_segment, catalog_id);
    let resp = self.client.get(&url).send().await.ok()?;
    if !resp.status().is_success() {
      return None;
    }
    resp.json::<MetaEnvelope>().await.ok().map(|e| e.meta)
  }
}
