//! Cached-hash debrid-indexer `ProviderSearch` implementation (spec §2's "OffCloud
//! orchestrator" class). Returns already-resolved direct URLs, so `needsResolution = false`
//! and `resolve::stream_catalog` is skipped entirely for these candidates.

use crate::external::provider_html::ProviderHtmlClient;
use crate::model::CandidateTitle;
use crate::search::provider::{ContentPage, ProviderSearch, RawLink};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;

pub struct CachedHashProvider {
  http: ProviderHtmlClient,
  base_url: String,
  tag: String,
  /// `direct_url` -> `size_bytes`, populated by `search()` so `load_content()` can carry the
  /// indexer's reported size through to `StreamDescriptor` without a second round-trip.
  sizes: DashMap<String, i64>,
}

impl CachedHashProvider {
  pub fn new(http: ProviderHtmlClient, base_url: String, tag: String) -> Self {
    Self { http, base_url, tag, sizes: DashMap::new() }
  }
}

#[derive(Deserialize)]
struct IndexerHit {
  title: String,
  direct_url: String,
  #[serde(default)]
  year: Option<i32>,
  #[serde(default)]
  size_bytes: Option<i64>,
}

#[async_trait]
impl ProviderSearch for CachedHashProvider {
  fn tag(&self) -> &str {
    &self.tag
  }

  fn needs_resolution(&self) -> bool {
    false
  }

  async fn search(&self, query: &str) -> anyhow::Result<Vec<CandidateTitle>> {
    let url = format!("{}/search?q={}", self.base_url.trim_end_matches('/'), urlencoding::encode(query));
    let body = self.http.get_text(&url).await?;
    let hits: Vec<IndexerHit> = serde_json::from_str(&body)?;
    Ok(
      hits
        .into_iter()
        .map(|h| {
          if let Some(size) = h.size_bytes {
            self.sizes.insert(h.direct_url.clone(), size);
          }
          CandidateTitle {
            title: h.title,
            url: h.direct_url,
            year: h.year,
            poster: None,
            source_tag: self.tag.clone(),
          }
        })
        .collect(),
    )
  }

  async fn load_content(&self, url: &str) -> anyhow::Result<ContentPage> {
    // A cached-hash hit's `url` is already the final direct URL — the "content page" is the
    // single resolved link itself, with `needs_resolution = false` applied by the caller.
    let size_bytes = self.sizes.get(url).map(|v| *v);
    Ok(ContentPage {
      raw_links: vec![RawLink { url: url.to_string(), label: String::new(), season: None, episode: None, size_bytes }],
    })
  }
}
