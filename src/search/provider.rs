//! `ProviderSearch` (spec §2, §4.4): the polymorphic interface the orchestrator fans queries
//! out across. Grounded on the teacher's `transport::PatternRule` trait — a narrow, async-free
//! trait implemented by several small adapter types and consumed generically — generalized
//! here to an `async_trait` since provider search is inherently a network call.

use crate::model::CandidateTitle;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ContentPage {
  pub raw_links: Vec<RawLink>,
}

#[derive(Debug, Clone)]
pub struct RawLink {
  pub url: String,
  pub label: String,
  pub season: Option<u32>,
  pub episode: Option<u32>,
  pub size_bytes: Option<i64>,
}

/// One upstream: an HTML-scraping provider or a cached-hash debrid indexer (spec §2). The
/// core consumes every implementation through this interface only.
#[async_trait]
pub trait ProviderSearch: Send + Sync {
  /// Tag identifying this provider in `CandidateTitle::source_tag`/`StreamDescriptor::source_tag`.
  fn tag(&self) -> &str;

  /// Whether raw links from this provider still need `resolve::stream_catalog`'s decode step.
  /// Cached-hash debrid indexers already hand back a direct URL (spec §2), so they return
  /// `false` and the orchestrator skips resolution for their links entirely.
  fn needs_resolution(&self) -> bool {
    true
  }

  /// `GET {providerBase}/?s={query}` (spec §6): catalog search, returning card hits.
  async fn search(&self, query: &str) -> anyhow::Result<Vec<CandidateTitle>>;

  /// Loads a chosen result's detail page and returns its raw links (spec §6's content contract).
  async fn load_content(&self, url: &str) -> anyhow::Result<ContentPage>;
}
