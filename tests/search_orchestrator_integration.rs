//! End-to-end integration tests against `SearchOrchestrator`, mocking the one HTTP boundary
//! spec.md §8's scenarios actually require (the catalog metadata lookup) with `wiremock` and a
//! fake in-process `ProviderSearch`, per SPEC_FULL §8's note that HTTP-boundary integration
//! tests belong in `tests/` using `wiremock` — none of the teacher's own tests exercise a live
//! HTTP surface, so this is new rather than adapted.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use streamgate::cache::ResolvedUrlCache;
use streamgate::external::catalog::HttpCatalogClient;
use streamgate::external::provider_html::ProviderHtmlClient;
use streamgate::model::{CandidateTitle, MediaType, Quality, SearchRequest};
use streamgate::resolve::StreamCatalog;
use streamgate::search::provider::{ContentPage, ProviderSearch, RawLink};
use streamgate::search::SearchOrchestrator;
use streamgate::validate::RangeValidator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FakeProvider {
  tag: String,
  candidates: Vec<CandidateTitle>,
  links: Vec<RawLink>,
}

#[async_trait]
impl ProviderSearch for FakeProvider {
  fn tag(&self) -> &str {
    &self.tag
  }

  async fn search(&self, _query: &str) -> anyhow::Result<Vec<CandidateTitle>> {
    Ok(self.candidates.clone())
  }

  async fn load_content(&self, _url: &str) -> anyhow::Result<ContentPage> {
    Ok(ContentPage { raw_links: self.links.clone() })
  }
}

fn orchestrator(catalog_base: String, providers: Vec<Arc<dyn ProviderSearch>>) -> SearchOrchestrator {
  let catalog = Arc::new(HttpCatalogClient::new(catalog_base, Duration::from_secs(5)).unwrap());
  let provider_http = ProviderHtmlClient::new(Duration::from_secs(5), 0, Duration::from_millis(0)).unwrap();
  let resolved_cache = Arc::new(ResolvedUrlCache::new(None));
  let stream_catalog = Arc::new(StreamCatalog::new(provider_http, resolved_cache, Duration::from_secs(60)));
  let validator = Arc::new(RangeValidator::new(Duration::from_secs(1), vec![], true, true, 5).unwrap());
  SearchOrchestrator::new(catalog, providers, stream_catalog, validator)
}

#[tokio::test]
async fn movie_happy_path_returns_ranked_direct_video_descriptor() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/meta/movie/tt0111161.json"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
      "meta": { "name": "The Shawshank Redemption", "year": "1994" }
    })))
    .mount(&server)
    .await;

  let provider: Arc<dyn ProviderSearch> = Arc::new(FakeProvider {
    tag: "fake".to_string(),
    candidates: vec![CandidateTitle {
      title: "The Shawshank Redemption (1994)".to_string(),
      url: format!("{}/page", server.uri()),
      year: Some(1994),
      poster: None,
      source_tag: "fake".to_string(),
    }],
    links: vec![RawLink {
      url: "https://cdn.example/shawshank.1080p.mkv".to_string(),
      label: "Shawshank.Redemption.1080p".to_string(),
      season: None,
      episode: None,
      size_bytes: None,
    }],
  });

  let orchestrator = orchestrator(server.uri(), vec![provider]);
  let req = SearchRequest {
    catalog_id: "tt0111161".to_string(),
    media_type: MediaType::Movie,
    season: None,
    episode: None,
    user_options: serde_json::Value::Null,
  };

  let descriptors = orchestrator.search(&req).await;
  assert_eq!(descriptors.len(), 1);
  assert_eq!(descriptors[0].quality, Quality::Q1080p);
  assert_eq!(descriptors[0].url, "https://cdn.example/shawshank.1080p.mkv");
}

#[tokio::test]
async fn missing_metadata_returns_empty_result_set() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/meta/movie/unknown.json"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  let orchestrator = orchestrator(server.uri(), vec![]);
  let req = SearchRequest {
    catalog_id: "unknown".to_string(),
    media_type: MediaType::Movie,
    season: None,
    episode: None,
    user_options: serde_json::Value::Null,
  };

  let descriptors = orchestrator.search(&req).await;
  assert!(descriptors.is_empty());
}

#[tokio::test]
async fn series_episode_disambiguation_filters_by_season_episode() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/meta/series/tt0903747.json"))
    .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
      "meta": { "name": "Breaking Bad", "year": "2008" }
    })))
    .mount(&server)
    .await;

  let provider: Arc<dyn ProviderSearch> = Arc::new(FakeProvider {
    tag: "fake".to_string(),
    candidates: vec![CandidateTitle {
      title: "Breaking Bad".to_string(),
      url: format!("{}/page", server.uri()),
      year: Some(2008),
      poster: None,
      source_tag: "fake".to_string(),
    }],
    links: vec![
      RawLink {
        url: "https://cdn.example/s01e03.720p.mkv".to_string(),
        label: "S01E03.720p".to_string(),
        season: Some(1),
        episode: Some(3),
        size_bytes: None,
      },
      RawLink {
        url: "https://cdn.example/s01e04.720p.mkv".to_string(),
        label: "S01E04.720p".to_string(),
        season: Some(1),
        episode: Some(4),
        size_bytes: None,
      },
    ],
  });

  let orchestrator = orchestrator(server.uri(), vec![provider]);
  let req = SearchRequest {
    catalog_id: "tt0903747".to_string(),
    media_type: MediaType::Series,
    season: Some(1),
    episode: Some(3),
    user_options: serde_json::Value::Null,
  };

  let descriptors = orchestrator.search(&req).await;
  assert_eq!(descriptors.len(), 1);
  assert_eq!(descriptors[0].url, "https://cdn.example/s01e03.720p.mkv");
}
