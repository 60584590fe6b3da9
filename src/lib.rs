pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod external;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod resolve;
pub mod search;
pub mod transport;
pub mod usenet;
pub mod util;
pub mod validate;

use crate::cache::ResolvedUrlCache;
use crate::config::Config;
use crate::external::catalog::HttpCatalogClient;
use crate::external::downloader::HttpDownloader;
use crate::external::file_server::HttpFileServerClient;
use crate::external::provider_html::ProviderHtmlClient;
use crate::persistence::CacheStore;
use crate::resolve::StreamCatalog;
use crate::search::provider::ProviderSearch;
use crate::search::providers::{CachedHashProvider, HtmlProvider};
use crate::search::SearchOrchestrator;
use crate::usenet::{RangeStreamer, StorageManager, UsenetController};
use crate::validate::RangeValidator;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Trusted-host list for `RangeValidator`/`StreamCatalog` (spec §4.2/§4.5), the same
/// suffix-wildcard form as `resolve::stream_catalog::HOST_PRIORITY`.
const TRUSTED_HOSTS: &[&str] = &["*.pixeldrain.com", "*.pixeldrain.net", "*.r2.dev", "*.workers.dev"];

/// Everything the HTTP layer and background loops share, built once at startup. Structurally
/// the teacher's `tauri::State<AppState>` without the Tauri-specific `paths`/`events` fields —
/// there's no window to notify, so `UsenetController`'s own background loops stand in for the
/// teacher's `events::EventHub` broadcasts.
pub struct AppState {
  pub config: Config,
  pub orchestrator: Arc<SearchOrchestrator>,
  pub controller: Arc<UsenetController>,
  pub range_streamer: Arc<RangeStreamer>,
  pub cancel: CancellationToken,
}

/// Wires every component per spec §2's module list. Follows the teacher's `setup` closure in
/// shape (open persistence, build shared state, start background loops) minus anything
/// Tauri-specific — there is no window, tray, or app-data dir here, just a process.
pub async fn build_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
  let cancel = CancellationToken::new();

  let cache_store = match (&config.cache_db_path, config.disable_cache) {
    (Some(path), false) => Some(Arc::new(CacheStore::open(PathBuf::from(path))?)),
    _ => None,
  };
  let resolved_cache = Arc::new(ResolvedUrlCache::new(cache_store));
  if let Ok(warmed) = resolved_cache.warm_from_store() {
    if warmed > 0 {
      tracing::info!(warmed, "warmed resolved-url cache from disk");
    }
  }
  resolved_cache.clone().spawn_purge_loop(cancel.clone());

  let provider_http = ProviderHtmlClient::new(config.scraper_timeout, config.request_max_retries, config.request_retry_delay)?;
  let stream_catalog = Arc::new(StreamCatalog::new(
    provider_http.clone(),
    resolved_cache,
    std::time::Duration::from_millis(config.domain_cache_ttl_ms),
  ));

  let catalog_client = Arc::new(HttpCatalogClient::new(config.catalog_base_url.clone(), config.request_timeout)?);

  let providers: Vec<Arc<dyn ProviderSearch>> = vec![
    Arc::new(HtmlProvider::new(
      provider_http.clone(),
      config.provider_html_base_url.clone(),
      "4khdhub".to_string(),
      config.max_4khdhub_links,
    )),
    Arc::new(CachedHashProvider::new(provider_http.clone(), config.provider_cached_hash_base_url.clone(), "offcloud".to_string())),
  ];

  let validator = Arc::new(RangeValidator::new(
    config.validation_timeout,
    TRUSTED_HOSTS.iter().map(|s| s.to_string()).collect(),
    config.disable_url_validation,
    config.disable_seek_validation,
    config.batch_size,
  )?);

  let orchestrator = Arc::new(SearchOrchestrator::new(catalog_client, providers, stream_catalog, validator));

  let downloader = Arc::new(HttpDownloader::new(config.downloader_base_url.clone(), config.request_timeout)?);
  let file_server = Arc::new(HttpFileServerClient::new(
    config.file_server_base_url.clone(),
    config.file_server_api_key.clone(),
    config.request_timeout,
  )?);
  let storage = Arc::new(StorageManager::new(downloader.clone(), file_server.clone()));
  let controller = Arc::new(UsenetController::new(downloader, file_server, config.file_server_base_url.clone(), storage));

  let range_streamer = Arc::new(RangeStreamer::new(controller.clone(), PathBuf::from(&config.storage_root)));

  controller.spawn_background_loops(cancel.clone());

  Ok(Arc::new(AppState { config, orchestrator, controller, range_streamer, cancel }))
}

pub fn router(state: Arc<AppState>) -> axum::Router {
  api::routes(state).layer(tower_http::trace::TraceLayer::new_for_http())
}
