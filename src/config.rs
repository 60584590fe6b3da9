use std::time::Duration;

/// Process configuration, loaded once at startup from environment variables (spec §6, §9).
/// Mirrors the teacher's `SettingsSnapshot` in spirit (a flat, cloneable config struct handed
/// to every component that needs it) but is sourced from the environment rather than sqlite,
/// since this crate has no settings UI to persist against.
#[derive(Debug, Clone)]
pub struct Config {
  pub bind_addr: String,
  pub catalog_base_url: String,
  pub downloader_base_url: String,
  pub file_server_base_url: String,
  pub file_server_api_key: String,
  pub admin_password: Option<String>,
  pub log_dir: Option<String>,
  pub cache_db_path: Option<String>,
  pub provider_html_base_url: String,
  pub provider_cached_hash_base_url: String,
  pub storage_root: String,

  pub disable_cache: bool,
  pub request_timeout: Duration,
  pub request_max_retries: u32,
  pub request_retry_delay: Duration,
  pub scraper_timeout: Duration,
  pub validation_timeout: Duration,
  pub disable_url_validation: bool,
  pub disable_seek_validation: bool,
  pub domain_cache_ttl_ms: u64,
  pub max_4khdhub_links: usize,
  pub batch_size: usize,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Ok(Self {
      bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
      catalog_base_url: env_or("CATALOG_BASE_URL", "https://v3-cinemeta.strem.io"),
      downloader_base_url: env_or("DOWNLOADER_BASE_URL", "http://127.0.0.1:8090"),
      file_server_base_url: env_or("FILE_SERVER_BASE_URL", "http://127.0.0.1:8091"),
      file_server_api_key: std::env::var("USENET_FILE_SERVER_API_KEY").unwrap_or_default(),
      admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
      log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
      cache_db_path: std::env::var("CACHE_DB_PATH").ok().filter(|s| !s.is_empty()),
      provider_html_base_url: env_or("PROVIDER_HTML_BASE_URL", "https://4khdhub.example"),
      provider_cached_hash_base_url: env_or("PROVIDER_CACHED_HASH_BASE_URL", "https://offcloud-index.example"),
      storage_root: env_or("STORAGE_ROOT", "/data/downloads"),

      disable_cache: env_flag("DISABLE_CACHE"),
      request_timeout: Duration::from_millis(env_u64("REQUEST_TIMEOUT", 15_000)),
      request_max_retries: env_u64("REQUEST_MAX_RETRIES", 2) as u32,
      request_retry_delay: Duration::from_millis(env_u64("REQUEST_RETRY_DELAY", 500)),
      scraper_timeout: Duration::from_millis(env_u64("SCRAPER_TIMEOUT", 5_000)),
      validation_timeout: Duration::from_millis(env_u64("VALIDATION_TIMEOUT", 8_000)),
      disable_url_validation: env_flag("DISABLE_URL_VALIDATION"),
      disable_seek_validation: env_flag("DISABLE_SEEK_VALIDATION"),
      domain_cache_ttl_ms: env_u64("DOMAIN_CACHE_TTL_MS", 6 * 60 * 60 * 1000),
      max_4khdhub_links: env_u64("MAX_4KHDHUB_LINKS", 8) as usize,
      batch_size: env_u64("BATCH_SIZE", 5) as usize,
    })
  }
}

fn env_or(key: &str, default: &str) -> String {
  std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
  std::env::var(key)
    .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
    .unwrap_or(false)
}

fn env_u64(key: &str, default: u64) -> u64 {
  std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
