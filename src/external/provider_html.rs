//! Generic HTML GET used by provider adapters (spec §6's "Provider search"/"Provider content"
//! contracts). Kept as a thin, shared fetcher so each `ProviderSearch` implementation and
//! `resolve::stream_catalog`'s host-specific extractors don't each build their own client —
//! mirrors the teacher's `Transport::client_for` single-shared-client-per-purpose pattern.

use std::time::Duration;

#[derive(Clone)]
pub struct ProviderHtmlClient {
  client: reqwest::Client,
  max_retries: u32,
  retry_delay: Duration,
}

impl ProviderHtmlClient {
  pub fn new(timeout: Duration, max_retries: u32, retry_delay: Duration) -> anyhow::Result<Self> {
    Ok(Self { client: crate::transport::build_client(timeout)?, max_retries, retry_delay })
  }

  /// GETs `url`, retrying transport-level failures (timeouts, connection resets — not HTTP
  /// error statuses) up to `max_retries` times with `retry_delay` between attempts (spec §4.4's
  /// per-provider retry knob).
  pub async fn get_text(&self, url: &str) -> anyhow::Result<String> {
    let mut attempt = 0;
    loop {
      match self.client.get(url).send().await {
        Ok(resp) => return Ok(resp.text().await?),
        Err(e) if attempt < self.max_retries => {
          attempt += 1;
          tracing::debug!(url, attempt, error = %e, "retrying provider fetch");
          tokio::time::sleep(self.retry_delay).await;
        }
        Err(e) => return Err(e.into()),
      }
    }
  }

  /// Follows redirects manually up to `max_hops`, returning the final location URL without
  /// fetching its body — used by the `10Gbps`/`pixel.hubcdn` extractors (spec §4.5) which
  /// need the chain of `Location` headers rather than rendered content.
  pub async fn follow_redirect_chain(&self, start_url: &str, max_hops: usize) -> anyhow::Result<String> {
    let no_redirect_client = reqwest::Client::builder()
      .redirect(reqwest::redirect::Policy::none())
      .build()?;
    let mut current = start_url.to_string();
    for _ in 0..max_hops {
      let resp = no_redirect_client.get(&current).send().await?;
      if resp.status().is_redirection() {
        if let Some(loc) = resp.headers().get("location").and_then(|v| v.to_str().ok()) {
          current = resolve_relative(&current, loc);
          continue;
        }
      }
      return Ok(current);
    }
    Ok(current)
  }

  /// Single redirect hop with `Referer` set to `referer`, returning the `Location` target
  /// without fetching its body — `BuzzServer`'s hop (spec §4.5) needs the referer honored or
  /// the target host rejects the request.
  pub async fn follow_one_hop_with_referer(&self, start_url: &str, referer: &str) -> anyhow::Result<String> {
    let no_redirect_client = reqwest::Client::builder()
      .redirect(reqwest::redirect::Policy::none())
      .build()?;
    let resp = no_redirect_client.get(start_url).header("Referer", referer).send().await?;
    if resp.status().is_redirection() {
      if let Some(loc) = resp.headers().get("location").and_then(|v| v.to_str().ok()) {
        return Ok(resolve_relative(start_url, loc));
      }
    }
    Ok(start_url.to_string())
  }

  pub fn client(&self) -> &reqwest::Client {
    &self.client
  }
}

fn resolve_relative(base: &str, location: &str) -> String {
  match url::Url::parse(base).and_then(|b| b.join(location)) {
    Ok(joined) => joined.to_string(),
    Err(_) => location.to_string(),
  }
}
