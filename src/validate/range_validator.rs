//! RangeValidator (spec §4.2). HEAD-probe classification, grounded on the teacher's
//! `engine/job.rs::attempt_download_once`, which HEAD-probes a candidate URL for
//! `Accept-Ranges`/`Content-Length`/`ETag` before committing to a download. The trusted-host
//! matching reuses `transport::{pattern_matches, best_pattern_match}`.
//!
//! spec §4.2's "special rule for known-capricious hosts" (admit only on 206, or 200+Accept-Ranges)
//! is word-for-word `validateSeekable`'s general admission rule below — there's no host-specific
//! carve-out left to implement once the general rule is that strict, so no separate
//! capricious-host list is kept.

use crate::transport;
use crate::util::naming;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
  Valid,
  Unreachable,
}

#[derive(Debug, Clone)]
pub struct SeekProbe {
  pub seekable: bool,
  pub filename: Option<String>,
}

pub struct RangeValidator {
  client: reqwest::Client,
  timeout: Duration,
  trusted_hosts: Vec<String>,
  disable_url_validation: bool,
  disable_seek_validation: bool,
  batch_size: usize,
}

impl RangeValidator {
  pub fn new(
    timeout: Duration,
    trusted_hosts: Vec<String>,
    disable_url_validation: bool,
    disable_seek_validation: bool,
    batch_size: usize,
  ) -> anyhow::Result<Self> {
    Ok(Self {
      client: transport::build_client(timeout)?,
      timeout,
      trusted_hosts,
      disable_url_validation,
      disable_seek_validation,
      batch_size: batch_size.max(1),
    })
  }

  pub fn is_trusted(&self, url: &str) -> bool {
    let Some(host) = transport::hostname_of(url) else { return false };
    transport::best_pattern_match(self.trusted_hosts.iter().map(|s| s.as_str()), &host).is_some()
  }

  /// `validate(url)` (spec §4.2): HEAD probe, accept 2xx/3xx.
  pub async fn validate(&self, url: &str) -> ValidationOutcome {
    if self.disable_url_validation || self.is_trusted(url) {
      return ValidationOutcome::Valid;
    }
    match tokio::time::timeout(self.timeout, self.client.head(url).send()).await {
      Ok(Ok(resp)) if resp.status().is_success() || resp.status().is_redirection() => ValidationOutcome::Valid,
      _ => ValidationOutcome::Unreachable,
    }
  }

  /// `validateSeekable(url)` (spec §4.2): HEAD with `Range: bytes=0-0`. Gated by its own
  /// `disable_seek_validation` knob, distinct from `validate`'s `disable_url_validation` —
  /// an operator may want plain reachability checks without paying for the seek probe.
  pub async fn validate_seekable(&self, url: &str) -> SeekProbe {
    if self.disable_seek_validation || self.is_trusted(url) {
      return SeekProbe { seekable: true, filename: None };
    }

    let result = tokio::time::timeout(
      self.timeout,
      self.client.head(url).header("Range", "bytes=0-0").send(),
    )
    .await;

    let Ok(Ok(resp)) = result else {
      return SeekProbe { seekable: false, filename: None };
    };

    let status = resp.status();
    let accept_ranges_bytes = resp
      .headers()
      .get("accept-ranges")
      .and_then(|v| v.to_str().ok())
      .map(|v| v.eq_ignore_ascii_case("bytes"))
      .unwrap_or(false);

    let seekable = status == StatusCode::PARTIAL_CONTENT || (status == StatusCode::OK && accept_ranges_bytes);

    let filename = resp
      .headers()
      .get("content-disposition")
      .and_then(|v| v.to_str().ok())
      .and_then(naming::parse_content_disposition_filename);

    SeekProbe { seekable, filename }
  }

  /// Batch seek-validation in chunks of `batch_size` (spec §4.2's concurrency note, config-driven
  /// per §9), preserving input order in the returned vector.
  pub async fn validate_seekable_batch(&self, urls: &[String]) -> Vec<SeekProbe> {
    let mut out = Vec::with_capacity(urls.len());
    for chunk in urls.chunks(self.batch_size) {
      let probes = futures::future::join_all(chunk.iter().map(|u| self.validate_seekable(u))).await;
      out.extend(probes);
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn trusted_host_bypasses_probe() {
    let validator = RangeValidator::new(Duration::from_secs(1), vec!["*.pixeldrain.com".to_string()], false, false, 5).unwrap();
    let probe = validator.validate_seekable("https://cdn.pixeldrain.com/x").await;
    assert!(probe.seekable);
  }

  #[tokio::test]
  async fn disabled_flag_is_tautology() {
    let validator = RangeValidator::new(Duration::from_secs(1), vec![], true, true, 5).unwrap();
    assert_eq!(validator.validate("https://unreachable.invalid/x").await, ValidationOutcome::Valid);
  }

  #[tokio::test]
  async fn seek_validation_can_be_disabled_independently() {
    let validator = RangeValidator::new(Duration::from_secs(1), vec![], false, true, 5).unwrap();
    let probe = validator.validate_seekable("https://unreachable.invalid/x").await;
    assert!(probe.seekable);
  }

  #[test]
  fn batch_size_of_zero_is_clamped_to_one() {
    let validator = RangeValidator::new(Duration::from_secs(1), vec![], true, true, 0).unwrap();
    assert_eq!(validator.batch_size, 1);
  }
}
