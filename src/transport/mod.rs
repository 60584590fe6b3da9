//! Shared HTTP client + host-pattern matching. Trimmed from the teacher's `transport/mod.rs`:
//! the proxy/header/mirror *rule* plumbing was sqlite-backed UI configuration specific to the
//! download manager and has no counterpart here, but the client-builder conventions and the
//! wildcard host-pattern matcher (`PatternRule`/`best_pattern_match`) are exactly what
//! `validate::range_validator` needs for trusted/capricious-host matching and what
//! `resolve::stream_catalog` needs for host-priority ranking, so both are kept.

use anyhow::Context;
use std::time::Duration;

pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
  reqwest::Client::builder()
    .user_agent("streamgate/0.1")
    .redirect(reqwest::redirect::Policy::limited(10))
    .connect_timeout(Duration::from_secs(15))
    .timeout(timeout)
    .build()
    .context("failed to build reqwest client")
}

/// Host-pattern specificity: exact hosts outrank wildcard suffixes; among wildcards, longer
/// suffixes outrank shorter ones. Ported unchanged from the teacher's `pattern_specificity`.
pub fn pattern_specificity(pattern: &str) -> (u8, usize) {
  if !pattern.contains('*') {
    (2, pattern.len())
  } else {
    let suffix = pattern.trim_start_matches("*.").trim_start_matches('*');
    (1, suffix.len())
  }
}

pub fn pattern_matches(pattern: &str, host: &str) -> bool {
  let p = pattern.trim().to_ascii_lowercase();
  let h = host.trim().to_ascii_lowercase();
  if p.is_empty() {
    return false;
  }
  if !p.contains('*') {
    return p == h;
  }
  if let Some(suffix) = p.strip_prefix("*.") {
    return h == suffix || h.ends_with(&format!(".{suffix}"));
  }
  p == "*"
}

pub fn best_pattern_match<'a>(patterns: impl Iterator<Item = &'a str>, host: &str) -> Option<&'a str> {
  let mut best: Option<(&str, (u8, usize))> = None;
  for p in patterns {
    if !pattern_matches(p, host) {
      continue;
    }
    let spec = pattern_specificity(p);
    if best.map(|(_, s)| spec > s).unwrap_or(true) {
      best = Some((p, spec));
    }
  }
  best.map(|(p, _)| p)
}

pub fn hostname_of(url: &str) -> Option<String> {
  url::Url::parse(url).ok().and_then(|u| u.host_str().map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wildcard_suffix_beats_nothing() {
    assert!(pattern_matches("*.pixeldrain.com", "cdn.pixeldrain.com"));
    assert!(pattern_matches("*.pixeldrain.com", "pixeldrain.com"));
    assert!(!pattern_matches("*.pixeldrain.com", "pixeldrain.net"));
  }

  #[test]
  fn exact_beats_wildcard_specificity() {
    let exact = pattern_specificity("cdn.pixeldrain.com");
    let wildcard = pattern_specificity("*.pixeldrain.com");
    assert!(exact > wildcard);
  }

  #[test]
  fn best_pattern_match_picks_most_specific() {
    let patterns = ["*.com", "*.pixeldrain.com", "cdn.pixeldrain.com"];
    let best = best_pattern_match(patterns.into_iter(), "cdn.pixeldrain.com");
    assert_eq!(best, Some("cdn.pixeldrain.com"));
  }
}
