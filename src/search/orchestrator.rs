//! SearchOrchestrator (spec §4.4): fans a `SearchRequest` out across every `ProviderSearch`
//! implementation, merges, ranks, and returns deduplicated `StreamDescriptor`s. Grounded on the
//! teacher's `engine/mod.rs` command-dispatch/fan-out shape (`DownloadEngine` fans commands out
//! to per-job tasks the same way this fans queries out to per-(query,provider) tasks), using
//! `futures::future::join_all` the way `engine/job.rs` uses `futures_util::StreamExt`.

use crate::external::catalog::CatalogClient;
use crate::model::{CandidateTitle, MediaType, Quality, SearchRequest, StreamDescriptor};
use crate::resolve::stream_catalog::{detect_languages, detect_quality, host_priority_rank, StreamCatalog};
use crate::search::provider::ProviderSearch;
use crate::search::title_matcher;
use crate::validate::RangeValidator;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;

const SUSPICIOUS_SUBSTRINGS: &[&str] = &["amp-redirect", "/amp/", "go.redirect.", "track.click"];
const BLOCKED_HOSTS: &[&str] = &["known-malware-host.example"];
const YEAR_GATE_TOP_K: usize = 5;

pub struct SearchOrchestrator {
  catalog: Arc<dyn CatalogClient>,
  providers: Vec<Arc<dyn ProviderSearch>>,
  stream_catalog: Arc<StreamCatalog>,
  validator: Arc<RangeValidator>,
}

impl SearchOrchestrator {
  pub fn new(
    catalog: Arc<dyn CatalogClient>,
    providers: Vec<Arc<dyn ProviderSearch>>,
    stream_catalog: Arc<StreamCatalog>,
    validator: Arc<RangeValidator>,
  ) -> Self {
    Self { catalog, providers, stream_catalog, validator }
  }

  pub async fn search(&self, req: &SearchRequest) -> Vec<StreamDescriptor> {
    // 1. Metadata lookup.
    let Some(meta) = self.catalog.lookup(req.media_type, &req.catalog_id).await else {
      return Vec::new();
    };
    let canonical_name = meta.name.clone();
    let meta_year: Option<i32> = meta.year.as_deref().and_then(|y| y.parse().ok());

    // 2. Query generation, deduplicated on normalized-lowercase.
    let queries = build_queries(&canonical_name, meta_year, meta.original_name.as_deref());

    // 3. Parallel fan-out: one search per (query, provider).
    let tasks = queries.iter().flat_map(|q| {
      self.providers.iter().map(move |p| {
        let p = p.clone();
        let q = q.clone();
        async move { (q, p.clone(), p.search(&q).await) }
      })
    });
    let results: Vec<(String, Arc<dyn ProviderSearch>, anyhow::Result<Vec<CandidateTitle>>)> =
      futures::future::join_all(tasks).await;

    // 4. Best-title selection, across all query-result sets.
    let mut all_candidates: Vec<(Arc<dyn ProviderSearch>, CandidateTitle, f64)> = Vec::new();
    for (_, provider, result) in results {
      let Ok(candidates) = result else { continue };
      for scored in title_matcher::rank(candidates, &canonical_name) {
        all_candidates.push((provider.clone(), scored.candidate, scored.score));
      }
    }
    if all_candidates.is_empty() {
      return Vec::new();
    }
    all_candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let raw_links = match req.media_type {
      MediaType::Movie => self.resolve_movie_page(&all_candidates, meta_year).await,
      MediaType::Series => self.resolve_series_page(&all_candidates, req.season, req.episode).await,
    };
    let Some((provider, links)) = raw_links else { return Vec::new() };

    // 7. Link resolution.
    let tag = provider.tag().to_string();
    let resolved = self.resolve_links(&provider, links).await;

    // 8. Post-filtering.
    let filtered = post_filter(resolved, req);

    // 9. Validation.
    let validated = self.validate_links(filtered).await;

    // 10. Ranking: quality bucket, then size within bucket.
    rank_descriptors(validated, &tag)
  }

  /// Step 5: load the chosen page; year-gate against metadata, trying the next top-k
  /// candidates on mismatch.
  async fn resolve_movie_page(
    &self,
    ranked: &[(Arc<dyn ProviderSearch>, CandidateTitle, f64)],
    meta_year: Option<i32>,
  ) -> Option<(Arc<dyn ProviderSearch>, Vec<crate::search::provider::RawLink>)> {
    for (provider, candidate, _score) in ranked.iter().take(YEAR_GATE_TOP_K) {
      let Ok(page) = provider.load_content(&candidate.url).await else { continue };
      if let (Some(meta_y), Some(cand_y)) = (meta_year, candidate.year) {
        if (meta_y - cand_y).abs() > 1 {
          continue;
        }
      }
      return Some((provider.clone(), page.raw_links));
    }
    None
  }

  /// Step 6: load the chosen (top-scoring) page and locate the episode entry by exact
  /// season×episode match.
  async fn resolve_series_page(
    &self,
    ranked: &[(Arc<dyn ProviderSearch>, CandidateTitle, f64)],
    season: Option<u32>,
    episode: Option<u32>,
  ) -> Option<(Arc<dyn ProviderSearch>, Vec<crate::search::provider::RawLink>)> {
    let (provider, candidate, _) = ranked.first()?;
    let page = provider.load_content(&candidate.url).await.ok()?;
    let links: Vec<_> = page
      .raw_links
      .into_iter()
      .filter(|l| l.season == season && l.episode == episode)
      .collect();
    if links.is_empty() {
      None
    } else {
      Some((provider.clone(), links))
    }
  }

  async fn resolve_links(
    &self,
    provider: &Arc<dyn ProviderSearch>,
    links: Vec<crate::search::provider::RawLink>,
  ) -> Vec<(String, String, Option<i64>)> {
    if !provider.needs_resolution() {
      return links.into_iter().map(|l| (l.label, l.url, l.size_bytes)).collect();
    }
    let resolved = futures::future::join_all(links.iter().map(|l| async {
      let resolved_url = self.stream_catalog.resolve(&l.url).await.ok();
      (l.label.clone(), resolved_url, l.size_bytes)
    }))
    .await;
    resolved.into_iter().filter_map(|(label, url, size)| url.map(|u| (label, u, size))).collect()
  }

  /// Step 9: group by host, trusted bypass, remaining seek-validated in chunks of `batch_size`.
  async fn validate_links(&self, links: Vec<(String, String, Option<i64>)>) -> Vec<(String, String, Option<String>, Option<i64>)> {
    let mut trusted = Vec::new();
    let mut to_probe = Vec::new();
    for (label, url, size) in links {
      if self.validator.is_trusted(&url) {
        trusted.push((label, url, None, size));
      } else {
        to_probe.push((label, url, size));
      }
    }

    let urls: Vec<String> = to_probe.iter().map(|(_, u, _)| u.clone()).collect();
    let probes = self.validator.validate_seekable_batch(&urls).await;

    let mut out = trusted;
    for ((label, url, size), probe) in to_probe.into_iter().zip(probes) {
      if probe.seekable {
        out.push((label, url, probe.filename, size));
      }
    }
    out
  }
}

fn build_queries(canonical_name: &str, year: Option<i32>, original_name: Option<&str>) -> Vec<String> {
  let mut candidates = vec![canonical_name.to_string()];
  if let Some(y) = year {
    let suffix = format!(" ({y})");
    if let Some(stripped) = canonical_name.strip_suffix(&suffix) {
      candidates.push(stripped.to_string());
    }
    let year_str = y.to_string();
    candidates.push(canonical_name.replace(&year_str, "").trim().to_string());
  }
  if let Some(orig) = original_name {
    candidates.push(orig.to_string());
  }

  let punctuation_free: Vec<String> = candidates
    .iter()
    .map(|s| s.chars().filter(|c| c.is_alphanumeric() || c.is_whitespace()).collect::<String>())
    .collect();
  candidates.extend(punctuation_free);

  let mut seen = BTreeSet::new();
  let mut out = Vec::new();
  for c in candidates {
    let key = title_matcher::normalize(&c);
    if key.is_empty() || !seen.insert(key) {
      continue;
    }
    out.push(c);
  }
  out
}

fn season_episode_regex(season: u32, episode: u32) -> Regex {
  let pattern = format!(r"(?i)S0?{season}E0?{episode}\b");
  Regex::new(&pattern).unwrap_or_else(|_| Regex::new("^$").unwrap())
}

fn post_filter(links: Vec<(String, String, Option<i64>)>, req: &SearchRequest) -> Vec<(String, String, Option<i64>)> {
  let season_episode_re = match (req.season, req.episode) {
    (Some(s), Some(e)) => Some(season_episode_regex(s, e)),
    _ => None,
  };

  let mut seen_urls = BTreeSet::new();
  links
    .into_iter()
    .filter(|(_, url, _)| !SUSPICIOUS_SUBSTRINGS.iter().any(|s| url.contains(s)))
    .filter(|(_, url, _)| !url.to_ascii_lowercase().ends_with(".zip"))
    .filter(|(_, url, _)| {
      crate::transport::hostname_of(url)
        .map(|h| !BLOCKED_HOSTS.iter().any(|b| h == *b || h.ends_with(&format!(".{b}"))))
        .unwrap_or(true)
    })
    .filter(|(_, url, _)| seen_urls.insert(url.clone()))
    .filter(|(label, url, _)| match &season_episode_re {
      Some(re) => re.is_match(label) || re.is_match(url),
      None => true,
    })
    .collect()
}

fn rank_descriptors(links: Vec<(String, String, Option<String>, Option<i64>)>, source_tag: &str) -> Vec<StreamDescriptor> {
  let mut descriptors: Vec<StreamDescriptor> = links
    .into_iter()
    .map(|(label, url, filename, size_bytes)| {
      let display_title = filename.clone().unwrap_or_else(|| label.clone());
      let quality = detect_quality(&display_title);
      let languages = detect_languages(&display_title, None);
      StreamDescriptor {
        display_name: display_title.clone(),
        title: display_title,
        url: url.clone(),
        quality,
        size_bytes,
        languages,
        source_tag: source_tag.to_string(),
        needs_resolution: false,
        binge_group: format!("{quality:?}"),
      }
    })
    .collect();

  descriptors.sort_by(|a, b| {
    a.quality
      .rank()
      .cmp(&b.quality.rank())
      .then_with(|| b.size_bytes.unwrap_or(0).cmp(&a.size_bytes.unwrap_or(0)))
  });
  // Host priority is a secondary signal surfaced for client-side tie-breaking, not a sort key
  // here — spec §4.10's ranking step is quality-then-size only; host priority (§4.5) governs
  // *which* resolution the client picks among equally-ranked descriptors, not gateway order.
  let _ = host_priority_rank;
  descriptors
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn build_queries_dedupes_normalized() {
    let queries = build_queries("The Matrix (1999)", Some(1999), Some("The Matrix"));
    let normalized: BTreeSet<String> = queries.iter().map(|q| title_matcher::normalize(q)).collect();
    assert_eq!(normalized.len(), queries.len());
  }

  #[test]
  fn season_episode_regex_matches_variants() {
    let re = season_episode_regex(1, 3);
    assert!(re.is_match("Show S01E03 1080p"));
    assert!(re.is_match("Show S1E3 1080p"));
    assert!(!re.is_match("Show S01E04 1080p"));
  }

  #[test]
  fn post_filter_drops_zip_and_blocked_hosts() {
    let req = SearchRequest {
      catalog_id: "tt1".into(),
      media_type: MediaType::Movie,
      season: None,
      episode: None,
      user_options: serde_json::Value::Null,
    };
    let links = vec![
      ("a".into(), "https://good.example/file.mkv".into(), None),
      ("b".into(), "https://good.example/archive.zip".into(), None),
      ("c".into(), "https://known-malware-host.example/file.mkv".into(), None),
    ];
    let out = post_filter(links, &req);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].1, "https://good.example/file.mkv");
  }

  #[test]
  fn rank_descriptors_orders_by_quality_then_size() {
    let links = vec![
      ("a".into(), "https://x/720p.mkv".into(), None, None),
      ("b".into(), "https://x/2160p.mkv".into(), None, None),
    ];
    let ranked = rank_descriptors(links, "test");
    assert_eq!(ranked[0].quality, Quality::Q2160p);
    assert_eq!(ranked[1].quality, Quality::Q720p);
  }

  #[test]
  fn rank_descriptors_breaks_quality_tie_by_size() {
    let links = vec![
      ("small".into(), "https://x/a.2160p.mkv".into(), None, Some(500)),
      ("large".into(), "https://x/b.2160p.mkv".into(), None, Some(5_000)),
    ];
    let ranked = rank_descriptors(links, "test");
    assert_eq!(ranked[0].url, "https://x/b.2160p.mkv");
    assert_eq!(ranked[1].url, "https://x/a.2160p.mkv");
  }
}
