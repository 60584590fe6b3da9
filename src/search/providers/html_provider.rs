//! HTML-scraping `ProviderSearch` implementation (spec §2's "4KHDHub/HTTP-stream provider"),
//! against the generic catalog+details contract in spec §6. Uses `scraper` for CSS-selector
//! parsing, same as `resolve::stream_catalog`'s host-specific extractors.

use crate::external::provider_html::ProviderHtmlClient;
use crate::model::CandidateTitle;
use crate::search::provider::{ContentPage, ProviderSearch, RawLink};
use async_trait::async_trait;
use scraper::{Html, Selector};

pub struct HtmlProvider {
  http: ProviderHtmlClient,
  base_url: String,
  tag: String,
  max_links: usize,
}

impl HtmlProvider {
  /// `max_links` caps how many raw links a single detail page contributes (0 = unlimited),
  /// per §9's per-provider link-count knob.
  pub fn new(http: ProviderHtmlClient, base_url: String, tag: String, max_links: usize) -> Self {
    Self { http, base_url, tag, max_links }
  }
}

#[async_trait]
impl ProviderSearch for HtmlProvider {
  fn tag(&self) -> &str {
    &self.tag
  }

  async fn search(&self, query: &str) -> anyhow::Result<Vec<CandidateTitle>> {
    let url = format!("{}/?s={}", self.base_url.trim_end_matches('/'), urlencoding::encode(query));
    let html = self.http.get_text(&url).await?;
    let doc = Html::parse_document(&html);
    let card_sel = Selector::parse("article.movie-card, div.result-item").unwrap();
    let title_sel = Selector::parse("a.title, h2 a").unwrap();
    let poster_sel = Selector::parse("img").unwrap();

    let mut out = Vec::new();
    for card in doc.select(&card_sel) {
      let Some(a) = card.select(&title_sel).next() else { continue };
      let Some(href) = a.value().attr("href") else { continue };
      let title_text = a.text().collect::<String>().trim().to_string();
      if title_text.is_empty() {
        continue;
      }
      let poster = card.select(&poster_sel).next().and_then(|img| img.value().attr("src")).map(str::to_string);
      let year = extract_year(&title_text);

      out.push(CandidateTitle {
        title: title_text,
        url: href.to_string(),
        year,
        poster,
        source_tag: self.tag.clone(),
      });
    }
    Ok(out)
  }

  async fn load_content(&self, url: &str) -> anyhow::Result<ContentPage> {
    let html = self.http.get_text(url).await?;
    let doc = Html::parse_document(&html);
    let link_sel = Selector::parse("a[href]").unwrap();
    let season_badge_sel = Selector::parse(".season-badge, span.season").unwrap();
    let episode_label_sel = Selector::parse(".episode-label, span.episode").unwrap();

    let season = doc
      .select(&season_badge_sel)
      .next()
      .map(|el| el.text().collect::<String>())
      .and_then(|t| parse_season_badge(&t));
    let episode = doc
      .select(&episode_label_sel)
      .next()
      .map(|el| el.text().collect::<String>())
      .and_then(|t| parse_episode_label(&t));

    let mut raw_links: Vec<RawLink> = doc
      .select(&link_sel)
      .filter_map(|el| {
        let href = el.value().attr("href")?.to_string();
        let label = el.text().collect::<String>();
        Some(RawLink { url: href, label, season, episode, size_bytes: None })
      })
      .collect();
    if self.max_links > 0 && raw_links.len() > self.max_links {
      raw_links.truncate(self.max_links);
    }

    Ok(ContentPage { raw_links })
  }
}

fn extract_year(title: &str) -> Option<i32> {
  let bytes = title.as_bytes();
  for i in 0..bytes.len().saturating_sub(3) {
    if bytes[i..i + 4].iter().all(|b| b.is_ascii_digit()) {
      if let Ok(y) = title[i..i + 4].parse::<i32>() {
        if (1900..=2100).contains(&y) {
          return Some(y);
        }
      }
    }
  }
  None
}

/// Parses a season badge like `S01`.
fn parse_season_badge(text: &str) -> Option<u32> {
  let upper = text.to_ascii_uppercase();
  let idx = upper.find('S')?;
  upper[idx + 1..].chars().take_while(|c| c.is_ascii_digit()).collect::<String>().parse().ok()
}

/// Parses an episode label like `Episode-03`.
fn parse_episode_label(text: &str) -> Option<u32> {
  let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
  digits.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_year_from_title() {
    assert_eq!(extract_year("The Matrix (1999)"), Some(1999));
    assert_eq!(extract_year("No year here"), None);
  }

  #[test]
  fn parses_season_badge() {
    assert_eq!(parse_season_badge("S01"), Some(1));
  }

  #[test]
  fn parses_episode_label() {
    assert_eq!(parse_episode_label("Episode-03"), Some(3));
  }
}
