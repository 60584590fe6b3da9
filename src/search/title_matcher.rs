//! TitleMatcher (spec §4.3). Pure and dependency-free aside from a hand-rolled Levenshtein —
//! no crate in the teacher's stack or the rest of the pack reaches for one at this exact shape
//! (bounded-length title strings), so it is written directly here, in the terse style of the
//! teacher's other small string-processing helpers (`engine/naming.rs`).

use crate::model::CandidateTitle;

pub fn normalize(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut last_was_space = false;
  for ch in s.chars() {
    if ch.is_alphanumeric() {
      out.push(ch.to_ascii_lowercase());
      last_was_space = false;
    } else if !last_was_space {
      out.push(' ');
      last_was_space = true;
    }
  }
  out.trim().to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
  let a: Vec<char> = a.chars().collect();
  let b: Vec<char> = b.chars().collect();
  if a.is_empty() {
    return b.len();
  }
  if b.is_empty() {
    return a.len();
  }

  let mut prev: Vec<usize> = (0..=b.len()).collect();
  let mut cur = vec![0usize; b.len() + 1];

  for i in 1..=a.len() {
    cur[0] = i;
    for j in 1..=b.len() {
      let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
      cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
    }
    std::mem::swap(&mut prev, &mut cur);
  }
  prev[b.len()]
}

/// `(maxLen - distance) / maxLen`, 1.0 on equal-normalized inputs, 0 on either empty.
pub fn similarity(a: &str, b: &str) -> f64 {
  let na = normalize(a);
  let nb = normalize(b);
  if na.is_empty() || nb.is_empty() {
    return 0.0;
  }
  if na == nb {
    return 1.0;
  }
  let max_len = na.chars().count().max(nb.chars().count());
  if max_len == 0 {
    return 0.0;
  }
  let dist = levenshtein(&na, &nb);
  ((max_len - dist.min(max_len)) as f64) / (max_len as f64)
}

/// Every normalized query token must appear as a substring of (or contain) some title token.
pub fn contains_all_words(title: &str, query: &str) -> bool {
  let title_words: Vec<String> = normalize(title).split_whitespace().map(String::from).collect();
  let query_words: Vec<String> = normalize(query).split_whitespace().map(String::from).collect();
  if query_words.is_empty() {
    return false;
  }
  query_words.iter().all(|qw| {
    title_words.iter().any(|tw| tw.contains(qw.as_str()) || qw.contains(tw.as_str()))
  })
}

fn title_has_year_in_parens(title: &str) -> bool {
  let bytes = title.as_bytes();
  let mut i = 0;
  while i + 1 < bytes.len() {
    if bytes[i] == b'(' {
      if let Some(close) = title[i..].find(')') {
        let inner = &title[i + 1..i + close];
        if inner.len() == 4 && inner.chars().all(|c| c.is_ascii_digit()) {
          return true;
        }
      }
    }
    i += 1;
  }
  false
}

/// `score(candidate, query)` per spec §4.3's weighted formula.
pub fn score(title: &str, query: &str) -> f64 {
  let exact = normalize(title) == normalize(query);
  let mut s = if exact { 100.0 } else { 0.0 };
  s += similarity(title, query) * 50.0;
  s += if contains_all_words(title, query) { 30.0 } else { 0.0 };
  let len_diff = (title.chars().count() as i64 - query.chars().count() as i64).unsigned_abs() as f64;
  s += (10.0 - len_diff / 5.0).max(0.0);
  s += if title_has_year_in_parens(title) { 5.0 } else { 0.0 };
  s
}

#[derive(Debug, Clone)]
pub struct Scored {
  pub candidate: CandidateTitle,
  pub score: f64,
}

/// `rank(candidates, query)`: sorts by score descending, stable on ties.
pub fn rank(candidates: Vec<CandidateTitle>, query: &str) -> Vec<Scored> {
  let mut scored: Vec<Scored> = candidates
    .into_iter()
    .map(|c| {
      let sc = score(&c.title, query);
      Scored { candidate: c, score: sc }
    })
    .collect();
  scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
  scored
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_collapses_punctuation_and_case() {
    assert_eq!(normalize("The Shawshank  Redemption!!"), "the shawshank redemption");
  }

  #[test]
  fn similarity_is_one_for_equal_normalized() {
    assert_eq!(similarity("Foo Bar", "foo   bar"), 1.0);
  }

  #[test]
  fn similarity_is_zero_for_empty_input() {
    assert_eq!(similarity("", "anything"), 0.0);
  }

  #[test]
  fn contains_all_words_matches_partial_substrings() {
    assert!(contains_all_words("The Shawshank Redemption 1994", "shawshank redemption"));
    assert!(!contains_all_words("The Shawshank Redemption", "godfather"));
  }

  #[test]
  fn score_self_match_dominates() {
    let a = "The Shawshank Redemption";
    assert!(score(a, a) >= score(a, "The Godfather"));
  }

  #[test]
  fn rank_sorts_descending_and_stable_on_ties() {
    let candidates = vec![
      CandidateTitle { title: "Alpha".into(), url: "u1".into(), year: None, poster: None, source_tag: "s".into() },
      CandidateTitle { title: "Alpha".into(), url: "u2".into(), year: None, poster: None, source_tag: "s".into() },
    ];
    let ranked = rank(candidates, "Alpha");
    assert_eq!(ranked[0].candidate.url, "u1");
    assert_eq!(ranked[1].candidate.url, "u2");
  }
}
