//! Content-Disposition/URL filename extraction, ported out of the teacher's `engine/naming.rs`
//! (its header/filename parsing is reused unchanged by `validate::range_validator` and
//! `resolve::stream_catalog`, neither of which write files to disk the way the teacher's
//! download job did — only the parsing half survives the transform).

/// Extracts a filename from `Content-Disposition`, per spec §4.2's supported forms.
/// Rejects names that look like opaque hashes (≥50 chars, only `[A-Za-z0-9_-]`) — such a
/// name carries no useful display information and the caller should fall back to the title.
pub fn parse_content_disposition_filename(cd: &str) -> Option<String> {
  let cd = cd.trim();

  fn take_param_value(s: &str) -> &str {
    let mut in_quotes = false;
    let mut escape = false;
    for (i, ch) in s.char_indices() {
      if escape {
        escape = false;
        continue;
      }
      match ch {
        '\\' if in_quotes => escape = true,
        '"' => in_quotes = !in_quotes,
        ';' if !in_quotes => return s[..i].trim(),
        _ => {}
      }
    }
    s.trim()
  }

  if let Some(idx) = cd.to_ascii_lowercase().find("filename*=") {
    let rest = &cd[idx + "filename*=".len()..];
    let rest = take_param_value(rest.trim_start());
    if let Some(pos) = rest.find("''") {
      let enc_value = &rest[pos + 2..];
      let enc_value = enc_value.trim().trim_matches('"');
      if let Ok(decoded) = urlencoding::decode(enc_value) {
        return filter_opaque_hash(decoded.into_owned());
      }
    }
    let value = rest.trim().trim_matches('"');
    if !value.is_empty() {
      return filter_opaque_hash(value.to_string());
    }
  }

  if let Some(idx) = cd.to_ascii_lowercase().find("filename=") {
    let mut rest = &cd[idx + "filename=".len()..];
    if let Some(semi) = rest.find(';') {
      rest = &rest[..semi];
    }
    let value = rest.trim().trim_matches('"');
    if !value.is_empty() {
      return filter_opaque_hash(decode_filename_like(value));
    }
  }

  None
}

fn filter_opaque_hash(name: String) -> Option<String> {
  let looks_like_hash = name.len() >= 50
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
  if looks_like_hash {
    None
  } else {
    Some(name)
  }
}

pub fn decode_filename_like(s: &str) -> String {
  match urlencoding::decode(s) {
    Ok(v) => v.into_owned(),
    Err(_) => s.replace("%20", " "),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn content_disposition_filename_star_does_not_consume_following_params() {
    let cd = "attachment; filename*=UTF-8''Qwen3-4B-Q5_K_M.gguf; filename=Qwen3-4B-Q5_K_M.gguf";
    let got = parse_content_disposition_filename(cd).unwrap();
    assert_eq!(got, "Qwen3-4B-Q5_K_M.gguf");
  }

  #[test]
  fn content_disposition_filename_basic() {
    let cd = r#"attachment; filename="Qwen3-4B-Q5_K_M.gguf""#;
    let got = parse_content_disposition_filename(cd).unwrap();
    assert_eq!(got, "Qwen3-4B-Q5_K_M.gguf");
  }

  #[test]
  fn content_disposition_filename_star_percent_decodes() {
    let cd = "attachment; filename*=UTF-8''a%20b.txt; filename=a b.txt";
    let got = parse_content_disposition_filename(cd).unwrap();
    assert_eq!(got, "a b.txt");
  }

  #[test]
  fn content_disposition_opaque_hash_is_rejected() {
    let hash = "a".repeat(60);
    let cd = format!(r#"attachment; filename="{hash}""#);
    assert!(parse_content_disposition_filename(&cd).is_none());
  }
}
