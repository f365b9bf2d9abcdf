//! Locating the first parseable JSON object inside untrusted model output.
//!
//! The provider returns free-form text that may wrap its JSON in prose or
//! markdown fences. We scan with an explicit brace-depth counter that honors
//! string literals: inside a candidate span, an unescaped `"` toggles
//! in-string mode, so braces inside string values never affect depth. Each
//! balanced top-level span is handed to serde_json; the first span that
//! parses wins. Spans that fail to parse (prose that happens to contain
//! braces, truncated objects) are skipped and scanning continues.

use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
  #[error("no parseable JSON object found in model output")]
  NoJsonFound,
}

/// Return the first brace-balanced span of `text` that parses as JSON.
pub fn extract_first_json(text: &str) -> Result<Value, ExtractError> {
  let bytes = text.as_bytes();
  let mut depth: i32 = 0;
  let mut in_string = false;
  let mut escaped = false;
  let mut start: Option<usize> = None;

  for (idx, &b) in bytes.iter().enumerate() {
    if in_string {
      if escaped {
        escaped = false;
      } else if b == b'\\' {
        escaped = true;
      } else if b == b'"' {
        in_string = false;
      }
      continue;
    }
    match b {
      // Only meaningful inside a candidate span; quotes in surrounding
      // prose are handled by the parse-and-continue loop instead.
      b'"' if start.is_some() => in_string = true,
      b'{' => {
        if depth == 0 {
          start = Some(idx);
        }
        depth += 1;
      }
      b'}' if depth > 0 => {
        depth -= 1;
        if depth == 0 {
          let span = &text[start.unwrap_or(0)..=idx];
          if let Ok(v) = serde_json::from_str::<Value>(span) {
            return Ok(v);
          }
          start = None;
        }
      }
      _ => {}
    }
  }

  Err(ExtractError::NoJsonFound)
}
