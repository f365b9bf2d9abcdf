//! Resolving heterogeneous answer encodings to the canonical key space.
//!
//! The same letter / index / text pipeline runs in two places: once during
//! normalization to pin down the stored answer key, and again when a user
//! submits an answer. A single implementation keeps the two sides from ever
//! disagreeing on what an answer "means".

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{AnswerKey, QuestionKind, StoredAnswer};

/// Resolve a candidate answer value to an option key.
///
/// Tiers, in order:
/// 1. letter — the trimmed, uppercased string is already a key;
/// 2. index — an integer (or integer-valued numeric string) is a zero-based
///    position in option order, clamped to the valid range;
/// 3. text — the string equals one option's text exactly (after trimming).
pub fn resolve_option_key(options: &BTreeMap<String, String>, candidate: &Value) -> Option<String> {
  if options.is_empty() {
    return None;
  }

  if let Some(s) = candidate.as_str() {
    let upper = s.trim().to_uppercase();
    if options.contains_key(&upper) {
      return Some(upper);
    }
  }

  if let Some(idx) = integer_value(candidate) {
    let clamped = idx.clamp(0, options.len() as i64 - 1) as usize;
    return options.keys().nth(clamped).cloned();
  }

  if let Some(s) = candidate.as_str() {
    let needle = s.trim();
    for (key, text) in options {
      if text.trim() == needle {
        return Some(key.clone());
      }
    }
  }

  None
}

/// An integer carried either as a JSON number or as a numeric string.
/// Non-integer numbers (e.g. "0.5") are not indices and fall through to the
/// text tier.
fn integer_value(candidate: &Value) -> Option<i64> {
  match candidate {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
    Value::String(s) => {
      let t = s.trim();
      t.parse::<i64>()
        .ok()
        .or_else(|| t.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
    }
    _ => None,
  }
}

/// Coerce a candidate value to a number, for numeric questions.
pub fn coerce_number(candidate: &Value) -> Option<f64> {
  match candidate {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  }
}

/// Decide whether a submitted answer matches the stored one.
///
/// Unresolvable or uncoercible submissions are simply wrong, never an error:
/// the quiz UI already constrains input, so a strict 4xx here would only
/// degrade the experience. Numeric comparison is exact equality, with no
/// tolerance band.
pub fn is_correct(stored: &StoredAnswer, submitted: &Value) -> bool {
  match (stored.kind, &stored.answer) {
    (QuestionKind::Mcq, AnswerKey::Letter(expected)) => {
      resolve_option_key(&stored.options, submitted)
        .map_or(false, |key| key.eq_ignore_ascii_case(expected))
    }
    (QuestionKind::Numeric, AnswerKey::Number(expected)) => {
      coerce_number(submitted).map_or(false, |n| n == *expected)
    }
    // Normalization only ever pairs Mcq with Letter and Numeric with Number.
    _ => false,
  }
}
