//! Turning loose model-emitted question records into canonical `Question`s.
//!
//! The model is asked for a fixed schema but routinely drifts: field names
//! vary (`content_md` / `content` / `question` / `text`), options arrive as
//! arrays, keyed maps, or nested objects, and the answer may be a letter, an
//! index, or the option text itself. Normalization is a pure function over
//! one candidate record; a candidate whose answer cannot be mapped onto a
//! real option key is rejected outright rather than defaulted, since a
//! fabricated answer key would silently corrupt answer checking.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::domain::{AnswerKey, Question, QuestionKind};
use crate::resolve::{coerce_number, resolve_option_key};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
  #[error("candidate is not a JSON object")]
  NotAnObject,
  #[error("answer could not be resolved to a canonical key")]
  UnresolvableAnswer,
}

/// Normalize one candidate question.
///
/// `fallback_section_id` fills in a missing `section_id`; `positional_index`
/// is the candidate's position in the batch, used to synthesize an id when
/// the model omits one.
pub fn normalize(
  raw: &Value,
  fallback_section_id: &str,
  positional_index: usize,
) -> Result<Question, NormalizeError> {
  let obj = raw.as_object().ok_or(NormalizeError::NotAnObject)?;

  let kind = match obj.get("type").and_then(Value::as_str) {
    Some("numeric") => QuestionKind::Numeric,
    _ => QuestionKind::Mcq,
  };

  let options = match kind {
    // Numeric questions never carry options, whatever the model sent.
    QuestionKind::Numeric => BTreeMap::new(),
    QuestionKind::Mcq => parse_options(obj.get("options")),
  };

  let answer_value = first_present(obj, &["answer", "correctAnswer"]);
  let answer = match kind {
    QuestionKind::Mcq => {
      let candidate = answer_value.ok_or(NormalizeError::UnresolvableAnswer)?;
      let key = resolve_option_key(&options, candidate).ok_or(NormalizeError::UnresolvableAnswer)?;
      AnswerKey::Letter(key)
    }
    QuestionKind::Numeric => {
      let candidate = answer_value.ok_or(NormalizeError::UnresolvableAnswer)?;
      let n = coerce_number(candidate).ok_or(NormalizeError::UnresolvableAnswer)?;
      AnswerKey::Number(n)
    }
  };

  Ok(Question {
    id: text_field(obj, &["id"]).unwrap_or_else(|| format!("q{}", positional_index + 1)),
    section_id: text_field(obj, &["section_id"]).unwrap_or_else(|| fallback_section_id.to_string()),
    title: text_field(obj, &["title"]).unwrap_or_default(),
    content: text_field(obj, &["content_md", "content", "question", "text", "title"])
      .unwrap_or_default(),
    kind,
    options,
    answer,
    explanation: text_field(obj, &["explanation_md", "explanation", "rationale"])
      .unwrap_or_default(),
  })
}

/// First present, non-null value among the given field names.
fn first_present<'a>(
  obj: &'a serde_json::Map<String, Value>,
  names: &[&str],
) -> Option<&'a Value> {
  names
    .iter()
    .filter_map(|n| obj.get(*n))
    .find(|v| !v.is_null())
}

/// First present, non-null, non-empty field among the given names, coerced
/// to text.
fn text_field(obj: &serde_json::Map<String, Value>, names: &[&str]) -> Option<String> {
  names
    .iter()
    .filter_map(|n| obj.get(*n))
    .filter(|v| !v.is_null())
    .map(value_to_text)
    .find(|s| !s.is_empty())
}

/// Options as a letter-keyed map.
///
/// A sequence gets letters A, B, C, … in input order; a map keeps its keys,
/// uppercased. Anything else means no options.
fn parse_options(raw: Option<&Value>) -> BTreeMap<String, String> {
  match raw {
    Some(Value::Array(items)) => ('A'..='Z')
      .zip(items.iter())
      .map(|(letter, v)| (letter.to_string(), value_to_text(v)))
      .collect(),
    Some(Value::Object(map)) => map
      .iter()
      .map(|(k, v)| (k.trim().to_uppercase(), value_to_text(v)))
      .collect(),
    _ => BTreeMap::new(),
  }
}

/// Coerce any JSON value to display text. Structured option objects expose a
/// display field; everything else is stringified as a last resort.
fn value_to_text(v: &Value) -> String {
  match v {
    Value::String(s) => s.trim().to_string(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Null => String::new(),
    Value::Object(map) => {
      for field in ["text", "label", "value", "content", "title", "name"] {
        if let Some(inner) = map.get(field) {
          if !inner.is_null() {
            let s = value_to_text(inner);
            if !s.is_empty() {
              return s;
            }
          }
        }
      }
      serde_json::to_string(v).unwrap_or_default()
    }
    Value::Array(_) => serde_json::to_string(v).unwrap_or_default(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn sequence_options_get_letters_and_index_answer_maps() {
    let raw = json!({
      "id": "q1",
      "question": "Smallest prime factor of 30?",
      "options": ["2", "3", "5"],
      "answer": 1
    });
    let q = normalize(&raw, "primes", 0).unwrap();
    assert_eq!(q.options.get("A").unwrap(), "2");
    assert_eq!(q.options.get("B").unwrap(), "3");
    assert_eq!(q.options.get("C").unwrap(), "5");
    assert_eq!(q.answer, AnswerKey::Letter("B".into()));
  }

  #[test]
  fn answer_as_option_text_maps_to_its_letter() {
    let raw = json!({"question": "?", "options": ["2", "3", "5"], "answer": "5"});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.answer, AnswerKey::Letter("C".into()));
  }

  #[test]
  fn answer_as_letter_is_uppercased() {
    let raw = json!({"question": "?", "options": ["x", "y"], "answer": "b"});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.answer, AnswerKey::Letter("B".into()));
  }

  #[test]
  fn unmatchable_answer_is_rejected_not_defaulted() {
    let raw = json!({"question": "?", "options": {"A": "x", "B": "y"}, "answer": "z"});
    assert_eq!(normalize(&raw, "s", 0), Err(NormalizeError::UnresolvableAnswer));
  }

  #[test]
  fn missing_answer_is_rejected() {
    let raw = json!({"question": "?", "options": ["x", "y"]});
    assert_eq!(normalize(&raw, "s", 0), Err(NormalizeError::UnresolvableAnswer));
  }

  #[test]
  fn mcq_without_options_is_rejected() {
    let raw = json!({"question": "?", "answer": "A"});
    assert_eq!(normalize(&raw, "s", 0), Err(NormalizeError::UnresolvableAnswer));
  }

  #[test]
  fn mapping_options_keep_keys_uppercased() {
    let raw = json!({"question": "?", "options": {"a": "x", "b": "y"}, "answer": "B"});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.options.get("A").unwrap(), "x");
    assert_eq!(q.options.get("B").unwrap(), "y");
    assert_eq!(q.answer, AnswerKey::Letter("B".into()));
  }

  #[test]
  fn structured_options_use_a_display_field() {
    let raw = json!({
      "question": "?",
      "options": [{"label": "one half"}, {"text": "one third", "weight": 3}],
      "answer": 0
    });
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.options.get("A").unwrap(), "one half");
    assert_eq!(q.options.get("B").unwrap(), "one third");
  }

  #[test]
  fn correct_answer_field_name_is_accepted() {
    let raw = json!({"question": "?", "options": ["x", "y"], "correctAnswer": "A"});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.answer, AnswerKey::Letter("A".into()));
  }

  #[test]
  fn numeric_question_coerces_answer_and_drops_options() {
    let raw = json!({
      "question": "P(heads)?",
      "type": "numeric",
      "options": ["should", "not", "survive"],
      "answer": "0.5"
    });
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.kind, QuestionKind::Numeric);
    assert!(q.options.is_empty());
    assert_eq!(q.answer, AnswerKey::Number(0.5));
  }

  #[test]
  fn numeric_question_with_uncoercible_answer_is_rejected() {
    let raw = json!({"question": "?", "type": "numeric", "answer": "about a half"});
    assert_eq!(normalize(&raw, "s", 0), Err(NormalizeError::UnresolvableAnswer));
  }

  #[test]
  fn unknown_type_normalizes_to_mcq() {
    let raw = json!({"question": "?", "type": "multiple_choice", "options": ["x"], "answer": 0});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.kind, QuestionKind::Mcq);
  }

  #[test]
  fn content_falls_back_through_candidate_fields() {
    let raw = json!({"text": "from text", "options": ["x"], "answer": 0});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.content, "from text");

    let raw = json!({"content_md": "md wins", "text": "not this", "options": ["x"], "answer": 0});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.content, "md wins");
  }

  #[test]
  fn missing_id_and_section_are_synthesized() {
    let raw = json!({"question": "?", "options": ["x"], "answer": 0});
    let q = normalize(&raw, "bayes", 3).unwrap();
    assert_eq!(q.id, "q4");
    assert_eq!(q.section_id, "bayes");
  }

  #[test]
  fn explanation_falls_back_through_candidate_fields() {
    let raw = json!({"question": "?", "options": ["x"], "answer": 0, "rationale": "because"});
    let q = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q.explanation, "because");
  }

  #[test]
  fn non_object_candidate_is_rejected() {
    assert_eq!(normalize(&json!("just a string"), "s", 0), Err(NormalizeError::NotAnObject));
  }

  #[test]
  fn normalization_is_deterministic() {
    let raw = json!({"question": "?", "options": ["a", "b"], "answer": 1});
    let q1 = normalize(&raw, "s", 0).unwrap();
    let q2 = normalize(&raw, "s", 0).unwrap();
    assert_eq!(q1.id, q2.id);
    assert_eq!(q1.answer, q2.answer);
    assert_eq!(q1.options, q2.options);
  }
}
