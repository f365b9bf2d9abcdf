//! Core behaviors behind the HTTP handlers: the generation pipeline
//! (prompt → provider → extract → normalize → store) and answer checking.

use std::collections::{HashMap, HashSet};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::domain::{Question, StoredAnswer};
use crate::extract::extract_first_json;
use crate::normalize::normalize;
use crate::protocol::{to_out, CheckIn, CheckOut, ErrorOut, GenerateIn, GenerateOut};
use crate::resolve::is_correct;
use crate::state::AppState;
use crate::util::{fill_template, trunc_for_log};

pub const DEFAULT_COUNT: i64 = 6;
pub const MAX_COUNT: i64 = 12;

/// Service-level failures, one HTTP-mapped variant per machine-readable
/// error code. Diagnostics never include upstream credentials, and a lookup
/// miss never says whether the batch expired or never existed.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("completion provider unavailable: {0}")]
  UpstreamUnavailable(String),
  #[error("model output unusable: {0}")]
  InvalidModelOutput(String),
  #[error("unknown batch or question")]
  QuestionNotFound,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = match &self {
      ApiError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
      ApiError::InvalidModelOutput(_) => (StatusCode::BAD_GATEWAY, "invalid_model_output"),
      ApiError::QuestionNotFound => (StatusCode::NOT_FOUND, "question_not_found"),
    };
    (status, Json(ErrorOut { error: code, message: self.to_string() })).into_response()
  }
}

fn clamp_count(count: Option<i64>) -> i64 {
  match count {
    Some(n) if n > 0 => n.min(MAX_COUNT),
    _ => DEFAULT_COUNT,
  }
}

fn render_sections(req: &GenerateIn) -> String {
  if req.sections.is_empty() {
    return "- general: mixed probability topics".into();
  }
  req
    .sections
    .iter()
    .map(|s| match s.title.as_deref().filter(|t| !t.is_empty()) {
      Some(title) => format!("- {}: {}", s.id, title),
      None => format!("- {}", s.id),
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// The batch key space must match the returned ids one-to-one, so duplicate
/// model-assigned ids get a positional suffix.
fn dedupe_ids(questions: &mut [Question]) {
  let mut seen = HashSet::new();
  for q in questions.iter_mut() {
    if !seen.insert(q.id.clone()) {
      let mut n = 2;
      loop {
        let candidate = format!("{}-{}", q.id, n);
        if seen.insert(candidate.clone()) {
          q.id = candidate;
          break;
        }
        n += 1;
      }
    }
  }
}

/// Run one generation request end to end.
///
/// The store is only written once every surviving candidate is normalized:
/// a provider failure or an unusable payload never leaves a partial batch
/// behind.
#[instrument(level = "info", skip(state, req), fields(sections = req.sections.len(), count = ?req.count))]
pub async fn generate_questions(state: &AppState, req: &GenerateIn) -> Result<GenerateOut, ApiError> {
  let provider = state.provider.as_ref().ok_or_else(|| {
    ApiError::UpstreamUnavailable("no completion provider configured (OPENAI_API_KEY unset)".into())
  })?;

  let count = clamp_count(req.count);
  let fallback_section = req
    .sections
    .first()
    .map(|s| s.id.clone())
    .unwrap_or_else(|| "general".into());

  let count_str = count.to_string();
  let sections_str = render_sections(req);
  let user_prompt = fill_template(
    &state.prompts.generation_user_template,
    &[("count", count_str.as_str()), ("sections", sections_str.as_str())],
  );

  let raw = provider
    .complete(&state.prompts.generation_system, &user_prompt)
    .await
    .map_err(|e| {
      error!(target: "quiz", error = %e, "completion provider call failed");
      ApiError::UpstreamUnavailable(e.to_string())
    })?;

  let root = extract_first_json(&raw).map_err(|e| {
    warn!(target: "quiz", raw = %trunc_for_log(&raw, 200), "no JSON object in model output");
    ApiError::InvalidModelOutput(e.to_string())
  })?;

  // The schema asks for {"questions": [...]}; a bare single-question object
  // is tolerated as a one-element batch.
  let candidates: Vec<Value> = match root.get("questions") {
    Some(Value::Array(items)) => items.clone(),
    _ => vec![root],
  };

  let mut questions: Vec<Question> = Vec::new();
  let mut dropped = 0usize;
  for (idx, candidate) in candidates.iter().enumerate() {
    match normalize(candidate, &fallback_section, idx) {
      Ok(q) => questions.push(q),
      Err(e) => {
        // One bad candidate never sinks its siblings.
        dropped += 1;
        warn!(target: "quiz", index = idx, error = %e, "dropping candidate question");
      }
    }
  }

  if questions.is_empty() {
    return Err(ApiError::InvalidModelOutput(format!(
      "no candidate question survived normalization ({dropped} dropped)"
    )));
  }

  dedupe_ids(&mut questions);

  let items: HashMap<String, StoredAnswer> =
    questions.iter().map(|q| (q.id.clone(), q.stored())).collect();
  let batch_id = state.store.put(items).await;

  info!(target: "quiz", %batch_id, served = questions.len(), dropped, "generation batch stored");
  Ok(GenerateOut { batch_id, questions: questions.iter().map(to_out).collect() })
}

/// Check a submitted answer against a stored batch.
#[instrument(level = "info", skip(state, req), fields(batch_id = %req.batch_id, question_id = %req.question_id))]
pub async fn check_answer(state: &AppState, req: &CheckIn) -> Result<CheckOut, ApiError> {
  let stored = state
    .store
    .get(&req.batch_id, &req.question_id)
    .await
    .ok_or(ApiError::QuestionNotFound)?;

  let correct = is_correct(&stored, &req.user_answer);
  info!(target: "quiz", correct, "answer checked");

  Ok(CheckOut { correct, correct_answer: stored.answer, explanation: stored.explanation })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn count_defaults_and_clamps() {
    assert_eq!(clamp_count(None), DEFAULT_COUNT);
    assert_eq!(clamp_count(Some(0)), DEFAULT_COUNT);
    assert_eq!(clamp_count(Some(-3)), DEFAULT_COUNT);
    assert_eq!(clamp_count(Some(4)), 4);
    assert_eq!(clamp_count(Some(50)), MAX_COUNT);
  }

  #[test]
  fn duplicate_ids_get_suffixed() {
    let raw = serde_json::json!({"question": "?", "options": ["x"], "answer": 0});
    let mut qs = vec![
      normalize(&raw, "s", 0).unwrap(),
      normalize(&raw, "s", 0).unwrap(),
      normalize(&raw, "s", 0).unwrap(),
    ];
    dedupe_ids(&mut qs);
    let ids: HashSet<_> = qs.iter().map(|q| q.id.clone()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(qs[0].id, "q1");
  }

  #[test]
  fn sections_render_with_optional_titles() {
    let req = GenerateIn {
      sections: vec![
        crate::protocol::SectionIn { id: "bayes".into(), title: Some("Bayes' theorem".into()) },
        crate::protocol::SectionIn { id: "clt".into(), title: None },
      ],
      count: None,
    };
    assert_eq!(render_sections(&req), "- bayes: Bayes' theorem\n- clt");
  }
}
