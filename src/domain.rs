//! Domain models: question kinds, canonical answer keys, and the answer
//! records retained for checking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How the user is expected to answer a question.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  /// Pick one lettered option.
  Mcq,
  /// Enter a number; compared for exact equality.
  Numeric,
}

impl Default for QuestionKind {
  fn default() -> Self { QuestionKind::Mcq }
}

/// Canonical answer representation every submitted form resolves to before
/// comparison: a single uppercase letter for MCQ, a number for numeric.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnswerKey {
  Letter(String),
  Number(f64),
}

/// Canonical question produced by normalization. Never mutated afterwards.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Question {
  pub id: String,
  pub section_id: String,
  pub title: String,
  pub content: String,
  #[serde(rename = "type")]
  pub kind: QuestionKind,
  /// Uppercase letter keys. BTreeMap iteration order (A, B, C, …) is the
  /// canonical option order used for index-based answer resolution.
  pub options: BTreeMap<String, String>,
  pub answer: AnswerKey,
  pub explanation: String,
}

/// Answer-bearing record the store keeps per question. Carries the option
/// table so answer checking can run the same letter/index/text resolution
/// as normalization without re-invoking the model.
#[derive(Clone, Debug)]
pub struct StoredAnswer {
  pub kind: QuestionKind,
  pub options: BTreeMap<String, String>,
  pub answer: AnswerKey,
  pub explanation: String,
}

impl Question {
  /// The slice of the question retained by the store after the batch is
  /// returned to the caller.
  pub fn stored(&self) -> StoredAnswer {
    StoredAnswer {
      kind: self.kind,
      options: self.options.clone(),
      answer: self.answer.clone(),
      explanation: self.explanation.clone(),
    }
  }
}
