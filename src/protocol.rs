//! Public request/response structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AnswerKey, Question, QuestionKind};

/// A topic section the caller wants questions for. Extra fields from the
/// front-end's section records are ignored.
#[derive(Debug, Deserialize)]
pub struct SectionIn {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    #[serde(default)]
    pub sections: Vec<SectionIn>,
    #[serde(default)]
    pub count: Option<i64>,
}

/// Question DTO delivered to the caller. The `answer` and `explanation`
/// fields are withheld: leaking the answer key would defeat the quiz.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: BTreeMap<String, String>,
}

/// Convert a full `Question` (internal) to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        section_id: q.section_id.clone(),
        title: q.title.clone(),
        content: q.content.clone(),
        kind: q.kind,
        options: q.options.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
    #[serde(rename = "batchId")]
    pub batch_id: String,
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Deserialize)]
pub struct CheckIn {
    #[serde(rename = "batchId")]
    pub batch_id: String,
    #[serde(rename = "questionId")]
    pub question_id: String,
    /// Letter, zero-based index, option text, or a number for numeric
    /// questions; kept as a raw JSON value until resolution.
    #[serde(rename = "userAnswer")]
    pub user_answer: Value,
}

/// Unlike the generation response, this legitimately reveals the correct
/// answer and explanation: the question has already been attempted.
#[derive(Debug, Serialize)]
pub struct CheckOut {
    pub correct: bool,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: AnswerKey,
    pub explanation: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: &'static str,
    pub message: String,
}
