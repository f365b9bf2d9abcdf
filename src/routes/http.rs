//! HTTP endpoint handlers. These are thin wrappers that forward to core
//! logic; failures map to status codes through `ApiError::into_response`.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::logic::{check_answer, generate_questions, ApiError};
use crate::protocol::{CheckIn, CheckOut, GenerateIn, GenerateOut, HealthOut};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(sections = body.sections.len(), count = ?body.count))]
pub async fn http_post_questions(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<GenerateOut>, ApiError> {
  let out = generate_questions(&state, &body).await?;
  info!(target: "quiz", batch_id = %out.batch_id, served = out.questions.len(), "HTTP questions generated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(batch_id = %body.batch_id, question_id = %body.question_id))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CheckIn>,
) -> Result<Json<CheckOut>, ApiError> {
  let out = check_answer(&state, &body).await?;
  info!(target: "quiz", correct = out.correct, "HTTP answer checked");
  Ok(Json(out))
}
