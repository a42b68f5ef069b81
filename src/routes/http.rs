//! HTTP endpoint handlers. These are thin wrappers that forward to the session service.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, Path, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::protocol::*;
use crate::state::AppState;

fn decode<T>(body: std::result::Result<Json<T>, JsonRejection>, what: &str) -> Result<T> {
  body
    .map(|Json(v)| v)
    .map_err(|e| Error::InvalidParam(format!("decode request body to {what} failure: {e}")))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_topics(State(state): State<Arc<AppState>>) -> Result<Json<TopicsDto>> {
  let topics = state.service.show_topics().await?;
  info!(target: "session", count = topics.len(), "HTTP topics served");
  Ok(Json(TopicsDto { topics }))
}

#[instrument(level = "info", skip(state, body), fields(%user_id))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  body: std::result::Result<Json<TopicsDto>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionDto>)> {
  let TopicsDto { topics } = decode(body, "topics")?;
  let session = state
    .service
    .create_session(&user_id, topics)
    .await
    .map_err(|e| e.context("CreateSession failure"))?;
  info!(target: "session", %user_id, session_id = %session.session_id(), questions = session.questions().len(), "HTTP session started");
  Ok((StatusCode::CREATED, Json(session_out(&session))))
}

#[instrument(level = "info", skip(state, body), fields(%user_id, %session_id))]
pub async fn http_complete_session(
  State(state): State<Arc<AppState>>,
  Path((user_id, session_id)): Path<(String, String)>,
  body: std::result::Result<Json<UserAnswersListDto>, JsonRejection>,
) -> Result<Json<SessionResultDto>> {
  let answers = decode(body, "answers list")?.into_answers()?;
  let result = state
    .service
    .complete_session(&user_id, &session_id, &answers)
    .await
    .map_err(|e| e.context("CompleteSession failure"))?;
  info!(target: "session", %session_id, grade = %format!("{:.2}", result.grade), is_success = result.is_success, "HTTP session completed");
  Ok(Json(result_out(&result)))
}
