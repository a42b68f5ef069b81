//! Session orchestration shared by every transport:
//!   - listing topics
//!   - assembling and persisting a session for a user
//!   - grading submitted answers against the stored session
//!
//! The service keeps no mutable state of its own; everything lives behind `Storage`.
//! Cancellation is the caller's: dropping the returned future drops the storage call.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::DEFAULT_PASS_THRESHOLD;
use crate::domain::{Question, Session, SessionResult, UserAnswer};
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Grade scale upper bound; grades are percentages.
pub const MAX_GRADE: f64 = 100.0;

#[derive(Clone)]
pub struct SessionService {
  storage: Arc<dyn Storage>,
  pass_threshold: f64,
}

impl SessionService {
  pub fn new(storage: Arc<dyn Storage>) -> Self {
    Self { storage, pass_threshold: DEFAULT_PASS_THRESHOLD }
  }

  pub fn with_pass_threshold(mut self, pass_threshold: f64) -> Self {
    self.pass_threshold = pass_threshold;
    self
  }

  #[instrument(level = "info", skip(self))]
  pub async fn show_topics(&self) -> Result<Vec<String>> {
    let topics = self.storage.get_topics().await.map_err(|e| e.context("get topics"))?;
    debug!(target: "session", count = topics.len(), "Topics listed");
    Ok(topics)
  }

  /// Assemble a session from the questions Storage returns for `topics` and persist it.
  /// An empty topic list is rejected; topics without questions just contribute nothing.
  #[instrument(level = "info", skip(self), fields(%user_id, topics = ?topics))]
  pub async fn create_session(&self, user_id: &str, topics: Vec<String>) -> Result<Session> {
    if user_id.trim().is_empty() {
      return Err(Error::InvalidParam("create session: empty user id".into()));
    }
    if topics.is_empty() {
      return Err(Error::InvalidParam("create session: no topics requested".into()));
    }
    if topics.iter().any(|t| t.trim().is_empty()) {
      return Err(Error::InvalidParam("create session: blank topic name".into()));
    }

    let questions = self
      .storage
      .get_questions(&topics)
      .await
      .map_err(|e| e.context("create session: get questions"))?;

    let session_id = Uuid::new_v4().to_string();
    let session = Session::new(session_id, user_id, topics, questions)?;

    self
      .storage
      .store_session(&session)
      .await
      .map_err(|e| e.context("create session: store session"))?;

    info!(target: "session", session_id = %session.session_id(), %user_id, questions = session.questions().len(), created_at_ms = session.created_at_ms(), "Session created");
    Ok(session)
  }

  /// Grade `answers` against the session `session_id`, which must belong to `user_id`.
  /// Re-grading the same session is allowed and deterministic since sessions never change
  /// after creation.
  #[instrument(level = "info", skip(self, answers), fields(%user_id, %session_id, answers = answers.len()))]
  pub async fn complete_session(
    &self,
    user_id: &str,
    session_id: &str,
    answers: &[UserAnswer],
  ) -> Result<SessionResult> {
    let session = self.load_session(session_id).await?;
    if session.user_id() != user_id {
      return Err(Error::Forbidden(format!("complete session: session {session_id} belongs to another user")));
    }
    Ok(self.grade(&session, answers))
  }

  async fn load_session(&self, session_id: &str) -> Result<Session> {
    if session_id.trim().is_empty() {
      return Err(Error::InvalidParam("complete session: empty session id".into()));
    }
    self
      .storage
      .get_session_by_session_id(session_id)
      .await
      .map_err(|e| e.context("complete session: get session"))
  }

  fn grade(&self, session: &Session, answers: &[UserAnswer]) -> SessionResult {
    let result = grade_session(session.questions(), answers, self.pass_threshold);
    info!(
      target: "session",
      session_id = %session.session_id(),
      correct = result.correct,
      total = result.total,
      grade = %format!("{:.2}", result.grade),
      is_success = result.is_success,
      "Session graded"
    );
    result
  }
}

/// Count correct answers and turn them into a percentage grade.
///
/// For each question the first answer with a matching id is used; a missing answer is
/// wrong. Answers for ids outside `questions` are ignored. An empty question list grades
/// as `MAX_GRADE`.
pub fn grade_session(questions: &[Question], answers: &[UserAnswer], pass_threshold: f64) -> SessionResult {
  let total = questions.len();
  let correct = questions
    .iter()
    .filter(|q| {
      answers
        .iter()
        .find(|a| a.question_id() == q.id())
        .map(|a| q.is_answer_correct(a))
        .unwrap_or(false)
    })
    .count();

  let stray = answers.iter().filter(|a| !questions.iter().any(|q| q.id() == a.question_id())).count();
  if stray > 0 {
    debug!(target: "session", stray, "Ignoring answers for questions outside the session");
  }

  // pass/fail is decided on the exact ratio; only the reported grade is rounded
  let exact = if total == 0 { MAX_GRADE } else { correct as f64 * MAX_GRADE / total as f64 };

  SessionResult { is_success: exact >= pass_threshold, grade: round2(exact), correct, total }
}

fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{SingleSelectionQuestion, TrueOrFalseQuestion};
  use crate::error::ErrorKind;
  use crate::storage::InMemoryStorage;
  use async_trait::async_trait;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  fn answer(id: u64, picks: &[&str]) -> UserAnswer {
    UserAnswer::new(id, strings(picks)).unwrap()
  }

  fn bank() -> Vec<Question> {
    vec![
      SingleSelectionQuestion::new(1, "math", "2 + 2?", strings(&["3", "4"]), "4").unwrap().into(),
      TrueOrFalseQuestion::new(2, "math", "7 is prime", true).unwrap().into(),
      SingleSelectionQuestion::new(3, "history", "Fall of Rome?", strings(&["476", "1453"]), "476").unwrap().into(),
      TrueOrFalseQuestion::new(4, "history", "Caesar was an emperor", false).unwrap().into(),
      TrueOrFalseQuestion::new(5, "art", "Mona Lisa is by Picasso", false).unwrap().into(),
    ]
  }

  fn service() -> (SessionService, InMemoryStorage) {
    let storage = InMemoryStorage::new(bank(), None);
    (SessionService::new(Arc::new(storage.clone())), storage)
  }

  fn all_correct() -> Vec<UserAnswer> {
    vec![answer(1, &["4"]), answer(2, &["true"]), answer(3, &["476"]), answer(4, &["false"])]
  }

  #[tokio::test]
  async fn create_then_complete_all_correct() {
    let (svc, storage) = service();
    let session = svc.create_session("u1", strings(&["math", "history"])).await.unwrap();

    assert_eq!(session.topics(), strings(&["math", "history"]).as_slice());
    let ids: Vec<_> = session.questions().iter().map(|q| q.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(storage.session_count().await, 1);

    let result = svc.complete_session("u1", session.session_id(), &all_correct()).await.unwrap();
    assert!(result.is_success);
    assert_eq!(result.grade, MAX_GRADE);
    assert_eq!((result.correct, result.total), (4, 4));
  }

  #[tokio::test]
  async fn three_of_four_is_seventy_five_percent() {
    let (svc, _) = service();
    let session = svc.create_session("u1", strings(&["math", "history"])).await.unwrap();
    let mut answers = all_correct();
    answers[3] = answer(4, &["true"]);

    let result = svc.complete_session("u1", session.session_id(), &answers).await.unwrap();
    assert_eq!(result.grade, 75.0);
    assert!(result.is_success, "75 meets the default 50 threshold");

    let strict = svc.clone().with_pass_threshold(80.0);
    let result = strict.complete_session("u1", session.session_id(), &answers).await.unwrap();
    assert_eq!(result.grade, 75.0);
    assert!(!result.is_success);
  }

  #[tokio::test]
  async fn grading_is_repeatable() {
    let (svc, _) = service();
    let session = svc.create_session("u1", strings(&["math"])).await.unwrap();
    let answers = vec![answer(1, &["4"])];
    let first = svc.complete_session("u1", session.session_id(), &answers).await.unwrap();
    let second = svc.complete_session("u1", session.session_id(), &answers).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.grade, 50.0);
    assert!(first.is_success);
  }

  #[tokio::test]
  async fn unknown_session_is_not_found() {
    let (svc, _) = service();
    let err = svc.complete_session("u1", "nope", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = svc.complete_session("u1", " ", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParam);
  }

  #[tokio::test]
  async fn empty_topics_and_user_rejected() {
    let (svc, storage) = service();
    assert_eq!(svc.create_session("u1", vec![]).await.unwrap_err().kind(), ErrorKind::InvalidParam);
    assert_eq!(svc.create_session("", strings(&["math"])).await.unwrap_err().kind(), ErrorKind::InvalidParam);
    assert_eq!(svc.create_session("u1", strings(&["math", " "])).await.unwrap_err().kind(), ErrorKind::InvalidParam);
    assert_eq!(storage.session_count().await, 0);
  }

  #[tokio::test]
  async fn unknown_topic_gives_empty_session_that_passes() {
    let (svc, storage) = service();
    let session = svc.create_session("u1", strings(&["astronomy"])).await.unwrap();
    assert!(session.questions().is_empty());
    assert_eq!(storage.session_count().await, 1);

    let result = svc.complete_session("u1", session.session_id(), &[]).await.unwrap();
    assert_eq!(result.grade, MAX_GRADE);
    assert!(result.is_success);
  }

  #[tokio::test]
  async fn other_users_session_is_forbidden() {
    let (svc, _) = service();
    let session = svc.create_session("owner", strings(&["art"])).await.unwrap();
    let err = svc
      .complete_session("intruder", session.session_id(), &[answer(5, &["false"])])
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let ok = svc
      .complete_session("owner", session.session_id(), &[answer(5, &["false"])])
      .await
      .unwrap();
    assert_eq!(ok.grade, MAX_GRADE);
  }

  #[test]
  fn first_matching_answer_wins_and_missing_is_wrong() {
    let qs = bank();
    let answers = vec![
      answer(1, &["3"]),
      answer(1, &["4"]),
      answer(2, &["true"]),
      answer(99, &["whatever"]),
    ];
    let result = grade_session(&qs[..3], &answers, 50.0);
    assert_eq!((result.correct, result.total), (1, 3));
    assert_eq!(result.grade, 33.33);
    assert!(!result.is_success);
  }

  #[test]
  fn threshold_compares_exact_ratio_not_rounded_grade() {
    let qs = bank();
    let answers = vec![answer(1, &["4"]), answer(2, &["true"])];

    let result = grade_session(&qs[..3], &answers, 66.67);
    assert_eq!(result.grade, 66.67, "reported grade is rounded");
    assert!(!result.is_success, "2/3 is 66.666.. and stays below 66.67");

    let result = grade_session(&qs[..3], &answers, 66.66);
    assert!(result.is_success);
  }

  struct BrokenStorage;

  #[async_trait]
  impl Storage for BrokenStorage {
    async fn get_topics(&self) -> Result<Vec<String>> {
      Err(Error::Internal("db down".into()))
    }
    async fn get_questions(&self, _topics: &[String]) -> Result<Vec<Question>> {
      Err(Error::NotFound("topics".into()))
    }
    async fn store_session(&self, _session: &Session) -> Result<()> {
      Err(Error::Internal("db down".into()))
    }
    async fn get_session_by_session_id(&self, _session_id: &str) -> Result<Session> {
      Err(Error::Internal("db down".into()))
    }
  }

  #[tokio::test]
  async fn storage_errors_keep_their_kind() {
    let svc = SessionService::new(Arc::new(BrokenStorage));

    let err = svc.show_topics().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.to_string().contains("get topics"));

    let err = svc.create_session("u1", strings(&["math"])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = svc.complete_session("u1", "s1", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
  }
}
