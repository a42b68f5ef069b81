//! Domain models: question variants, user answers, sessions and grading results.
//!
//! All values are immutable after construction. Constructors validate and return
//! a typed error; there are no setters.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type QuestionId = u64;

/// Which kind of question is presented to the user?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  /// Exactly one option out of `variants` is correct.
  SingleSelection,
  /// A fixed subset of `variants` is correct; the user must pick all of it.
  MultipleSelection,
  /// The statement in `subject` is either true or false.
  TrueOrFalse,
}

impl QuestionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      QuestionType::SingleSelection => "single_selection",
      QuestionType::MultipleSelection => "multiple_selection",
      QuestionType::TrueOrFalse => "true_or_false",
    }
  }
}

impl std::fmt::Display for QuestionType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

const TRUE_LITERAL: &str = "true";
const FALSE_LITERAL: &str = "false";

fn validate_header(id: QuestionId, topic: &str, subject: &str) -> Result<()> {
  if id == 0 {
    return Err(Error::UnprocessableEntity("question id must be non-zero".into()));
  }
  if topic.trim().is_empty() {
    return Err(Error::UnprocessableEntity(format!("question {id}: empty topic")));
  }
  if subject.trim().is_empty() {
    return Err(Error::UnprocessableEntity(format!("question {id}: empty subject")));
  }
  Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleSelectionQuestion {
  id: QuestionId,
  topic: String,
  subject: String,
  variants: Vec<String>,
  correct_answer: String,
}

impl SingleSelectionQuestion {
  pub fn new(
    id: QuestionId,
    topic: impl Into<String>,
    subject: impl Into<String>,
    variants: Vec<String>,
    correct_answer: impl Into<String>,
  ) -> Result<Self> {
    let (topic, subject, correct_answer) = (topic.into(), subject.into(), correct_answer.into());
    validate_header(id, &topic, &subject)?;
    if !variants.contains(&correct_answer) {
      return Err(Error::UnprocessableEntity(format!(
        "question {id}: correct answer is not one of the variants"
      )));
    }
    Ok(Self { id, topic, subject, variants, correct_answer })
  }

  fn is_answer_correct(&self, answer: &UserAnswer) -> bool {
    match answer.selections() {
      [only] => *only == self.correct_answer,
      _ => false,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipleSelectionQuestion {
  id: QuestionId,
  topic: String,
  subject: String,
  variants: Vec<String>,
  correct_answers: Vec<String>,
}

impl MultipleSelectionQuestion {
  pub fn new(
    id: QuestionId,
    topic: impl Into<String>,
    subject: impl Into<String>,
    variants: Vec<String>,
    correct_answers: Vec<String>,
  ) -> Result<Self> {
    let (topic, subject) = (topic.into(), subject.into());
    validate_header(id, &topic, &subject)?;
    if correct_answers.is_empty() {
      return Err(Error::UnprocessableEntity(format!("question {id}: no correct answers")));
    }
    if let Some(stray) = correct_answers.iter().find(|c| !variants.contains(c)) {
      return Err(Error::UnprocessableEntity(format!(
        "question {id}: correct answer {stray:?} is not one of the variants"
      )));
    }
    let unique: HashSet<&String> = correct_answers.iter().collect();
    if unique.len() != correct_answers.len() {
      return Err(Error::UnprocessableEntity(format!("question {id}: duplicate correct answers")));
    }
    Ok(Self { id, topic, subject, variants, correct_answers })
  }

  fn is_answer_correct(&self, answer: &UserAnswer) -> bool {
    let picked = answer.selections();
    if picked.len() != self.correct_answers.len() {
      return false;
    }
    let picked_set: HashSet<&String> = picked.iter().collect();
    // a repeated pick shrinks the set below the expected size
    picked_set.len() == picked.len() && self.correct_answers.iter().all(|c| picked_set.contains(c))
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrueOrFalseQuestion {
  id: QuestionId,
  topic: String,
  subject: String,
  correct_answer: bool,
}

impl TrueOrFalseQuestion {
  pub fn new(
    id: QuestionId,
    topic: impl Into<String>,
    subject: impl Into<String>,
    correct_answer: bool,
  ) -> Result<Self> {
    let (topic, subject) = (topic.into(), subject.into());
    validate_header(id, &topic, &subject)?;
    Ok(Self { id, topic, subject, correct_answer })
  }

  fn is_answer_correct(&self, answer: &UserAnswer) -> bool {
    let [only] = answer.selections() else {
      return false;
    };
    let parsed = match only.to_lowercase().as_str() {
      TRUE_LITERAL => true,
      FALSE_LITERAL => false,
      // neither literal: never matches, whatever the expected value is
      _ => return false,
    };
    parsed == self.correct_answer
  }
}

/// A question offered in a session. The set of variants is closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Question {
  SingleSelection(SingleSelectionQuestion),
  MultipleSelection(MultipleSelectionQuestion),
  TrueOrFalse(TrueOrFalseQuestion),
}

impl Question {
  pub fn id(&self) -> QuestionId {
    match self {
      Question::SingleSelection(q) => q.id,
      Question::MultipleSelection(q) => q.id,
      Question::TrueOrFalse(q) => q.id,
    }
  }

  pub fn question_type(&self) -> QuestionType {
    match self {
      Question::SingleSelection(_) => QuestionType::SingleSelection,
      Question::MultipleSelection(_) => QuestionType::MultipleSelection,
      Question::TrueOrFalse(_) => QuestionType::TrueOrFalse,
    }
  }

  pub fn topic(&self) -> &str {
    match self {
      Question::SingleSelection(q) => &q.topic,
      Question::MultipleSelection(q) => &q.topic,
      Question::TrueOrFalse(q) => &q.topic,
    }
  }

  pub fn subject(&self) -> &str {
    match self {
      Question::SingleSelection(q) => &q.subject,
      Question::MultipleSelection(q) => &q.subject,
      Question::TrueOrFalse(q) => &q.subject,
    }
  }

  /// Presentable options, in the order they were supplied.
  pub fn variants(&self) -> Vec<String> {
    match self {
      Question::SingleSelection(q) => q.variants.clone(),
      Question::MultipleSelection(q) => q.variants.clone(),
      Question::TrueOrFalse(_) => vec![TRUE_LITERAL.to_string(), FALSE_LITERAL.to_string()],
    }
  }

  /// Pure predicate; answers that cannot be interpreted are simply incorrect.
  pub fn is_answer_correct(&self, answer: &UserAnswer) -> bool {
    match self {
      Question::SingleSelection(q) => q.is_answer_correct(answer),
      Question::MultipleSelection(q) => q.is_answer_correct(answer),
      Question::TrueOrFalse(q) => q.is_answer_correct(answer),
    }
  }
}

impl From<SingleSelectionQuestion> for Question {
  fn from(q: SingleSelectionQuestion) -> Self { Question::SingleSelection(q) }
}
impl From<MultipleSelectionQuestion> for Question {
  fn from(q: MultipleSelectionQuestion) -> Self { Question::MultipleSelection(q) }
}
impl From<TrueOrFalseQuestion> for Question {
  fn from(q: TrueOrFalseQuestion) -> Self { Question::TrueOrFalse(q) }
}

/// The user's selection(s) for one question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAnswer {
  question_id: QuestionId,
  selections: Vec<String>,
}

impl UserAnswer {
  pub fn new(question_id: QuestionId, selections: Vec<String>) -> Result<Self> {
    if question_id == 0 {
      return Err(Error::UnprocessableEntity("user answer: invalid question id 0".into()));
    }
    Ok(Self { question_id, selections })
  }

  pub fn question_id(&self) -> QuestionId { self.question_id }

  pub fn selections(&self) -> &[String] { &self.selections }
}

/// Snapshot of the questions offered to a user for a set of topics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
  session_id: String,
  user_id: String,
  topics: Vec<String>,
  questions: Vec<Question>,
  created_at_ms: u64,
}

impl Session {
  pub fn new(
    session_id: impl Into<String>,
    user_id: impl Into<String>,
    topics: Vec<String>,
    questions: Vec<Question>,
  ) -> Result<Self> {
    let (session_id, user_id) = (session_id.into(), user_id.into());
    if session_id.trim().is_empty() {
      return Err(Error::UnprocessableEntity("session: empty session id".into()));
    }
    if user_id.trim().is_empty() {
      return Err(Error::UnprocessableEntity("session: empty user id".into()));
    }
    let created_at_ms = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis() as u64)
      .unwrap_or_default();
    Ok(Self { session_id, user_id, topics, questions, created_at_ms })
  }

  pub fn session_id(&self) -> &str { &self.session_id }
  pub fn user_id(&self) -> &str { &self.user_id }
  pub fn topics(&self) -> &[String] { &self.topics }
  pub fn questions(&self) -> &[Question] { &self.questions }
  pub fn created_at_ms(&self) -> u64 { self.created_at_ms }
}

/// Outcome of grading a session. `grade` is a percentage in `[0, 100]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionResult {
  pub is_success: bool,
  pub grade: f64,
  pub correct: usize,
  pub total: usize,
}
