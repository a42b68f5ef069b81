//! Runtime configuration read from the environment, plus the optional TOML question bank.
//!
//! Important env variables:
//!   PORT                    : u16 (default 8080)
//!   REQUEST_TIMEOUT_SECS    : per-request deadline (default 10)
//!   PASS_THRESHOLD          : grade percentage needed to pass, 0..=100 (default 50)
//!   QUESTIONS_PER_TOPIC     : cap on questions drawn per topic (default: all)
//!   INTROSPECT_URL          : identity service introspection endpoint
//!   INTROSPECT_TIMEOUT_SECS : timeout for a single introspection call (default 5)
//!   STATIC_TOKENS           : comma-separated bearer tokens accepted when INTROSPECT_URL is unset
//!   QUESTION_BANK_PATH      : path to a TOML question bank

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{
  MultipleSelectionQuestion, Question, QuestionId, QuestionType, SingleSelectionQuestion, TrueOrFalseQuestion,
};
use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PASS_THRESHOLD: f64 = 50.0;
pub const DEFAULT_INTROSPECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub request_timeout: Duration,
  pub pass_threshold: f64,
  pub questions_per_topic: Option<usize>,
  pub introspect_url: Option<String>,
  pub introspect_timeout: Duration,
  pub static_tokens: Vec<String>,
  pub question_bank_path: Option<String>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      request_timeout: DEFAULT_REQUEST_TIMEOUT,
      pass_threshold: DEFAULT_PASS_THRESHOLD,
      questions_per_topic: None,
      introspect_url: None,
      introspect_timeout: DEFAULT_INTROSPECT_TIMEOUT,
      static_tokens: Vec::new(),
      question_bank_path: None,
    }
  }
}

impl AppConfig {
  /// Build config from the process environment. Unparseable values fall back to
  /// defaults with a warning; an out-of-range pass threshold is an error.
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let mut cfg = Self::default();

    if let Some(port) = parse_var::<u16>(&lookup, "PORT") {
      cfg.port = port;
    }
    if let Some(secs) = parse_var::<u64>(&lookup, "REQUEST_TIMEOUT_SECS") {
      cfg.request_timeout = Duration::from_secs(secs);
    }
    if let Some(threshold) = parse_var::<f64>(&lookup, "PASS_THRESHOLD") {
      if !(0.0..=100.0).contains(&threshold) {
        return Err(Error::InvalidParam(format!("PASS_THRESHOLD must be within 0..=100, got {threshold}")));
      }
      cfg.pass_threshold = threshold;
    }
    cfg.questions_per_topic = parse_var::<usize>(&lookup, "QUESTIONS_PER_TOPIC").filter(|n| *n > 0);
    cfg.introspect_url = lookup("INTROSPECT_URL").filter(|s| !s.trim().is_empty());
    if let Some(secs) = parse_var::<u64>(&lookup, "INTROSPECT_TIMEOUT_SECS") {
      cfg.introspect_timeout = Duration::from_secs(secs);
    }
    cfg.static_tokens = lookup("STATIC_TOKENS")
      .map(|raw| {
        raw.split(',')
          .map(str::trim)
          .filter(|t| !t.is_empty())
          .map(String::from)
          .collect()
      })
      .unwrap_or_default();
    cfg.question_bank_path = lookup("QUESTION_BANK_PATH").filter(|s| !s.trim().is_empty());

    Ok(cfg)
  }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
  let raw = lookup(key)?;
  match raw.trim().parse::<T>() {
    Ok(v) => Some(v),
    Err(_) => {
      warn!(target: "kvs_quiz", %key, value = %raw, "Ignoring unparseable env value; using default");
      None
    }
  }
}

/// Question bank accepted in TOML form:
///
/// ```toml
/// [[questions]]
/// id = 101
/// kind = "single_selection"
/// topic = "history"
/// subject = "Who was the first emperor of Rome?"
/// variants = ["Augustus", "Nero", "Caligula"]
/// correct = ["Augustus"]
///
/// [[questions]]
/// id = 102
/// kind = "true_or_false"
/// topic = "math"
/// subject = "Zero is an even number."
/// correct_bool = true
/// ```
#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuestionBank {
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub id: QuestionId,
  pub kind: QuestionType,
  pub topic: String,
  pub subject: String,
  // selection kinds
  #[serde(default)] pub variants: Vec<String>,
  #[serde(default)] pub correct: Vec<String>,
  // true_or_false
  #[serde(default)] pub correct_bool: Option<bool>,
}

impl QuestionCfg {
  pub fn into_question(self) -> Result<Question> {
    let id = self.id;
    match self.kind {
      QuestionType::SingleSelection => {
        let [correct] = <[String; 1]>::try_from(self.correct).map_err(|_| {
          Error::UnprocessableEntity(format!("question {id}: single_selection needs exactly one correct answer"))
        })?;
        Ok(SingleSelectionQuestion::new(id, self.topic, self.subject, self.variants, correct)?.into())
      }
      QuestionType::MultipleSelection => {
        Ok(MultipleSelectionQuestion::new(id, self.topic, self.subject, self.variants, self.correct)?.into())
      }
      QuestionType::TrueOrFalse => {
        let correct = self.correct_bool.ok_or_else(|| {
          Error::UnprocessableEntity(format!("question {id}: true_or_false needs correct_bool"))
        })?;
        Ok(TrueOrFalseQuestion::new(id, self.topic, self.subject, correct)?.into())
      }
    }
  }
}

/// Parse a bank from TOML text. Invalid entries are skipped and logged, not fatal.
pub fn parse_question_bank(text: &str) -> Result<Vec<Question>> {
  let bank: QuestionBank =
    toml::from_str(text).map_err(|e| Error::InvalidParam(format!("question bank: {e}")))?;
  let mut out = Vec::with_capacity(bank.questions.len());
  for qc in bank.questions {
    let id = qc.id;
    match qc.into_question() {
      Ok(q) => out.push(q),
      Err(e) => error!(target: "kvs_quiz", %id, error = %e, "Skipping bank question"),
    }
  }
  Ok(out)
}

/// Load the bank at `path`. On IO or parse failure, logs and returns None.
pub fn load_question_bank(path: &str) -> Option<Vec<Question>> {
  match std::fs::read_to_string(path) {
    Ok(s) => match parse_question_bank(&s) {
      Ok(questions) => {
        info!(target: "kvs_quiz", %path, count = questions.len(), "Loaded question bank (TOML)");
        Some(questions)
      }
      Err(e) => {
        error!(target: "kvs_quiz", %path, error = %e, "Failed to parse TOML question bank");
        None
      }
    },
    Err(e) => {
      error!(target: "kvs_quiz", %path, error = %e, "Failed to read TOML question bank");
      None
    }
  }
}
