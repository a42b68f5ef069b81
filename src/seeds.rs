//! Built-in question bank so the service is usable without an external bank file.

use crate::domain::{MultipleSelectionQuestion, Question, SingleSelectionQuestion, TrueOrFalseQuestion};
use crate::error::Result;

fn opts(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// Minimal set of built-in questions across a few topics.
pub fn seed_questions() -> Result<Vec<Question>> {
  Ok(vec![
    SingleSelectionQuestion::new(
      1,
      "math",
      "What is 7 * 8?",
      opts(&["54", "56", "58", "64"]),
      "56",
    )?
    .into(),
    TrueOrFalseQuestion::new(2, "math", "Every prime number is odd.", false)?.into(),
    MultipleSelectionQuestion::new(
      3,
      "math",
      "Which of these numbers are divisible by 3?",
      opts(&["9", "10", "12", "14"]),
      opts(&["9", "12"]),
    )?
    .into(),
    SingleSelectionQuestion::new(
      4,
      "history",
      "In which year did the Western Roman Empire fall?",
      opts(&["410", "476", "1066", "1453"]),
      "476",
    )?
    .into(),
    TrueOrFalseQuestion::new(5, "history", "The Great Wall of China was built in a single dynasty.", false)?.into(),
    SingleSelectionQuestion::new(
      6,
      "geography",
      "What is the largest ocean on Earth?",
      opts(&["Atlantic", "Indian", "Arctic", "Pacific"]),
      "Pacific",
    )?
    .into(),
    TrueOrFalseQuestion::new(7, "geography", "Mount Everest is located in the Himalayas.", true)?.into(),
  ])
}
