//! Domain models: topics, difficulty, generated problems and evaluation results.
//!
//! Field names on the wire are camelCase because the same records are the
//! JSON schemas requested from the model and pushed to the browser.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Selectable subject area. Built once at startup, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
  pub id: String,
  pub name: String,
  pub icon: String,
  pub description: String,
}

/// Closed three-value difficulty set.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One generated coding challenge. Replaced wholesale when a new one arrives.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
  pub id: String,
  pub title: String,
  /// Markdown.
  pub description: String,
  pub difficulty: Difficulty,
  /// Imports, data setup and empty stubs only.
  pub starting_code: String,
  pub hints: Vec<String>,
}

/// Judged outcome of one submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
  pub is_correct: bool,
  /// 0..=100, checked by the evaluator client before a result is accepted.
  pub score: u8,
  pub feedback: String,
  pub optimized_code: String,
  pub reasoning: String,
}

impl EvaluationResult {
  pub const MAX_SCORE: u8 = 100;
}
