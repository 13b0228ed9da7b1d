//! Seams to the external generative-AI service.
//!
//! The session never talks to these directly; the driver in `logic` runs the
//! commands the session emits through whichever implementation `AppState` holds.

use async_trait::async_trait;

use crate::domain::{Difficulty, EvaluationResult, Problem};
use crate::error::OracleError;

#[async_trait]
pub trait ProblemSource: Send + Sync {
  /// Produce a fresh problem for the topic display name at the given level.
  async fn generate_problem(&self, topic: &str, difficulty: Difficulty) -> Result<Problem, OracleError>;
}

#[async_trait]
pub trait Evaluator: Send + Sync {
  /// Judge `code` as a solution to `problem`.
  async fn evaluate(&self, problem: &Problem, code: &str) -> Result<EvaluationResult, OracleError>;
}

#[cfg(test)]
pub mod scripted {
  //! In-memory oracles returning canned records, for driver and route tests.

  use std::collections::VecDeque;
  use std::sync::Mutex;

  use super::*;

  pub type Call = (String, String);

  /// Pops one prepared reply per call and records what it was asked.
  #[derive(Default)]
  pub struct Scripted {
    pub problems: Mutex<VecDeque<Result<Problem, OracleError>>>,
    pub evaluations: Mutex<VecDeque<Result<EvaluationResult, OracleError>>>,
    pub calls: Mutex<Vec<Call>>,
  }

  impl Scripted {
    pub fn with_problem(self, p: Result<Problem, OracleError>) -> Self {
      self.problems.lock().unwrap().push_back(p);
      self
    }

    pub fn with_evaluation(self, r: Result<EvaluationResult, OracleError>) -> Self {
      self.evaluations.lock().unwrap().push_back(r);
      self
    }

    pub fn calls(&self) -> Vec<Call> {
      self.calls.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl ProblemSource for Scripted {
    async fn generate_problem(&self, topic: &str, difficulty: Difficulty) -> Result<Problem, OracleError> {
      self.calls.lock().unwrap().push(("generate".into(), format!("{topic}|{difficulty}")));
      self.problems.lock().unwrap().pop_front().unwrap_or(Err(OracleError::EmptyPayload))
    }
  }

  #[async_trait]
  impl Evaluator for Scripted {
    async fn evaluate(&self, problem: &Problem, code: &str) -> Result<EvaluationResult, OracleError> {
      self.calls.lock().unwrap().push(("evaluate".into(), format!("{}|{code}", problem.id)));
      self.evaluations.lock().unwrap().pop_front().unwrap_or(Err(OracleError::EmptyPayload))
    }
  }

  pub fn sum_list() -> Problem {
    Problem {
      id: "p1".into(),
      title: "Sum List".into(),
      description: "Return the sum of `xs`.".into(),
      difficulty: Difficulty::Easy,
      starting_code: "def solve(xs): pass".into(),
      hints: vec!["use sum()".into()],
    }
  }

  pub fn good_result() -> EvaluationResult {
    EvaluationResult {
      is_correct: true,
      score: 95,
      feedback: "Good".into(),
      optimized_code: "def solve(xs): return sum(xs)".into(),
      reasoning: "Correct and concise".into(),
    }
  }
}
