//! Error types.
//!
//! `OracleError` carries the technical reason an external call failed and is
//! only ever logged. `TutorError` is what the session sees: one kind per call
//! site, displayed with a fixed user-facing message.

use thiserror::Error;

pub const GENERATION_FAILED: &str =
  "Failed to generate problem. Please check your API key or try again.";
pub const EVALUATION_FAILED: &str = "Failed to evaluate submission.";

/// Why a call to the generative-AI service did not yield a usable record.
#[derive(Debug, Error)]
pub enum OracleError {
  #[error("no API key configured (set API_KEY or GEMINI_API_KEY)")]
  MissingApiKey,

  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },

  #[error("model returned no payload")]
  EmptyPayload,

  #[error("payload does not match schema: {0}")]
  Schema(#[from] serde_json::Error),

  #[error("score {0} outside 0..=100")]
  ScoreOutOfRange(u8),
}

/// User-facing failure kinds, recovered locally by the session.
#[derive(Debug, Error)]
pub enum TutorError {
  #[error("{}", GENERATION_FAILED)]
  ProblemGenerationFailed(#[source] OracleError),

  #[error("{}", EVALUATION_FAILED)]
  EvaluationFailed(#[source] OracleError),
}
