//! Minimal Gemini client for our use-cases.
//!
//! We only call `models/{model}:generateContent` and always request a JSON
//! object constrained by a response schema. Calls are instrumented and log the
//! model name, latency and token usage (not contents).
//!
//! NOTE: the API key travels in the `x-goog-api-key` header and is never logged.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::config::{GeminiSettings, Prompts};
use crate::domain::{Difficulty, EvaluationResult, Problem};
use crate::error::OracleError;
use crate::oracle::{Evaluator, ProblemSource};
use crate::util::{fill_template, trunc_for_log};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  pub prompts: Prompts,
}

impl Gemini {
  pub fn new(settings: GeminiSettings, prompts: Prompts) -> Result<Self, OracleError> {
    let client = reqwest::Client::builder().timeout(settings.timeout).build()?;
    Ok(Self {
      client,
      api_key: settings.api_key,
      base_url: settings.base_url,
      model: settings.model,
      prompts,
    })
  }

  pub fn has_api_key(&self) -> bool {
    self.api_key.is_some()
  }

  /// Structured generation: system instruction + one user turn, JSON reply
  /// constrained by `schema`, parsed into `T`.
  #[instrument(level = "info", skip(self, system, user, schema), fields(model = %self.model))]
  async fn generate_json<T: DeserializeOwned>(
    &self,
    system: &str,
    user: &str,
    schema: Value,
  ) -> Result<T, OracleError> {
    let api_key = self.api_key.as_deref().ok_or(OracleError::MissingApiKey)?;
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let req = GenerateContentRequest {
      contents: vec![Content { role: Some("user".into()), parts: vec![Part { text: user.into() }] }],
      system_instruction: Content { role: None, parts: vec![Part { text: system.into() }] },
      generation_config: GenerationConfig {
        response_mime_type: "application/json".into(),
        response_schema: schema,
      },
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "pydata-tutor/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, api_key)
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      error!(elapsed = ?start.elapsed(), %status, "Gemini call rejected");
      return Err(OracleError::Status { status: status.as_u16(), message });
    }

    let body: GenerateContentResponse = res.json().await?;
    if let Some(usage) = &body.usage_metadata {
      info!(
        elapsed = ?start.elapsed(),
        prompt_tokens = ?usage.prompt_token_count,
        candidates_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }
    let text = body.text().ok_or(OracleError::EmptyPayload)?;
    Ok(serde_json::from_str::<T>(&text)?)
  }
}

#[async_trait]
impl ProblemSource for Gemini {
  #[instrument(level = "info", skip(self), fields(model = %self.model))]
  async fn generate_problem(&self, topic: &str, difficulty: Difficulty) -> Result<Problem, OracleError> {
    let user = fill_template(
      &self.prompts.problem_user_template,
      &[("difficulty", difficulty.as_str()), ("topic", topic)],
    );
    let problem: Problem = self.generate_json(&self.prompts.problem_system, &user, problem_schema()).await?;
    info!(
      problem_id = %problem.id,
      title = %trunc_for_log(&problem.title, 60),
      hints = problem.hints.len(),
      "Problem generated"
    );
    Ok(problem)
  }
}

#[async_trait]
impl Evaluator for Gemini {
  #[instrument(level = "info", skip(self, problem, code), fields(problem_id = %problem.id, code_len = code.len()))]
  async fn evaluate(&self, problem: &Problem, code: &str) -> Result<EvaluationResult, OracleError> {
    let user = fill_template(
      &self.prompts.evaluation_user_template,
      &[("title", &problem.title), ("description", &problem.description), ("code", code)],
    );
    let result: EvaluationResult =
      self.generate_json(&self.prompts.evaluation_system, &user, evaluation_schema()).await?;
    let result = check_score(result)?;
    info!(is_correct = result.is_correct, score = result.score, "Submission evaluated");
    Ok(result)
  }
}

fn check_score(r: EvaluationResult) -> Result<EvaluationResult, OracleError> {
  if r.score > EvaluationResult::MAX_SCORE {
    return Err(OracleError::ScoreOutOfRange(r.score));
  }
  Ok(r)
}

// --- Response schemas (OpenAPI subset understood by Gemini) ---

pub fn problem_schema() -> Value {
  json!({
    "type": "OBJECT",
    "properties": {
      "id": { "type": "STRING" },
      "title": { "type": "STRING" },
      "description": {
        "type": "STRING",
        "description": "Markdown supported description of the problem, including sample input data description. Use markdown code blocks for data examples."
      },
      "difficulty": { "type": "STRING", "enum": ["Easy", "Medium", "Hard"] },
      "startingCode": {
        "type": "STRING",
        "description": "Initial python code boilerplate only. Import necessary libraries and define variables or empty functions. DO NOT IMPLEMENT THE SOLUTION."
      },
      "hints": { "type": "ARRAY", "items": { "type": "STRING" } }
    },
    "required": ["id", "title", "description", "difficulty", "startingCode", "hints"]
  })
}

pub fn evaluation_schema() -> Value {
  json!({
    "type": "OBJECT",
    "properties": {
      "isCorrect": { "type": "BOOLEAN" },
      "score": { "type": "INTEGER", "description": "Score from 0 to 100" },
      "feedback": { "type": "STRING", "description": "Constructive feedback on what is right/wrong." },
      "optimizedCode": { "type": "STRING", "description": "A better or more pythonic version of the solution." },
      "reasoning": { "type": "STRING", "description": "Brief explanation of the score." }
    },
    "required": ["isCorrect", "score", "feedback", "optimizedCode", "reasoning"]
  })
}

// --- generateContent DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  contents: Vec<Content>,
  system_instruction: Content,
  generation_config: GenerationConfig,
}
#[derive(Serialize)]
struct Content {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  parts: Vec<Part>,
}
#[derive(Serialize)]
struct Part { text: String }
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  response_mime_type: String,
  response_schema: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate { #[serde(default)] content: Option<CandidateContent> }
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<CandidatePart> }
#[derive(Deserialize)]
struct CandidatePart { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

impl GenerateContentResponse {
  /// Concatenated text parts of the first candidate; `None` when blank.
  fn text(&self) -> Option<String> {
    let content = self.candidates.first()?.content.as_ref()?;
    let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
    if text.trim().is_empty() { None } else { Some(text) }
  }
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  fn response(raw: &str) -> GenerateContentResponse {
    serde_json::from_str(raw).unwrap()
  }

  #[test]
  fn request_body_uses_gemini_field_names() {
    let req = GenerateContentRequest {
      contents: vec![Content { role: Some("user".into()), parts: vec![Part { text: "hi".into() }] }],
      system_instruction: Content { role: None, parts: vec![Part { text: "sys".into() }] },
      generation_config: GenerationConfig {
        response_mime_type: "application/json".into(),
        response_schema: problem_schema(),
      },
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["contents"][0]["role"], "user");
    assert_eq!(v["systemInstruction"]["parts"][0]["text"], "sys");
    assert!(v["systemInstruction"].get("role").is_none());
    assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(v["generationConfig"]["responseSchema"]["required"].as_array().map(|a| a.len()), Some(6));
  }

  #[test]
  fn text_joins_parts_of_first_candidate() {
    let r = response(r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#);
    assert_eq!(r.text().as_deref(), Some(r#"{"a":1}"#));
  }

  #[test]
  fn missing_or_blank_payload_is_none() {
    assert!(response(r#"{}"#).text().is_none());
    assert!(response(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).text().is_none());
    assert!(response(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#).text().is_none());
  }

  #[test]
  fn evaluation_schema_lists_all_fields_as_required() {
    let s = evaluation_schema();
    let req: Vec<&str> = s["required"].as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
    assert_eq!(req, vec!["isCorrect", "score", "feedback", "optimizedCode", "reasoning"]);
    assert_eq!(s["properties"]["score"]["type"], "INTEGER");
  }

  #[test]
  fn score_above_hundred_is_rejected() {
    let r = EvaluationResult {
      is_correct: false,
      score: 101,
      feedback: String::new(),
      optimized_code: String::new(),
      reasoning: String::new(),
    };
    assert!(matches!(check_score(r), Err(OracleError::ScoreOutOfRange(101))));
  }

  #[test]
  fn extracts_error_message() {
    let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
    assert_eq!(extract_gemini_error(body).as_deref(), Some("API key not valid."));
    assert!(extract_gemini_error("<html>").is_none());
  }

  #[tokio::test]
  async fn missing_key_fails_without_network() {
    let settings = GeminiSettings {
      api_key: None,
      base_url: "http://127.0.0.1:9".into(),
      model: "m".into(),
      timeout: Duration::from_secs(1),
    };
    let g = Gemini::new(settings, Prompts::default()).unwrap();
    assert!(!g.has_api_key());
    let err = g.generate_problem("Python Basics", Difficulty::Easy).await.unwrap_err();
    assert!(matches!(err, OracleError::MissingApiKey));
  }
}
