//! Runtime configuration: environment settings plus an optional TOML file
//! (prompt overrides and a replacement topic catalog).
//!
//! See `TutorConfig` and `Prompts` for the expected TOML schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Topic;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TutorConfig {
  #[serde(default)]
  pub prompts: Prompts,
  /// When non-empty, replaces the built-in catalog.
  #[serde(default)]
  pub topics: Vec<Topic>,
}

/// Prompt templates sent to the model. The response schemas are fixed in code;
/// only the wording is tunable.
///
/// Placeholders: `{difficulty}`, `{topic}` for problems and `{title}`,
/// `{description}`, `{code}` for evaluations.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub problem_system: String,
  pub problem_user_template: String,
  pub evaluation_system: String,
  pub evaluation_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      problem_system: "You are a Senior Data Science Interviewer. Create clear, challenging but solvable problems. IMPORTANT: The startingCode must ONLY contain imports and empty function definitions or data setup. DO NOT provide the implementation or solution logic in the startingCode.".into(),
      problem_user_template: "Create a unique, practical {difficulty} level data science coding problem focused on: {topic}.\nThe problem should test understanding of Python libraries like Pandas, NumPy, or Scikit-Learn.\nProvide a realistic scenario (e.g., cleaning messy data, calculating metrics, simple feature engineering).".into(),
      evaluation_system: "You are a strict but helpful Python Data Science Tutor. Judge the code execution mentally.".into(),
      evaluation_user_template: "Problem Title: {title}\nProblem Description: {description}\n\nUser's Code Solution:\n```python\n{code}\n```\n\nEvaluate the user's code.\n1. Check for logical correctness (does it solve the problem described?).\n2. Check for best practices (e.g., using vectorization in Pandas/NumPy instead of loops).\n3. Check for syntax errors.".into(),
    }
  }
}

/// Connection settings for the generative-AI service.
#[derive(Clone, Debug)]
pub struct GeminiSettings {
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  pub timeout: Duration,
}

impl GeminiSettings {
  /// `API_KEY` wins over `GEMINI_API_KEY`; an empty value counts as absent.
  pub fn from_env() -> Self {
    let api_key = ["API_KEY", "GEMINI_API_KEY"]
      .iter()
      .filter_map(|k| std::env::var(k).ok())
      .find(|v| !v.trim().is_empty());
    let base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let timeout = std::env::var("GEMINI_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Self {
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model,
      timeout: Duration::from_secs(timeout),
    }
  }
}

/// Parse the TOML text of a config file.
pub fn parse_config(s: &str) -> Result<TutorConfig, toml::de::Error> {
  toml::from_str::<TutorConfig>(s)
}

/// Attempt to load `TutorConfig` from TUTOR_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<TutorConfig> {
  let path = std::env::var("TUTOR_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "pydata_tutor", %path, topics = cfg.topics.len(), "Loaded tutor config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "pydata_tutor", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "pydata_tutor", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
