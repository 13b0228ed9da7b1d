//! Application state shared by every connection: the topic catalog and the
//! two external-service seams.
//!
//! Sessions are not stored here; each WebSocket task owns its own.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::{load_config_from_env, GeminiSettings};
use crate::error::OracleError;
use crate::gemini::Gemini;
use crate::oracle::{Evaluator, ProblemSource};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub problems: Arc<dyn ProblemSource>,
    pub evaluator: Arc<dyn Evaluator>,
}

impl AppState {
    pub fn new(catalog: Catalog, problems: Arc<dyn ProblemSource>, evaluator: Arc<dyn Evaluator>) -> Self {
        Self { catalog, problems, evaluator }
    }

    /// Build state from env: load config, pick the catalog, init the Gemini client.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, OracleError> {
        let cfg = load_config_from_env().unwrap_or_default();

        let catalog = if cfg.topics.is_empty() {
            Catalog::default()
        } else {
            Catalog::new(cfg.topics)
        };
        info!(target: "pydata_tutor", topics = catalog.topics().len(), "Topic catalog ready");
        for t in catalog.topics() {
            info!(target: "pydata_tutor", id = %t.id, name = %t.name, "Topic available");
        }

        let gemini = Arc::new(Gemini::new(GeminiSettings::from_env(), cfg.prompts)?);
        if gemini.has_api_key() {
            info!(target: "pydata_tutor", base_url = %gemini.base_url, model = %gemini.model, "Gemini enabled.");
        } else {
            warn!(target: "pydata_tutor", "No API_KEY / GEMINI_API_KEY set; every generation and evaluation will fail.");
        }

        Ok(Self::new(catalog, gemini.clone(), gemini))
    }
}
