//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint, using the prompt
//! library for customizable prompts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categories::Category;
use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::parse_spending_prediction;
use super::types::SpendingPrediction;
use super::AIBackend;

#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    default_model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    pub fn new(base_url: &str, default_model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create from `OLLAMA_HOST` and `OLLAMA_MODEL` (default llama3.2)
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }
}

/// Render the forecast prompt shared by the HTTP backends.
/// Returns (system section, user section).
pub(super) fn render_prediction_prompt(
    prompts: &RwLock<PromptLibrary>,
    history_json: &str,
    horizon: &str,
) -> Result<(Option<String>, String)> {
    let categories = Category::budgetable()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut library = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    let template = library.get(PromptId::PredictSpending)?;

    let mut vars = HashMap::new();
    vars.insert("history", history_json);
    vars.insert("horizon", horizon);
    vars.insert("categories", categories.as_str());

    Ok((
        template.system_section().map(str::to_string),
        template.render_user(&vars),
    ))
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn predict_spending(
        &self,
        history_json: &str,
        horizon: &str,
    ) -> Result<SpendingPrediction> {
        let (system, prompt) = render_prediction_prompt(&self.prompts, history_json, horizon)?;

        let request = OllamaRequest {
            model: self.default_model.clone(),
            prompt,
            system,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let response = response.error_for_status()?;
        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama prediction response: {}", ollama_response.response);

        parse_spending_prediction(&ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
